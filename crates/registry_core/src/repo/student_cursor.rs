//! Lazy paging cursor over one programme's students.
//!
//! # Invariants
//! - Students are yielded in ascending `StudentKey` order.
//! - Iteration is finite: the cursor ends after a short page or an error.
//! - `restart()` rewinds to the first student; clones advance independently.

use crate::model::ids::{ProgrammeId, StudentKey};
use crate::model::student::Student;
use crate::repo::registry_store::{RegistryStore, StoreResult};
use std::collections::VecDeque;
use std::iter::FusedIterator;

/// Default number of students fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 64;

/// Cursor returned by `RegistryStore::list_students_by_programme`.
///
/// Each page is read under the store's own consistency guarantees, so a
/// programme deleted mid-iteration yields one `ProgrammeNotFound` error and
/// then ends.
pub struct StudentsByProgramme<'s, S: RegistryStore + ?Sized> {
    store: &'s S,
    programme_id: ProgrammeId,
    page_size: usize,
    buffer: VecDeque<Student>,
    last_key: Option<StudentKey>,
    exhausted: bool,
}

impl<'s, S: RegistryStore + ?Sized> StudentsByProgramme<'s, S> {
    pub(crate) fn new(store: &'s S, programme_id: ProgrammeId) -> Self {
        Self {
            store,
            programme_id,
            page_size: DEFAULT_PAGE_SIZE,
            buffer: VecDeque::new(),
            last_key: None,
            exhausted: false,
        }
    }

    /// Overrides page size; values below 1 are raised to 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn programme_id(&self) -> ProgrammeId {
        self.programme_id
    }

    /// Rewinds the cursor so the next item is the programme's first student.
    pub fn restart(&mut self) {
        self.buffer.clear();
        self.last_key = None;
        self.exhausted = false;
    }

    fn fetch_page(&mut self) -> StoreResult<()> {
        let page = self
            .store
            .student_page(self.programme_id, self.last_key, self.page_size)?;
        if page.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.last_key = Some(last.id);
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl<S: RegistryStore + ?Sized> Clone for StudentsByProgramme<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            programme_id: self.programme_id,
            page_size: self.page_size,
            buffer: self.buffer.clone(),
            last_key: self.last_key,
            exhausted: self.exhausted,
        }
    }
}

impl<S: RegistryStore + ?Sized> Iterator for StudentsByProgramme<'_, S> {
    type Item = StoreResult<Student>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(student) = self.buffer.pop_front() {
            return Some(Ok(student));
        }
        if self.exhausted {
            return None;
        }

        if let Err(err) = self.fetch_page() {
            self.exhausted = true;
            return Some(Err(err));
        }
        self.buffer.pop_front().map(Ok)
    }
}

impl<S: RegistryStore + ?Sized> FusedIterator for StudentsByProgramme<'_, S> {}
