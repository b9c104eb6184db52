//! In-memory registry store.
//!
//! # Responsibility
//! - Keep programmes and students in ordered arenas keyed by id.
//! - Maintain `student_id` and per-programme roster indexes.
//!
//! # Invariants
//! - Every mutation holds the whole-store write lock for its full
//!   duration, cascade included; readers hold the read lock.
//! - Ids come from monotonic counters and are never reused.
//! - `by_student_id` and `rosters` always mirror `students`.

use crate::model::ids::{ProgrammeId, StudentKey};
use crate::model::programme::Programme;
use crate::model::student::Student;
use crate::repo::registry_store::{
    CascadeSummary, RegistryStore, StoreError, StoreResult, StudentChanges,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct RegistryState {
    programmes: BTreeMap<ProgrammeId, Programme>,
    students: BTreeMap<StudentKey, Student>,
    by_student_id: HashMap<String, StudentKey>,
    rosters: HashMap<ProgrammeId, BTreeSet<StudentKey>>,
    next_programme_id: ProgrammeId,
    next_student_key: StudentKey,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            programmes: BTreeMap::new(),
            students: BTreeMap::new(),
            by_student_id: HashMap::new(),
            rosters: HashMap::new(),
            next_programme_id: ProgrammeId::first(),
            next_student_key: StudentKey::first(),
        }
    }

    fn programme(&self, id: ProgrammeId) -> StoreResult<&Programme> {
        self.programmes
            .get(&id)
            .ok_or(StoreError::ProgrammeNotFound(id))
    }

    fn student(&self, id: StudentKey) -> StoreResult<&Student> {
        self.students.get(&id).ok_or(StoreError::StudentNotFound(id))
    }

    fn roster(&self, programme_id: ProgrammeId) -> impl Iterator<Item = StudentKey> + '_ {
        self.roster_after(programme_id, None)
    }

    /// Roster keys strictly greater than `after`, seeking instead of scanning.
    fn roster_after(
        &self,
        programme_id: ProgrammeId,
        after: Option<StudentKey>,
    ) -> impl Iterator<Item = StudentKey> + '_ {
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);
        self.rosters
            .get(&programme_id)
            .into_iter()
            .flat_map(move |keys| keys.range((lower, Bound::Unbounded)).copied())
    }
}

/// Thread-safe in-memory registry store.
pub struct InMemoryRegistryStore {
    state: RwLock<RegistryState>,
}

impl Default for InMemoryRegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistryStore {
    /// Creates an empty store whose first ids are `1`.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, RegistryState>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl RegistryStore for InMemoryRegistryStore {
    fn create_programme(&self, name: &str) -> StoreResult<Programme> {
        Programme::validate_name(name)?;

        let mut state = self.write()?;
        let id = state.next_programme_id;
        let programme = Programme::new(id, name)?;
        state.next_programme_id = id.next();
        state.programmes.insert(id, programme.clone());
        Ok(programme)
    }

    fn rename_programme(&self, id: ProgrammeId, name: &str) -> StoreResult<Programme> {
        Programme::validate_name(name)?;

        let mut state = self.write()?;
        let programme = state
            .programmes
            .get_mut(&id)
            .ok_or(StoreError::ProgrammeNotFound(id))?;
        programme.name = name.to_string();
        Ok(programme.clone())
    }

    fn get_programme(&self, id: ProgrammeId) -> StoreResult<Programme> {
        self.read()?.programme(id).cloned()
    }

    fn list_programmes(&self) -> StoreResult<Vec<Programme>> {
        Ok(self.read()?.programmes.values().cloned().collect())
    }

    fn find_programmes_by_name(&self, name: &str) -> StoreResult<Vec<Programme>> {
        Ok(self
            .read()?
            .programmes
            .values()
            .filter(|programme| programme.name == name)
            .cloned()
            .collect())
    }

    fn delete_programme(&self, id: ProgrammeId) -> StoreResult<CascadeSummary> {
        let mut state = self.write()?;
        let programme = state
            .programmes
            .remove(&id)
            .ok_or(StoreError::ProgrammeNotFound(id))?;

        let roster = state.rosters.remove(&id).unwrap_or_default();
        for key in &roster {
            if let Some(student) = state.students.remove(key) {
                state.by_student_id.remove(&student.student_id);
            }
        }

        Ok(CascadeSummary {
            programme,
            students_removed: roster.len() as u64,
        })
    }

    fn count_students(&self, programme_id: ProgrammeId) -> StoreResult<u64> {
        let state = self.read()?;
        state.programme(programme_id)?;
        Ok(state.roster(programme_id).count() as u64)
    }

    fn create_student(
        &self,
        student_id: &str,
        name: &str,
        programme_id: ProgrammeId,
    ) -> StoreResult<Student> {
        Student::validate_student_id(student_id)?;
        Student::validate_name(name)?;

        let mut state = self.write()?;
        state.programme(programme_id)?;
        if state.by_student_id.contains_key(student_id) {
            return Err(StoreError::DuplicateStudentId(student_id.to_string()));
        }

        let key = state.next_student_key;
        let student = Student::new(key, student_id, name, programme_id)?;
        state.next_student_key = key.next();
        state.by_student_id.insert(student.student_id.clone(), key);
        state.rosters.entry(programme_id).or_default().insert(key);
        state.students.insert(key, student.clone());
        Ok(student)
    }

    fn update_student(&self, id: StudentKey, changes: &StudentChanges) -> StoreResult<Student> {
        if let Some(name) = changes.name.as_deref() {
            Student::validate_name(name)?;
        }

        let mut state = self.write()?;
        let previous_programme = state.student(id)?.programme_id;
        if let Some(target) = changes.programme_id {
            state.programme(target)?;
            if target != previous_programme {
                if let Some(roster) = state.rosters.get_mut(&previous_programme) {
                    roster.remove(&id);
                }
                state.rosters.entry(target).or_default().insert(id);
            }
        }

        let student = state
            .students
            .get_mut(&id)
            .ok_or(StoreError::StudentNotFound(id))?;
        if let Some(name) = changes.name.as_deref() {
            student.name = name.to_string();
        }
        if let Some(target) = changes.programme_id {
            student.programme_id = target;
        }
        Ok(student.clone())
    }

    fn get_student(&self, id: StudentKey) -> StoreResult<Student> {
        self.read()?.student(id).cloned()
    }

    fn find_student_by_student_id(&self, student_id: &str) -> StoreResult<Student> {
        let state = self.read()?;
        let key = state
            .by_student_id
            .get(student_id)
            .copied()
            .ok_or_else(|| StoreError::StudentIdNotFound(student_id.to_string()))?;
        state.student(key).cloned()
    }

    fn delete_student(&self, id: StudentKey) -> StoreResult<()> {
        let mut state = self.write()?;
        let student = state
            .students
            .remove(&id)
            .ok_or(StoreError::StudentNotFound(id))?;
        state.by_student_id.remove(&student.student_id);
        if let Some(roster) = state.rosters.get_mut(&student.programme_id) {
            roster.remove(&id);
        }
        Ok(())
    }

    fn student_page(
        &self,
        programme_id: ProgrammeId,
        after: Option<StudentKey>,
        limit: usize,
    ) -> StoreResult<Vec<Student>> {
        let state = self.read()?;
        state.programme(programme_id)?;
        Ok(state
            .roster_after(programme_id, after)
            .take(limit)
            .filter_map(|key| state.students.get(&key).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryRegistryStore;
    use crate::repo::registry_store::{ErrorKind, RegistryStore};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_creates_issue_distinct_ids() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let programme = store.create_programme("Physics").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..25)
                        .map(|index| {
                            store
                                .create_student(
                                    &format!("W{worker}-{index}"),
                                    "Worker",
                                    programme.id,
                                )
                                .unwrap()
                                .id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<_> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(store.count_students(programme.id).unwrap(), 200);
    }

    #[test]
    fn cascade_releases_student_ids_and_rosters() {
        let store = InMemoryRegistryStore::new();
        let old = store.create_programme("Chemistry").unwrap();
        store.create_student("C001", "Marie", old.id).unwrap();
        store.delete_programme(old.id).unwrap();

        let new = store.create_programme("Chemistry").unwrap();
        assert_ne!(new.id, old.id);
        let student = store.create_student("C001", "Marie", new.id).unwrap();
        assert_eq!(store.count_students(new.id).unwrap(), 1);
        assert_eq!(
            store.find_student_by_student_id("C001").unwrap().id,
            student.id
        );
    }

    #[test]
    fn readers_never_see_students_of_a_deleted_programme() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut deleted = Vec::new();
                for round in 0..200 {
                    let programme = store.create_programme("Transient").unwrap();
                    for seat in 0..3 {
                        store
                            .create_student(&format!("T{round}-{seat}"), "Temp", programme.id)
                            .unwrap();
                    }
                    let summary = store.delete_programme(programme.id).unwrap();
                    assert_eq!(summary.students_removed, 3);
                    deleted.push(programme.id);
                }
                done.store(true, Ordering::SeqCst);
                deleted
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::SeqCst) {
                        {
                            let state = store.read().unwrap();
                            for student in state.students.values() {
                                assert!(state.programmes.contains_key(&student.programme_id));
                                assert!(state.rosters[&student.programme_id].contains(&student.id));
                            }
                            for (programme_id, roster) in &state.rosters {
                                if !roster.is_empty() {
                                    assert!(state.programmes.contains_key(programme_id));
                                }
                            }
                        }

                        for programme in store.list_programmes().unwrap() {
                            match store.student_page(programme.id, None, 64) {
                                Ok(page) => assert!(page
                                    .iter()
                                    .all(|student| student.programme_id == programme.id)),
                                Err(err) => assert_eq!(err.kind(), ErrorKind::NotFound),
                            }
                        }
                    }
                })
            })
            .collect();

        let deleted = writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        for id in deleted {
            assert_eq!(store.count_students(id).unwrap_err().kind(), ErrorKind::NotFound);
        }
        assert!(store.read().unwrap().students.is_empty());
    }

    #[test]
    fn student_page_resumes_after_the_given_key() {
        let store = InMemoryRegistryStore::new();
        let programme = store.create_programme("Paging").unwrap();
        let keys: Vec<_> = (0..10)
            .map(|index| {
                store
                    .create_student(&format!("P{index}"), "Pager", programme.id)
                    .unwrap()
                    .id
            })
            .collect();

        let page = store.student_page(programme.id, Some(keys[6]), 64).unwrap();
        let ids: Vec<_> = page.iter().map(|student| student.id).collect();
        assert_eq!(ids, keys[7..].to_vec());
        assert!(store
            .student_page(programme.id, Some(keys[9]), 64)
            .unwrap()
            .is_empty());
    }
}
