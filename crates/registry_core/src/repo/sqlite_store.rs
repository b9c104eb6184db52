//! SQLite-backed registry store.
//!
//! # Responsibility
//! - Persist programmes and students in the `programmes` / `students` tables.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - Connections must be migrated and enforce foreign keys; `try_new`
//!   rejects anything else.
//! - Read-then-write operations run inside one immediate transaction.
//! - Cascade delete is performed by `ON DELETE CASCADE` inside the same
//!   transaction that counts the removed students.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::ids::{ProgrammeId, StudentKey};
use crate::model::programme::Programme;
use crate::model::student::Student;
use crate::repo::registry_store::{
    CascadeSummary, RegistryStore, StoreError, StoreResult, StudentChanges,
};
use rusqlite::{
    ffi, params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const PROGRAMME_SELECT_SQL: &str = "SELECT id, name FROM programmes";
const STUDENT_SELECT_SQL: &str = "SELECT id, student_id, name, programme_id FROM students";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("programmes", &["id", "name"]),
    ("students", &["id", "student_id", "name", "programme_id"]),
];

/// SQLite-backed registry store over a borrowed, migrated connection.
pub struct SqliteRegistryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegistryStore<'conn> {
    /// Creates a store from a connection opened by `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_registry_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn immediate(&self) -> StoreResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl RegistryStore for SqliteRegistryStore<'_> {
    fn create_programme(&self, name: &str) -> StoreResult<Programme> {
        Programme::validate_name(name)?;

        self.conn
            .execute("INSERT INTO programmes (name) VALUES (?1);", [name])?;
        let id = row_programme_id(self.conn.last_insert_rowid())?;
        Ok(Programme::new(id, name)?)
    }

    fn rename_programme(&self, id: ProgrammeId, name: &str) -> StoreResult<Programme> {
        Programme::validate_name(name)?;

        let changed = self.conn.execute(
            "UPDATE programmes SET name = ?2 WHERE id = ?1;",
            params![id.get(), name],
        )?;
        if changed == 0 {
            return Err(StoreError::ProgrammeNotFound(id));
        }
        Ok(Programme::new(id, name)?)
    }

    fn get_programme(&self, id: ProgrammeId) -> StoreResult<Programme> {
        load_programme(self.conn, id)?.ok_or(StoreError::ProgrammeNotFound(id))
    }

    fn list_programmes(&self) -> StoreResult<Vec<Programme>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROGRAMME_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut programmes = Vec::new();
        while let Some(row) = rows.next()? {
            programmes.push(parse_programme_row(row)?);
        }
        Ok(programmes)
    }

    fn find_programmes_by_name(&self, name: &str) -> StoreResult<Vec<Programme>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROGRAMME_SELECT_SQL} WHERE name = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([name])?;
        let mut programmes = Vec::new();
        while let Some(row) = rows.next()? {
            programmes.push(parse_programme_row(row)?);
        }
        Ok(programmes)
    }

    fn delete_programme(&self, id: ProgrammeId) -> StoreResult<CascadeSummary> {
        let tx = self.immediate()?;
        let programme = load_programme(&tx, id)?.ok_or(StoreError::ProgrammeNotFound(id))?;
        let students_removed = count_enrolled(&tx, id)?;

        tx.execute("DELETE FROM programmes WHERE id = ?1;", [id.get()])?;
        let orphans = count_enrolled(&tx, id)?;
        if orphans != 0 {
            return Err(StoreError::ForeignKeysDisabled);
        }

        tx.commit()?;
        Ok(CascadeSummary {
            programme,
            students_removed,
        })
    }

    fn count_students(&self, programme_id: ProgrammeId) -> StoreResult<u64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        ensure_programme_exists(&tx, programme_id)?;
        let count = count_enrolled(&tx, programme_id)?;
        tx.commit()?;
        Ok(count)
    }

    fn create_student(
        &self,
        student_id: &str,
        name: &str,
        programme_id: ProgrammeId,
    ) -> StoreResult<Student> {
        Student::validate_student_id(student_id)?;
        Student::validate_name(name)?;

        let tx = self.immediate()?;
        ensure_programme_exists(&tx, programme_id)?;
        let taken: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM students WHERE student_id = ?1);",
            [student_id],
            |row| row.get(0),
        )?;
        if taken == 1 {
            return Err(StoreError::DuplicateStudentId(student_id.to_string()));
        }

        tx.execute(
            "INSERT INTO students (student_id, name, programme_id) VALUES (?1, ?2, ?3);",
            params![student_id, name, programme_id.get()],
        )
        .map_err(|err| map_constraint_error(err, student_id, programme_id))?;
        let key = row_student_key(tx.last_insert_rowid())?;
        tx.commit()?;

        Ok(Student::new(key, student_id, name, programme_id)?)
    }

    fn update_student(&self, id: StudentKey, changes: &StudentChanges) -> StoreResult<Student> {
        if let Some(name) = changes.name.as_deref() {
            Student::validate_name(name)?;
        }

        let tx = self.immediate()?;
        let mut student = load_student(&tx, id)?.ok_or(StoreError::StudentNotFound(id))?;
        if let Some(target) = changes.programme_id {
            ensure_programme_exists(&tx, target)?;
            student.programme_id = target;
        }
        if let Some(name) = changes.name.as_deref() {
            student.name = name.to_string();
        }

        if !changes.is_empty() {
            tx.execute(
                "UPDATE students SET name = ?2, programme_id = ?3 WHERE id = ?1;",
                params![id.get(), student.name.as_str(), student.programme_id.get()],
            )
            .map_err(|err| map_constraint_error(err, &student.student_id, student.programme_id))?;
        }
        tx.commit()?;
        Ok(student)
    }

    fn get_student(&self, id: StudentKey) -> StoreResult<Student> {
        load_student(self.conn, id)?.ok_or(StoreError::StudentNotFound(id))
    }

    fn find_student_by_student_id(&self, student_id: &str) -> StoreResult<Student> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STUDENT_SELECT_SQL} WHERE student_id = ?1;"))?;
        let mut rows = stmt.query([student_id])?;
        if let Some(row) = rows.next()? {
            return parse_student_row(row);
        }
        Err(StoreError::StudentIdNotFound(student_id.to_string()))
    }

    fn delete_student(&self, id: StudentKey) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE id = ?1;", [id.get()])?;
        if changed == 0 {
            return Err(StoreError::StudentNotFound(id));
        }
        Ok(())
    }

    fn student_page(
        &self,
        programme_id: ProgrammeId,
        after: Option<StudentKey>,
        limit: usize,
    ) -> StoreResult<Vec<Student>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        ensure_programme_exists(&tx, programme_id)?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let students = {
            let mut stmt = tx.prepare(&format!(
                "{STUDENT_SELECT_SQL}
                 WHERE programme_id = ?1
                   AND id > ?2
                 ORDER BY id ASC
                 LIMIT ?3;"
            ))?;
            let mut rows = stmt.query(params![
                programme_id.get(),
                after.map_or(0, StudentKey::get),
                limit
            ])?;
            let mut students = Vec::new();
            while let Some(row) = rows.next()? {
                students.push(parse_student_row(row)?);
            }
            students
        };
        tx.commit()?;
        Ok(students)
    }
}

fn load_programme(conn: &Connection, id: ProgrammeId) -> StoreResult<Option<Programme>> {
    let mut stmt = conn.prepare(&format!("{PROGRAMME_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.get()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_programme_row(row)?));
    }
    Ok(None)
}

fn load_student(conn: &Connection, id: StudentKey) -> StoreResult<Option<Student>> {
    let mut stmt = conn.prepare(&format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.get()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_student_row(row)?));
    }
    Ok(None)
}

fn ensure_programme_exists(conn: &Connection, id: ProgrammeId) -> StoreResult<()> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM programmes WHERE id = ?1;", [id.get()], |row| {
            row.get(0)
        })
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::ProgrammeNotFound(id)),
    }
}

fn count_enrolled(conn: &Connection, programme_id: ProgrammeId) -> StoreResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE programme_id = ?1;",
        [programme_id.get()],
        |row| row.get(0),
    )?;
    u64::try_from(count)
        .map_err(|_| StoreError::InvalidData(format!("negative student count `{count}`")))
}

/// Maps constraint failures that slipped past the explicit checks.
fn map_constraint_error(
    err: rusqlite::Error,
    student_id: &str,
    programme_id: ProgrammeId,
) -> StoreError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    return StoreError::DuplicateStudentId(student_id.to_string());
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StoreError::ProgrammeNotFound(programme_id);
                }
                _ => {}
            }
        }
    }
    err.into()
}

fn parse_programme_row(row: &Row<'_>) -> StoreResult<Programme> {
    let id = row_programme_id(row.get("id")?)?;
    let name: String = row.get("name")?;
    Programme::new(id, name).map_err(|err| {
        StoreError::InvalidData(format!("programme {id} failed validation: {err}"))
    })
}

fn parse_student_row(row: &Row<'_>) -> StoreResult<Student> {
    let id = row_student_key(row.get("id")?)?;
    let programme_id = row_programme_id(row.get("programme_id")?)?;
    let student_id: String = row.get("student_id")?;
    let name: String = row.get("name")?;
    Student::new(id, student_id, name, programme_id)
        .map_err(|err| StoreError::InvalidData(format!("student {id} failed validation: {err}")))
}

fn row_programme_id(value: i64) -> StoreResult<ProgrammeId> {
    ProgrammeId::new(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid programme id `{value}`")))
}

fn row_student_key(value: i64) -> StoreResult<StudentKey> {
    StudentKey::new(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid student id `{value}`")))
}

fn ensure_registry_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(StoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(StoreError::ForeignKeysDisabled);
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
