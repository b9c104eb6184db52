use serde_json::Value;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_registry<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_registry");
    Command::new(bin)
        .args(args)
        .env_remove("REGISTRY_DB")
        .env_remove("REGISTRY_LOG_DIR")
        .env_remove("REGISTRY_LOG_LEVEL")
        .output()
        .expect("registry command should execute")
}

fn run_with_db(db: &Path, args: &[&str]) -> Output {
    let mut full: Vec<&OsStr> = vec![OsStr::new("--db"), db.as_os_str()];
    full.extend(args.iter().map(OsStr::new));
    run_registry(full)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            stdout(output),
            stderr(output),
        );
    }
}

fn assert_failure(output: &Output, exit_code: i32, error_code: &str) {
    assert_eq!(
        output.status.code(),
        Some(exit_code),
        "stdout:\n{}\nstderr:\n{}",
        stdout(output),
        stderr(output)
    );
    let prefix = format!("error[{error_code}]: ");
    assert!(
        stderr(output).starts_with(&prefix),
        "stderr should start with `{prefix}`, got:\n{}",
        stderr(output)
    );
}

#[test]
fn version_reports_core_version() {
    let output = run_registry(["version"]);
    assert_success(&output);
    assert!(stdout(&output).starts_with("registry_core version="));
}

#[test]
fn demo_walks_create_enrol_and_cascade() {
    let output = run_registry(["--memory", "demo"]);
    assert_success(&output);

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "programme 1\tComputer Science",
            "student 1\tBob (S001)\tprogramme=1",
            "deleted programme 1\tComputer Science\tstudents_removed=1",
            "student 1 removed by cascade",
        ]
    );
}

#[test]
fn sqlite_store_persists_between_invocations_and_maps_exit_codes() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("registry.sqlite3");

    let added = run_with_db(&db, &["--json", "programme", "add", "  Computer   Science "]);
    assert_success(&added);
    let programme: Value = serde_json::from_slice(&added.stdout).unwrap();
    assert_eq!(programme["id"], 1);
    assert_eq!(programme["name"], "Computer Science");

    assert_success(&run_with_db(&db, &["student", "add", "S001", "Bob", "1"]));

    let duplicate = run_with_db(&db, &["student", "add", "S001", "Carol", "1"]);
    assert_failure(&duplicate, 4, "conflict");

    let missing_programme = run_with_db(&db, &["student", "add", "S002", "Dana", "999"]);
    assert_failure(&missing_programme, 3, "not_found");

    let malformed_id = run_with_db(&db, &["student", "show", "abc"]);
    assert_failure(&malformed_id, 2, "validation_error");

    let shown = run_with_db(&db, &["programme", "show", "1"]);
    assert_success(&shown);
    assert_eq!(stdout(&shown).trim_end(), "1\tComputer Science\tstudents=1");

    let deleted = run_with_db(&db, &["programme", "delete", "1"]);
    assert_success(&deleted);
    assert!(stdout(&deleted).contains("students_removed=1"));

    let gone = run_with_db(&db, &["student", "show", "1"]);
    assert_failure(&gone, 3, "not_found");
}

#[test]
fn unopenable_database_is_a_storage_error() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("missing").join("registry.sqlite3");
    let output = run_with_db(&db, &["programme", "list"]);
    assert_failure(&output, 1, "storage_error");
}

#[test]
fn memory_flag_leaves_database_path_untouched() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("unused.sqlite3");

    let output = run_with_db(&db, &["--memory", "programme", "add", "Physics"]);
    assert_success(&output);
    assert_eq!(stdout(&output).trim_end(), "programme 1\tPhysics");
    assert!(!db.exists());
}
