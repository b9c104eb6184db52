//! Command execution over the registry facade.
//!
//! # Responsibility
//! - Construct the selected store (SQLite file or in-memory) and tear it
//!   down when the command finishes.
//! - Render results as text or JSON.

use crate::cli::{Cli, Commands, ProgrammeCommands, StudentCommands};
use log::info;
use registry_core::db::{open_db, DbError};
use registry_core::{
    core_version, CascadeSummary, ErrorKind, InMemoryRegistryStore, Programme, RegistryError,
    RegistryService, RegistryStore, SqliteRegistryStore, Student,
};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures reported by the CLI.
#[derive(Debug)]
pub enum CliError {
    Db(DbError),
    Registry(RegistryError),
    Json(serde_json::Error),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Registry(err) => err.code(),
            Self::Db(_) | Self::Json(_) => ErrorKind::Storage.code(),
        }
    }

    /// Process exit status: 2 validation, 3 not found, 4 conflict, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Registry(err) => match err.kind() {
                ErrorKind::Validation => 2,
                ErrorKind::NotFound => 3,
                ErrorKind::Conflict => 4,
                ErrorKind::Storage => 1,
            },
            Self::Db(_) | Self::Json(_) => 1,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "failed to encode output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RegistryError> for CliError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Opens the configured store and executes one command.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if let Commands::Version = cli.command {
        println!("registry_core version={}", core_version());
        return Ok(());
    }

    if cli.memory {
        info!("event=store_open module=cli status=ok mode=memory");
        let service = RegistryService::new(InMemoryRegistryStore::new());
        return execute(&service, &cli.command, cli.json);
    }

    let conn = open_db(&cli.db)?;
    let store = SqliteRegistryStore::try_new(&conn).map_err(|source| RegistryError::Store {
        operation: "store_open",
        source,
    })?;
    let service = RegistryService::new(store);
    execute(&service, &cli.command, cli.json)
}

fn execute<S: RegistryStore>(
    service: &RegistryService<S>,
    command: &Commands,
    json: bool,
) -> Result<(), CliError> {
    match command {
        Commands::Programme { command } => run_programme(service, command, json),
        Commands::Student { command } => run_student(service, command, json),
        Commands::Demo => run_demo(service, json),
        Commands::Version => Ok(()),
    }
}

fn run_programme<S: RegistryStore>(
    service: &RegistryService<S>,
    command: &ProgrammeCommands,
    json: bool,
) -> Result<(), CliError> {
    match command {
        ProgrammeCommands::Add { name } => {
            let programme = service.create_programme(name)?;
            print_programme(&programme, json)
        }
        ProgrammeCommands::List => {
            let programmes = service.list_programmes()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&programmes)?);
            } else {
                for programme in &programmes {
                    print_programme_row(programme);
                }
            }
            Ok(())
        }
        ProgrammeCommands::Show { id } => {
            let programme = service.get_programme(id)?;
            let students = service.count_students(id)?;
            if json {
                let payload = json!({ "programme": programme, "student_count": students });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{}\t{}\tstudents={students}",
                    programme.id,
                    RegistryService::<S>::render_programme(&programme)
                );
            }
            Ok(())
        }
        ProgrammeCommands::Find { name } => {
            let programmes = service.find_programmes_by_name(name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&programmes)?);
            } else {
                for programme in &programmes {
                    print_programme_row(programme);
                }
            }
            Ok(())
        }
        ProgrammeCommands::Rename { id, name } => {
            let programme = service.rename_programme(id, name)?;
            print_programme(&programme, json)
        }
        ProgrammeCommands::Delete { id } => {
            let summary = service.delete_programme(id)?;
            print_cascade(&summary, json)
        }
    }
}

fn run_student<S: RegistryStore>(
    service: &RegistryService<S>,
    command: &StudentCommands,
    json: bool,
) -> Result<(), CliError> {
    match command {
        StudentCommands::Add {
            student_id,
            name,
            programme_id,
        } => {
            let student = service.create_student(student_id, name, programme_id)?;
            print_student(&student, json)
        }
        StudentCommands::Show { id } => {
            let student = service.get_student(id)?;
            print_student(&student, json)
        }
        StudentCommands::Lookup { student_id } => {
            let student = service.find_student_by_student_id(student_id)?;
            print_student(&student, json)
        }
        StudentCommands::List { programme_id } => {
            let students = service.roster(programme_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&students)?);
            } else {
                for student in &students {
                    println!(
                        "{}\t{}",
                        student.id,
                        RegistryService::<S>::render_student(student)
                    );
                }
            }
            Ok(())
        }
        StudentCommands::Update {
            id,
            name,
            programme,
        } => {
            let student = service.update_student(id, name.as_deref(), programme.as_deref())?;
            print_student(&student, json)
        }
        StudentCommands::Delete { id } => {
            service.delete_student(id)?;
            if json {
                println!("{}", json!({ "deleted_student": id.trim() }));
            } else {
                println!("deleted student {}", id.trim());
            }
            Ok(())
        }
    }
}

/// Walks the create, enrol and cascade-delete lifecycle.
fn run_demo<S: RegistryStore>(service: &RegistryService<S>, json: bool) -> Result<(), CliError> {
    let programme = service.create_programme("Computer Science")?;
    print_programme(&programme, json)?;

    let programme_id = programme.id.to_string();
    let student = service.create_student("S001", "Bob", &programme_id)?;
    print_student(&student, json)?;

    let summary = service.delete_programme(&programme_id)?;
    print_cascade(&summary, json)?;

    match service.get_student(&student.id.to_string()) {
        Err(err) if err.kind() == ErrorKind::NotFound => {
            println!("student {} removed by cascade", student.id);
            Ok(())
        }
        Err(err) => Err(err.into()),
        Ok(orphan) => Err(RegistryError::Store {
            operation: "demo",
            source: registry_core::StoreError::InvalidData(format!(
                "student {} outlived its programme",
                orphan.id
            )),
        }
        .into()),
    }
}

fn print_programme_row(programme: &Programme) {
    println!("{}\t{}", programme.id, programme);
}

fn print_programme(programme: &Programme, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(programme)?);
    } else {
        println!("programme {}\t{}", programme.id, programme);
    }
    Ok(())
}

fn print_student(student: &Student, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(student)?);
    } else {
        println!(
            "student {}\t{}\tprogramme={}",
            student.id, student, student.programme_id
        );
    }
    Ok(())
}

fn print_cascade(summary: &CascadeSummary, json: bool) -> Result<(), CliError> {
    if json {
        let payload = json!({
            "deleted_programme": summary.programme,
            "students_removed": summary.students_removed,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "deleted programme {}\t{}\tstudents_removed={}",
            summary.programme.id, summary.programme, summary.students_removed
        );
    }
    Ok(())
}
