use registry_core::db::open_db_in_memory;
use registry_core::{
    ErrorKind, InMemoryRegistryStore, RegistryError, RegistryService, SqliteRegistryStore,
    StoreError,
};

fn memory_service() -> RegistryService<InMemoryRegistryStore> {
    RegistryService::new(InMemoryRegistryStore::new())
}

#[test]
fn cascade_scenario_end_to_end() {
    let service = memory_service();

    let programme = service.create_programme("Computer Science").unwrap();
    assert_eq!(programme.id.get(), 1);

    let student = service.create_student("S001", "Bob", "1").unwrap();
    assert_eq!(student.id.get(), 1);

    let summary = service.delete_programme("1").unwrap();
    assert_eq!(summary.students_removed, 1);

    let err = service.get_student("1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.code(), "not_found");
    assert_eq!(err.operation(), "student_get");

    let err = service.list_students_by_programme("1").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn cascade_scenario_on_sqlite() {
    let conn = open_db_in_memory().unwrap();
    let service = RegistryService::new(SqliteRegistryStore::try_new(&conn).unwrap());

    let programme = service.create_programme("Computer Science").unwrap();
    let programme_id = programme.id.to_string();
    let alice = service.create_student("S010", "Alice", &programme_id).unwrap();
    assert_eq!(
        service.get_student(&alice.id.to_string()).unwrap().name,
        "Alice"
    );

    service.delete_programme(&programme_id).unwrap();
    assert_eq!(
        service
            .get_student(&alice.id.to_string())
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn text_fields_are_normalized_before_validation() {
    let service = memory_service();

    let programme = service
        .create_programme("  Computer \t Science \n")
        .unwrap();
    assert_eq!(programme.name, "Computer Science");

    let student = service
        .create_student("  S001 ", "  Bob   Smith ", " 1 ")
        .unwrap();
    assert_eq!(student.student_id, "S001");
    assert_eq!(student.name, "Bob Smith");

    let found = service.find_student_by_student_id(" S001").unwrap();
    assert_eq!(found, student);

    let matches = service.find_programmes_by_name("Computer  Science").unwrap();
    assert_eq!(matches, vec![programme]);
}

#[test]
fn control_characters_do_not_leave_double_spaces() {
    let service = memory_service();

    let programme = service.create_programme("Computer \u{1} Science").unwrap();
    assert_eq!(programme.name, "Computer Science");

    let student = service
        .create_student("S001", "Bob \u{0} Smith", &programme.id.to_string())
        .unwrap();
    assert_eq!(student.name, "Bob Smith");
}

#[test]
fn whitespace_only_names_are_validation_errors() {
    let service = memory_service();
    let err = service.create_programme(" \t ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(matches!(
        err.store_error(),
        Some(StoreError::Validation(_))
    ));
}

#[test]
fn malformed_ids_fail_fast_as_validation() {
    let service = memory_service();

    for bad in ["", "abc", "0", "-4", "1.0", "1e3"] {
        let err = service.create_student("S001", "Bob", bad).unwrap_err();
        assert!(
            matches!(err, RegistryError::InvalidInput { operation: "student_create", .. }),
            "`{bad}` should be rejected before the store"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    assert_eq!(
        service.get_programme("x1").unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        service.delete_student("").unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        service
            .update_student("1", None, Some("nope"))
            .unwrap_err()
            .kind(),
        ErrorKind::Validation
    );
}

#[test]
fn well_formed_but_missing_ids_are_not_found() {
    let service = memory_service();
    let err = service.create_student("S001", "Bob", "999").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(
        err.store_error(),
        Some(StoreError::ProgrammeNotFound(_))
    ));
}

#[test]
fn conflict_kind_is_preserved_through_facade() {
    let service = memory_service();
    service.create_programme("Law").unwrap();
    service.create_student("S001", "Bob", "1").unwrap();

    let err = service.create_student("S001", "Bobby", "1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.code(), "conflict");
    assert!(err.to_string().starts_with("student_create: "));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn rendering_matches_display_forms() {
    let service = memory_service();
    let programme = service.create_programme("Computer Science").unwrap();
    let student = service.create_student("S001", "Bob", "1").unwrap();

    assert_eq!(
        RegistryService::<InMemoryRegistryStore>::render_programme(&programme),
        "Computer Science"
    );
    assert_eq!(
        RegistryService::<InMemoryRegistryStore>::render_student(&student),
        "Bob (S001)"
    );
}

#[test]
fn roster_and_count_follow_transfers() {
    let service = memory_service();
    service.create_programme("Maths").unwrap();
    service.create_programme("Physics").unwrap();
    service.create_student("M1", "Emmy", "1").unwrap();
    service.create_student("M2", "Kurt", "1").unwrap();

    let moved = service
        .update_student("2", Some("  Kurt  Gödel "), Some("2"))
        .unwrap();
    assert_eq!(moved.name, "Kurt Gödel");

    let maths: Vec<String> = service
        .roster("1")
        .unwrap()
        .into_iter()
        .map(|student| student.student_id)
        .collect();
    assert_eq!(maths, vec!["M1".to_string()]);
    assert_eq!(service.count_students("2").unwrap(), 1);

    let mut cursor = service.list_students_by_programme("2").unwrap();
    assert_eq!(cursor.next().unwrap().unwrap().student_id, "M2");
    assert!(cursor.next().is_none());
    cursor.restart();
    assert_eq!(cursor.count(), 1);
}

#[test]
fn rename_and_delete_student_through_facade() {
    let service = memory_service();
    service.create_programme("Compsci").unwrap();
    let renamed = service.rename_programme("1", "Computer Science").unwrap();
    assert_eq!(renamed.name, "Computer Science");
    assert_eq!(service.list_programmes().unwrap(), vec![renamed]);

    service.create_student("S1", "Ada", "1").unwrap();
    service.delete_student("1").unwrap();
    assert_eq!(
        service.delete_student("1").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(service.count_students("1").unwrap(), 0);
}

#[test]
fn records_serialize_with_plain_ids() {
    let service = memory_service();
    let programme = service.create_programme("Computer Science").unwrap();
    let student = service.create_student("S001", "Bob", "1").unwrap();

    let json = serde_json::to_value(&student).unwrap();
    assert_eq!(json["id"], 1);
    assert_eq!(json["student_id"], "S001");
    assert_eq!(json["name"], "Bob");
    assert_eq!(json["programme_id"], 1);

    let decoded: registry_core::Programme =
        serde_json::from_value(serde_json::to_value(&programme).unwrap()).unwrap();
    assert_eq!(decoded, programme);

    let bad_id = serde_json::json!({ "id": 0, "name": "Nope" });
    assert!(serde_json::from_value::<registry_core::Programme>(bad_id).is_err());
}
