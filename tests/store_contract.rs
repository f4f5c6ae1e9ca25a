// Integration tests for the institutional data store, against a file-backed database

use campus_store::{
    AcademicProgram, Course, Entity, EntityKind, Error, Event, Institute, Record, SqliteStore, Syllabus, Value,
    Violation,
};
use std::path::PathBuf;
use tempfile::TempDir;

/// A file-backed store with the schema created; the schema is dropped when the fixture goes away
struct Fixture {
    store: SqliteStore,
    path: PathBuf,
    _dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("campus.db");
        let store = SqliteStore::open(&path).expect("Failed to open store");
        store.create_schema().expect("Failed to create schema");
        Self { store, path, _dir: dir }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.store.drop_schema().ok();
    }
}

const TABLES: [&str; 6] = ["academic_program", "course", "event", "institute", "location", "syllabus"];

#[test]
fn test_schema_creates_exactly_six_tables() {
    let fx = Fixture::new();
    assert_eq!(fx.store.list_tables().unwrap(), TABLES);
}

#[test]
fn test_insert_and_find_institute() {
    let fx = Fixture::new();

    for name in ["Instituto de Computação", "Instituto de Matemática e Estatística"] {
        let record = fx.store.insert(Institute::new(name)).unwrap();
        assert!(record.id().is_some());

        let found: Institute = fx.store.find("name", name).unwrap().expect("institute should be found");
        assert_eq!(found.name.as_deref(), Some(name));
    }
}

#[test]
fn test_null_institute_name_is_rejected_and_leaves_no_row() {
    let fx = Fixture::new();
    fx.store.insert(Institute::new("Instituto de Computação")).unwrap();

    let mut nameless = Institute::default();
    nameless.history = Some("Fundado em 1998".to_string());
    let err = fx.store.insert(nameless).unwrap_err();

    match err {
        Error::IntegrityViolation { entity: EntityKind::Institute, violation } => {
            assert_eq!(violation, Violation::RequiredFieldNull { field: "name" });
        }
        other => panic!("expected an integrity violation, got {other}"),
    }

    assert_eq!(fx.store.count(EntityKind::Institute).unwrap(), 1);
    let ghost = fx
        .store
        .find_by_field(EntityKind::Institute, "history", &Value::from("Fundado em 1998"))
        .unwrap();
    assert!(ghost.is_none());
}

#[test]
fn test_required_names_on_every_named_entity() {
    let fx = Fixture::new();
    let nameless: Vec<Record> = vec![
        AcademicProgram::default().into(),
        Course::default().into(),
        Event::default().into(),
    ];
    for record in nameless {
        let kind = record.kind();
        assert!(fx.store.insert(record).unwrap_err().is_integrity_violation(), "{kind} without name");
        assert_eq!(fx.store.count(kind).unwrap(), 0);
    }
}

#[test]
fn test_course_keeps_program_reference() {
    let fx = Fixture::new();
    let program = fx
        .store
        .insert_entity(AcademicProgram::new("Ciência da Computação").with_duration(4))
        .unwrap();
    let program_id = program.id.unwrap();

    let course = fx
        .store
        .insert_entity(Course::new("Inteligência Artificial").in_program(program_id))
        .unwrap();
    assert_eq!(course.program_id, Some(program_id));

    let found: Course = fx.store.find("name", "Inteligência Artificial").unwrap().unwrap();
    assert_eq!(found.program_id, Some(program_id));
}

#[test]
fn test_course_with_unissued_program_is_rejected() {
    let fx = Fixture::new();
    let program = fx.store.insert_entity(AcademicProgram::new("Ciência da Computação")).unwrap();
    let never_issued = program.id.unwrap() + 100;

    let err = fx
        .store
        .insert(Course::new("Inteligência Artificial").in_program(never_issued))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::IntegrityViolation {
            entity: EntityKind::Course,
            violation: Violation::DanglingReference { target: EntityKind::AcademicProgram, .. },
        }
    ));
    assert_eq!(fx.store.count(EntityKind::Course).unwrap(), 0);
}

#[test]
fn test_drop_twice_then_recreate_is_empty() {
    let fx = Fixture::new();
    fx.store.insert(Institute::new("Instituto de Computação")).unwrap();
    fx.store.insert(Event::new("Semana da Computação")).unwrap();

    fx.store.drop_schema().unwrap();
    fx.store.drop_schema().unwrap();
    assert!(fx.store.list_tables().unwrap().is_empty());

    fx.store.create_schema().unwrap();
    assert_eq!(fx.store.list_tables().unwrap(), TABLES);
    assert_eq!(fx.store.stats().unwrap().total(), 0);

    let reinserted = fx.store.insert(Institute::new("Instituto de Física")).unwrap();
    assert_eq!(reinserted.id(), Some(1));
}

#[test]
fn test_end_to_end_institute_program_course() {
    let fx = Fixture::new();

    fx.store.insert(Institute::new("Instituto de Computação")).unwrap();
    assert!(fx
        .store
        .find_by_field(EntityKind::Institute, "name", &Value::from("Instituto de Computação"))
        .unwrap()
        .is_some());

    let program = AcademicProgram::new("Ciência da Computação")
        .with_description("Bacharelado em Ciência da Computação")
        .with_duration(4);
    fx.store.insert(program).unwrap();
    let program: AcademicProgram = fx.store.find("name", "Ciência da Computação").unwrap().unwrap();
    assert_eq!(program.duration, Some(4));

    fx.store
        .insert(Course::new("Inteligência Artificial").in_program(program.id.unwrap()))
        .unwrap();
    let course: Course = fx.store.find("name", "Inteligência Artificial").unwrap().unwrap();
    assert_eq!(course.program_id, program.id);

    fx.store
        .insert(Event::new("Semana da Computação").with_description("Evento anual sobre tecnologia e inovação."))
        .unwrap();
    let event: Event = fx.store.find("name", "Semana da Computação").unwrap().unwrap();
    assert_eq!(event.description.as_deref(), Some("Evento anual sobre tecnologia e inovação."));
}

#[test]
fn test_rows_survive_reopening_the_session() {
    let fx = Fixture::new();
    let course = fx.store.insert_entity(Course::new("Compiladores")).unwrap();
    fx.store.insert(Syllabus::for_course(course.id.unwrap())).unwrap();

    let reopened = SqliteStore::open(&fx.path).unwrap();
    assert_eq!(reopened.count(EntityKind::Syllabus).unwrap(), 1);
    let found: Course = reopened.find("id", course.id.unwrap()).unwrap().unwrap();
    assert_eq!(found.name.as_deref(), Some("Compiladores"));
    reopened.close().unwrap();
}

#[test]
fn test_referenced_course_cannot_be_deleted() {
    let fx = Fixture::new();
    let course = fx.store.insert_entity(Course::new("Compiladores")).unwrap();
    let course_id = course.id.unwrap();
    let syllabus = fx.store.insert_entity(Syllabus::for_course(course_id)).unwrap();

    let err = fx.store.delete(EntityKind::Course, course_id).unwrap_err();
    assert!(matches!(
        err,
        Error::IntegrityViolation { violation: Violation::StillReferenced { by: EntityKind::Syllabus, count: 1, .. }, .. }
    ));

    assert!(fx.store.delete(EntityKind::Syllabus, syllabus.id.unwrap()).unwrap());
    assert!(fx.store.delete(EntityKind::Course, course_id).unwrap());
    assert!(fx.store.get(EntityKind::Course, course_id).unwrap().is_none());
}

#[test]
fn test_overlong_values_are_rejected_before_writing() {
    let fx = Fixture::new();
    let mut event = Event::new("Semana da Computação");
    event.registration_link = Some(format!("https://example.org/{}", "a".repeat(200)));

    assert!(matches!(fx.store.insert(event), Err(Error::InvalidValue(_))));
    assert_eq!(fx.store.count(EntityKind::Event).unwrap(), 0);
}

#[test]
fn test_json_record_with_unknown_key_is_not_stored() {
    let fx = Fixture::new();
    let program = fx.store.insert_entity(AcademicProgram::new("Ciência da Computação")).unwrap();

    let json = serde_json::json!({ "name": "Compiladores", "programa_academico": program.id });
    let err = Record::from_json(EntityKind::Course, json).unwrap_err();
    assert!(matches!(err, Error::UnknownField { entity: EntityKind::Course, ref field } if field == "programa_academico"));
    assert_eq!(fx.store.count(EntityKind::Course).unwrap(), 0);

    let json = serde_json::json!({ "name": "Compiladores", "program_id": program.id });
    let course = fx.store.insert(Record::from_json(EntityKind::Course, json).unwrap()).unwrap();
    let course = Course::from_record(course).unwrap();
    assert_eq!(course.program_id, program.id);
}
