//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use crate::{Result, Error};
use crate::entity::{AcademicProgram, Course, Entity, EntityKind, Event, Institute, Location, Record, Syllabus};
use crate::integrity::{self, KeyLookup, Violation};
use crate::schema::{EntityDef, Schema, KEY_COLUMN, SCHEMA};
use crate::value::Value;
use super::ddl::{self, quote};

/// SQLite-backed institutional data store.
///
/// A store value is one session: the connection is opened with the store
/// and released when it is dropped (or explicitly with [`SqliteStore::close`]).
pub struct SqliteStore {
    conn: Connection,
    schema: &'static Schema,
}

impl SqliteStore {
    /// Open a database file (creates the file if it doesn't exist).
    ///
    /// Tables are not created; call [`SqliteStore::create_schema`].
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_schema(Connection::open(path)?, &SCHEMA)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_schema(Connection::open_in_memory()?, &SCHEMA)
    }

    /// Wrap an open connection, materializing the given schema on demand
    pub fn with_schema(conn: Connection, schema: &'static Schema) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn, schema })
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Close the session, surfacing any error the connection reports on close
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    // ========== Schema Operations ==========

    /// Create every entity table and index that is not already present
    pub fn create_schema(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for stmt in ddl::all_schema_statements(self.schema) {
            tx.execute(&stmt, [])?;
        }
        tx.commit()?;
        tracing::debug!("schema created ({} entities)", self.schema.entities.len());
        Ok(())
    }

    /// Drop every entity table, dependents first. Absent tables are skipped.
    pub fn drop_schema(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for def in self.schema.drop_order() {
            tx.execute(&ddl::drop_table(def), [])?;
        }
        tx.commit()?;
        tracing::debug!("schema dropped");
        Ok(())
    }

    /// Names of the entity tables currently materialized, sorted
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        )?;

        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter(|name| self.schema.by_table(name).is_some())
            .collect();

        Ok(tables)
    }

    fn is_materialized(&self, def: &EntityDef) -> Result<bool> {
        let found = self.conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [def.table],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Descriptor of `kind`, provided its table exists
    fn require_table(&self, kind: EntityKind) -> Result<&'static EntityDef> {
        let def = self.schema.entity(kind)?;
        if !self.is_materialized(def)? {
            return Err(Error::SchemaMissing(kind));
        }
        Ok(def)
    }

    // ========== Record Operations ==========

    /// Validate and persist a record, returning it with its assigned key.
    ///
    /// Checks and the write share one transaction: a rejected record leaves no row behind.
    pub fn insert(&self, record: impl Into<Record>) -> Result<Record> {
        let mut record = record.into();
        let kind = record.kind();
        let def = self.require_table(kind)?;

        let tx = self.conn.unchecked_transaction()?;
        integrity::check_insert(self.schema, &record, self)?;

        let values = record.values();
        let columns: Vec<String> = values.iter().map(|(name, _)| quote(name)).collect();
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(def.table),
            columns.join(", "),
            placeholders.join(", ")
        );

        tx.execute(&sql, rusqlite::params_from_iter(values.iter().map(|(_, v)| v)))
            .map_err(|e| backend_error(kind, e))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        record.set_id(id);
        tracing::debug!("inserted {} #{}", kind, id);
        Ok(record)
    }

    /// Typed form of [`SqliteStore::insert`]
    pub fn insert_entity<E: Entity>(&self, entity: E) -> Result<E> {
        let record = self.insert(entity)?;
        E::from_record(record).ok_or_else(|| Error::UnknownEntity(E::KIND.to_string()))
    }

    /// First record (lowest key) whose `field` equals `value`, or `None`.
    ///
    /// A `Null` value matches rows where the field is null.
    pub fn find_by_field(&self, kind: EntityKind, field: &str, value: &Value) -> Result<Option<Record>> {
        let sql = self.lookup_sql(kind, field, value, Some(1))?;
        let def = self.schema.entity(kind)?;
        self.conn
            .query_row(&sql, rusqlite::params_from_iter(bind(value)), |row| row_to_record(def, row))
            .optional()
            .map_err(Into::into)
    }

    /// Every record whose `field` equals `value`, in key order
    pub fn find_all_by_field(&self, kind: EntityKind, field: &str, value: &Value) -> Result<Vec<Record>> {
        let sql = self.lookup_sql(kind, field, value, None)?;
        let def = self.schema.entity(kind)?;
        let mut stmt = self.conn.prepare(&sql)?;

        let records = stmt
            .query_map(rusqlite::params_from_iter(bind(value)), |row| row_to_record(def, row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Typed form of [`SqliteStore::find_by_field`]
    pub fn find<E: Entity>(&self, field: &str, value: impl Into<Value>) -> Result<Option<E>> {
        Ok(self
            .find_by_field(E::KIND, field, &value.into())?
            .and_then(E::from_record))
    }

    /// Record by surrogate key
    pub fn get(&self, kind: EntityKind, id: i64) -> Result<Option<Record>> {
        self.find_by_field(kind, KEY_COLUMN, &Value::Integer(id))
    }

    fn lookup_sql(&self, kind: EntityKind, field: &str, value: &Value, limit: Option<usize>) -> Result<String> {
        let def = self.require_table(kind)?;
        let field_def = def.lookup_field(field)?;
        integrity::check_type(def, &field_def, value)?;

        let condition = if value.is_null() {
            format!("{} IS NULL", quote(field_def.name))
        } else {
            format!("{} = ?1", quote(field_def.name))
        };

        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            ddl::select_columns(def),
            quote(def.table),
            condition,
            quote(KEY_COLUMN)
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        Ok(sql)
    }

    /// Delete a record by key. Returns `false` if no such record exists.
    ///
    /// Fails closed: a record still referenced by another is never deleted.
    pub fn delete(&self, kind: EntityKind, id: i64) -> Result<bool> {
        let def = self.require_table(kind)?;

        let tx = self.conn.unchecked_transaction()?;
        integrity::check_delete(self.schema, kind, id, self)?;

        let sql = format!("DELETE FROM {} WHERE {} = ?1", quote(def.table), quote(KEY_COLUMN));
        let removed = tx.execute(&sql, [id]).map_err(|e| backend_error(kind, e))?;
        tx.commit()?;

        if removed > 0 {
            tracing::debug!("deleted {} #{}", kind, id);
        }
        Ok(removed > 0)
    }

    /// Count rows of one entity
    pub fn count(&self, kind: EntityKind) -> Result<usize> {
        let def = self.require_table(kind)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote(def.table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Row counts of every materialized entity table
    pub fn stats(&self) -> Result<DbStats> {
        let mut tables = Vec::new();
        for def in self.schema.creation_order() {
            if self.is_materialized(def)? {
                tables.push((def.kind, self.count(def.kind)?));
            }
        }
        Ok(DbStats { tables })
    }
}

impl KeyLookup for SqliteStore {
    fn key_exists(&self, kind: EntityKind, id: i64) -> Result<bool> {
        let def = self.schema.entity(kind)?;
        if !self.is_materialized(def)? {
            return Ok(false);
        }
        let found = self.conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE {} = ?1", quote(def.table), quote(KEY_COLUMN)),
                [id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count_referencing(&self, kind: EntityKind, field: &str, id: i64) -> Result<usize> {
        let def = self.schema.entity(kind)?;
        if !self.is_materialized(def)? {
            return Ok(0);
        }
        let field = def.lookup_field(field)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", quote(def.table), quote(field.name)),
            [id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Parameters for a lookup: none when matching null
fn bind(value: &Value) -> Option<&Value> {
    if value.is_null() { None } else { Some(value) }
}

/// Constraint failures the backend caught on its own surface as integrity violations
fn backend_error(kind: EntityKind, err: rusqlite::Error) -> Error {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        tracing::warn!(entity = %kind, "backend constraint failed: {}", err);
        Error::IntegrityViolation { entity: kind, violation: Violation::Backend(err.to_string()) }
    } else {
        err.into()
    }
}

/// Helper to convert a row to a record of the descriptor's entity
fn row_to_record(def: &EntityDef, row: &rusqlite::Row) -> rusqlite::Result<Record> {
    let id = Some(row.get(KEY_COLUMN)?);

    Ok(match def.kind {
        EntityKind::Location => Record::Location(Location {
            id,
            address: row.get("address")?,
            city: row.get("city")?,
            state: row.get("state")?,
            postal_code: row.get("postal_code")?,
            phone: row.get("phone")?,
            email: row.get("email")?,
            website: row.get("website")?,
        }),
        EntityKind::Institute => Record::Institute(Institute {
            id,
            name: row.get("name")?,
            history: row.get("history")?,
            founded_on: row.get("founded_on")?,
            mission: row.get("mission")?,
            vision: row.get("vision")?,
            values: row.get("values")?,
        }),
        EntityKind::AcademicProgram => Record::AcademicProgram(AcademicProgram {
            id,
            name: row.get("name")?,
            description: row.get("description")?,
            duration: row.get("duration")?,
            coordinator: row.get("coordinator")?,
        }),
        EntityKind::Course => Record::Course(Course {
            id,
            name: row.get("name")?,
            description: row.get("description")?,
            credit_hours: row.get("credit_hours")?,
            instructor: row.get("instructor")?,
            program_id: row.get("program_id")?,
        }),
        EntityKind::Syllabus => Record::Syllabus(Syllabus {
            id,
            course_id: row.get("course_id")?,
            content: row.get("content")?,
            bibliography: row.get("bibliography")?,
            methodology: row.get("methodology")?,
            assessment: row.get("assessment")?,
        }),
        EntityKind::Event => Record::Event(Event {
            id,
            name: row.get("name")?,
            description: row.get("description")?,
            date: row.get("date")?,
            venue: row.get("venue")?,
            organizer: row.get("organizer")?,
            registration_link: row.get("registration_link")?,
        }),
    })
}

/// Row counts per materialized entity table
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub tables: Vec<(EntityKind, usize)>,
}

impl DbStats {
    pub fn total(&self) -> usize {
        self.tables.iter().map(|(_, n)| n).sum()
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (kind, count) in &self.tables {
            writeln!(f, "  {}: {}", kind, count)?;
        }
        write!(f, "  Total: {}", self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_schema().unwrap();
        store
    }

    #[test]
    fn test_create_schema_lists_six_tables() {
        let store = store();
        let tables = store.list_tables().unwrap();
        assert_eq!(
            tables,
            vec!["academic_program", "course", "event", "institute", "location", "syllabus"]
        );
    }

    #[test]
    fn test_create_schema_is_idempotent() {
        let store = store();
        store.insert(Institute::new("Instituto de Computação")).unwrap();
        store.create_schema().unwrap();
        assert_eq!(store.count(EntityKind::Institute).unwrap(), 1);
    }

    #[test]
    fn test_institute_crud() {
        let store = store();

        let mut institute = Institute::new("Instituto de Computação");
        institute.founded_on = NaiveDate::from_ymd_opt(1998, 3, 12);
        institute.values = Some("Excelência".to_string());

        let saved = store.insert_entity(institute).unwrap();
        assert_eq!(saved.id, Some(1));

        let found: Institute = store.find("name", "Instituto de Computação").unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.founded_on, NaiveDate::from_ymd_opt(1998, 3, 12));
    }

    #[test]
    fn test_find_missing_returns_none() {
        let store = store();
        let found = store
            .find_by_field(EntityKind::Event, "name", &Value::from("Semana da Computação"))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_find_first_match_by_key_order() {
        let store = store();
        let first = store.insert(Course::new("Cálculo I")).unwrap();
        store.insert(Course::new("Cálculo I")).unwrap();

        let found = store.find_by_field(EntityKind::Course, "name", &Value::from("Cálculo I")).unwrap().unwrap();
        assert_eq!(found.id(), first.id());

        let all = store.find_all_by_field(EntityKind::Course, "name", &Value::from("Cálculo I")).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id() < all[1].id());
    }

    #[test]
    fn test_find_null_matches_null_fields() {
        let store = store();
        store.insert(Course::new("Sem programa")).unwrap();
        let program = store.insert_entity(AcademicProgram::new("Sistemas de Informação")).unwrap();
        store.insert(Course::new("Com programa").in_program(program.id.unwrap())).unwrap();

        let orphans = store.find_all_by_field(EntityKind::Course, "program_id", &Value::Null).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].label(), "Sem programa");
    }

    #[test]
    fn test_find_rejects_unknown_field_and_wrong_type() {
        let store = store();
        assert!(matches!(
            store.find_by_field(EntityKind::Institute, "nome", &Value::from("x")),
            Err(Error::UnknownField { .. })
        ));
        assert!(matches!(
            store.find_by_field(EntityKind::AcademicProgram, "duration", &Value::from("four")),
            Err(Error::InvalidValue(_))
        ));
    }

    #[test]
    fn test_null_name_rejected_without_partial_row() {
        let store = store();
        let err = store.insert(Institute::default()).unwrap_err();
        assert!(err.is_integrity_violation());
        assert_eq!(store.count(EntityKind::Institute).unwrap(), 0);
    }

    #[test]
    fn test_syllabus_follows_course() {
        let store = store();
        let course = store.insert_entity(Course::new("Estruturas de Dados")).unwrap();
        let mut syllabus = Syllabus::for_course(course.id.unwrap());
        syllabus.bibliography = Some("Cormen et al.".to_string());
        store.insert(syllabus).unwrap();

        let found: Syllabus = store.find("course_id", course.id.unwrap()).unwrap().unwrap();
        assert_eq!(found.bibliography.as_deref(), Some("Cormen et al."));

        let err = store.insert(Syllabus::for_course(999)).unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[test]
    fn test_delete_fails_closed_while_referenced() {
        let store = store();
        let program = store.insert_entity(AcademicProgram::new("Ciência da Computação")).unwrap();
        let program_id = program.id.unwrap();
        let course = store.insert_entity(Course::new("Inteligência Artificial").in_program(program_id)).unwrap();

        let err = store.delete(EntityKind::AcademicProgram, program_id).unwrap_err();
        assert!(err.is_integrity_violation());
        assert!(store.get(EntityKind::AcademicProgram, program_id).unwrap().is_some());

        assert!(store.delete(EntityKind::Course, course.id.unwrap()).unwrap());
        assert!(store.delete(EntityKind::AcademicProgram, program_id).unwrap());
        assert!(!store.delete(EntityKind::AcademicProgram, program_id).unwrap());
    }

    #[test]
    fn test_keys_are_never_reused() {
        let store = store();
        let first = store.insert(Event::new("Semana da Computação")).unwrap().id().unwrap();
        store.delete(EntityKind::Event, first).unwrap();
        let second = store.insert(Event::new("Hackathon")).unwrap().id().unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_operations_on_dropped_schema() {
        let store = store();
        store.drop_schema().unwrap();
        assert!(store.list_tables().unwrap().is_empty());
        assert!(matches!(
            store.insert(Institute::new("Instituto de Computação")),
            Err(Error::SchemaMissing(EntityKind::Institute))
        ));
        assert!(store.stats().unwrap().tables.is_empty());
    }

    #[test]
    fn test_stats() {
        let store = store();
        store.insert(Event::new("Semana da Computação")).unwrap();
        store.insert(Location { city: Some("Salvador".into()), ..Default::default() }).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.tables.len(), 6);
        assert_eq!(stats.total(), 2);
        assert!(stats.to_string().contains("event: 1"));
    }

    #[test]
    fn test_backend_constraint_surfaces_as_integrity_violation() {
        // An event table carrying a check the schema descriptors know nothing about
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"CREATE TABLE "event" (
                "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "name" VARCHAR(100) NOT NULL,
                "description" TEXT,
                "date" DATE,
                "venue" VARCHAR(100) CHECK ("venue" <> ''),
                "organizer" VARCHAR(100),
                "registration_link" VARCHAR(200)
            );"#,
        )
        .unwrap();
        let store = SqliteStore::with_schema(conn, &SCHEMA).unwrap();
        store.create_schema().unwrap();

        let mut event = Event::new("Semana da Computação");
        event.venue = Some(String::new());
        let err = store.insert(event).unwrap_err();
        match err {
            Error::IntegrityViolation { entity, violation: Violation::Backend(message) } => {
                assert_eq!(entity, EntityKind::Event);
                assert!(message.contains("CHECK"), "unexpected message: {message}");
            }
            other => panic!("expected a backend violation, got {other}"),
        }
        assert_eq!(store.count(EntityKind::Event).unwrap(), 0);

        let mut event = Event::new("Semana da Computação");
        event.venue = Some("Auditório".to_string());
        assert!(store.insert(event).is_ok());
    }
}
