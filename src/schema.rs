//! Schema definition
//!
//! The store layout is described by a static list of entity descriptors.
//! Descriptors appear in dependency order: an entity is always listed after
//! every entity it references, so creating tables front-to-back and dropping
//! them back-to-front never trips a foreign key.

use crate::entity::EntityKind;
use crate::value::Value;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Name of the surrogate key column on every table
pub const KEY_COLUMN: &str = "id";

/// Column type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    /// Unbounded text
    Text,
    /// Text with a maximum length in characters
    VarChar(usize),
    /// Calendar date, stored as `YYYY-MM-DD`
    Date,
}

impl FieldType {
    pub fn sql_type(&self) -> String {
        match self {
            FieldType::Integer => "INTEGER".to_string(),
            FieldType::Text => "TEXT".to_string(),
            FieldType::VarChar(n) => format!("VARCHAR({})", n),
            FieldType::Date => "DATE".to_string(),
        }
    }

    /// Whether a value has a shape this column can hold. Null is always accepted here;
    /// nullability is an integrity concern.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::Integer, Value::Integer(_)) => true,
            (FieldType::Date, Value::Date(_)) => true,
            (FieldType::Text | FieldType::VarChar(_), Value::Text(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_type())
    }
}

/// A single field of an entity
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
    /// Null is rejected at write time
    pub required: bool,
    /// Foreign key to the surrogate key of another entity
    pub references: Option<EntityKind>,
}

impl FieldDef {
    const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: false, references: None }
    }

    const fn required(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty, required: true, references: None }
    }

    const fn reference(name: &'static str, target: EntityKind) -> Self {
        Self { name, ty: FieldType::Integer, required: false, references: Some(target) }
    }

    /// Maximum text length, if bounded
    pub fn max_len(&self) -> Option<usize> {
        match self.ty {
            FieldType::VarChar(n) => Some(n),
            _ => None,
        }
    }
}

/// Descriptor of one entity type and its table
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EntityDef {
    pub kind: EntityKind,
    pub table: &'static str,
    /// Fields in column order, excluding the surrogate key
    pub fields: &'static [FieldDef],
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field, treating the surrogate key as a readable integer field
    pub fn lookup_field(&self, name: &str) -> Result<FieldDef> {
        if name == KEY_COLUMN {
            return Ok(FieldDef::required(KEY_COLUMN, FieldType::Integer));
        }
        self.field(name).copied().ok_or_else(|| Error::UnknownField {
            entity: self.kind,
            field: name.to_string(),
        })
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.references.is_some())
    }
}

/// The full set of entity descriptors a store materializes
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Schema {
    pub entities: &'static [EntityDef],
}

impl Schema {
    pub fn entity(&self, kind: EntityKind) -> Result<&EntityDef> {
        self.entities
            .iter()
            .find(|e| e.kind == kind)
            .ok_or_else(|| Error::UnknownEntity(kind.to_string()))
    }

    pub fn by_table(&self, table: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.table == table)
    }

    /// Entities in creation order
    pub fn creation_order(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.iter()
    }

    /// Entities in drop order (dependents first)
    pub fn drop_order(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.iter().rev()
    }

    /// All (entity, field) pairs whose foreign key points at `target`
    pub fn referencing(&self, target: EntityKind) -> Vec<(&EntityDef, &FieldDef)> {
        self.entities
            .iter()
            .flat_map(|e| e.foreign_keys().map(move |f| (e, f)))
            .filter(|(_, f)| f.references == Some(target))
            .collect()
    }
}

const LOCATION_FIELDS: &[FieldDef] = &[
    FieldDef::optional("address", FieldType::VarChar(200)),
    FieldDef::optional("city", FieldType::VarChar(100)),
    FieldDef::optional("state", FieldType::VarChar(50)),
    FieldDef::optional("postal_code", FieldType::VarChar(10)),
    FieldDef::optional("phone", FieldType::VarChar(20)),
    FieldDef::optional("email", FieldType::VarChar(100)),
    FieldDef::optional("website", FieldType::VarChar(100)),
];

const INSTITUTE_FIELDS: &[FieldDef] = &[
    FieldDef::required("name", FieldType::VarChar(100)),
    FieldDef::optional("history", FieldType::Text),
    FieldDef::optional("founded_on", FieldType::Date),
    FieldDef::optional("mission", FieldType::Text),
    FieldDef::optional("vision", FieldType::Text),
    FieldDef::optional("values", FieldType::Text),
];

const ACADEMIC_PROGRAM_FIELDS: &[FieldDef] = &[
    FieldDef::required("name", FieldType::VarChar(100)),
    FieldDef::optional("description", FieldType::Text),
    FieldDef::optional("duration", FieldType::Integer),
    FieldDef::optional("coordinator", FieldType::VarChar(100)),
];

const COURSE_FIELDS: &[FieldDef] = &[
    FieldDef::required("name", FieldType::VarChar(100)),
    FieldDef::optional("description", FieldType::Text),
    FieldDef::optional("credit_hours", FieldType::Integer),
    FieldDef::optional("instructor", FieldType::VarChar(100)),
    FieldDef::reference("program_id", EntityKind::AcademicProgram),
];

const SYLLABUS_FIELDS: &[FieldDef] = &[
    FieldDef::reference("course_id", EntityKind::Course),
    FieldDef::optional("content", FieldType::Text),
    FieldDef::optional("bibliography", FieldType::Text),
    FieldDef::optional("methodology", FieldType::Text),
    FieldDef::optional("assessment", FieldType::Text),
];

const EVENT_FIELDS: &[FieldDef] = &[
    FieldDef::required("name", FieldType::VarChar(100)),
    FieldDef::optional("description", FieldType::Text),
    FieldDef::optional("date", FieldType::Date),
    FieldDef::optional("venue", FieldType::VarChar(100)),
    FieldDef::optional("organizer", FieldType::VarChar(100)),
    FieldDef::optional("registration_link", FieldType::VarChar(200)),
];

/// The institutional information schema
pub static SCHEMA: Schema = Schema {
    entities: &[
        EntityDef { kind: EntityKind::Location, table: "location", fields: LOCATION_FIELDS },
        EntityDef { kind: EntityKind::Institute, table: "institute", fields: INSTITUTE_FIELDS },
        EntityDef {
            kind: EntityKind::AcademicProgram,
            table: "academic_program",
            fields: ACADEMIC_PROGRAM_FIELDS,
        },
        EntityDef { kind: EntityKind::Course, table: "course", fields: COURSE_FIELDS },
        EntityDef { kind: EntityKind::Syllabus, table: "syllabus", fields: SYLLABUS_FIELDS },
        EntityDef { kind: EntityKind::Event, table: "event", fields: EVENT_FIELDS },
    ],
};
