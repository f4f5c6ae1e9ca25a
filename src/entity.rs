//! Entity types
//!
//! Six record types make up the institutional information store:
//! - `Location`: postal and contact details
//! - `Institute`: the institution itself
//! - `AcademicProgram`: a degree program
//! - `Course`: a course, optionally owned by a program
//! - `Syllabus`: the syllabus of a course
//! - `Event`: a dated event
//!
//! Every record carries an `id` that is `None` until the store assigns it.

use crate::schema::{KEY_COLUMN, SCHEMA};
use crate::value::Value;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The entity types of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Location,
    Institute,
    AcademicProgram,
    Course,
    Syllabus,
    Event,
}

impl EntityKind {
    /// Table name of the entity
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Location => "location",
            EntityKind::Institute => "institute",
            EntityKind::AcademicProgram => "academic_program",
            EntityKind::Course => "course",
            EntityKind::Syllabus => "syllabus",
            EntityKind::Event => "event",
        }
    }

    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Location,
            EntityKind::Institute,
            EntityKind::AcademicProgram,
            EntityKind::Course,
            EntityKind::Syllabus,
            EntityKind::Event,
        ]
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    /// Accepts table names, type names, and Portuguese table names (`instituto`, `disciplina`, ...)
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s.chars().filter(|c| *c != '_' && *c != '-').collect();
        match normalized.to_lowercase().as_str() {
            "location" | "localizacao" => Ok(EntityKind::Location),
            "institute" | "instituto" => Ok(EntityKind::Institute),
            "academicprogram" | "program" | "programaacademico" => Ok(EntityKind::AcademicProgram),
            "course" | "disciplina" => Ok(EntityKind::Course),
            "syllabus" | "ementa" => Ok(EntityKind::Syllabus),
            "event" | "evento" => Ok(EntityKind::Event),
            _ => Err(Error::UnknownEntity(s.to_string())),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Location {
    #[serde(skip_deserializing)]
    pub id: Option<i64>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// The institution. `name` is required; it is optional here so that a
/// missing name reaches the store and is rejected there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Institute {
    #[serde(skip_deserializing)]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub history: Option<String>,
    pub founded_on: Option<NaiveDate>,
    pub mission: Option<String>,
    pub vision: Option<String>,
    pub values: Option<String>,
}

impl Institute {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcademicProgram {
    #[serde(skip_deserializing)]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Length of the program in periods
    pub duration: Option<i64>,
    pub coordinator: Option<String>,
}

impl AcademicProgram {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Course {
    #[serde(skip_deserializing)]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub credit_hours: Option<i64>,
    pub instructor: Option<String>,
    /// Owning academic program
    pub program_id: Option<i64>,
}

impl Course {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub fn in_program(mut self, program_id: i64) -> Self {
        self.program_id = Some(program_id);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Syllabus {
    #[serde(skip_deserializing)]
    pub id: Option<i64>,
    pub course_id: Option<i64>,
    pub content: Option<String>,
    pub bibliography: Option<String>,
    pub methodology: Option<String>,
    pub assessment: Option<String>,
}

impl Syllabus {
    pub fn for_course(course_id: i64) -> Self {
        Self { course_id: Some(course_id), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Event {
    #[serde(skip_deserializing)]
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub organizer: Option<String>,
    pub registration_link: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A record of any entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Record {
    Location(Location),
    Institute(Institute),
    AcademicProgram(AcademicProgram),
    Course(Course),
    Syllabus(Syllabus),
    Event(Event),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Location(_) => EntityKind::Location,
            Record::Institute(_) => EntityKind::Institute,
            Record::AcademicProgram(_) => EntityKind::AcademicProgram,
            Record::Course(_) => EntityKind::Course,
            Record::Syllabus(_) => EntityKind::Syllabus,
            Record::Event(_) => EntityKind::Event,
        }
    }

    /// Surrogate key, once assigned by the store
    pub fn id(&self) -> Option<i64> {
        match self {
            Record::Location(r) => r.id,
            Record::Institute(r) => r.id,
            Record::AcademicProgram(r) => r.id,
            Record::Course(r) => r.id,
            Record::Syllabus(r) => r.id,
            Record::Event(r) => r.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: i64) {
        match self {
            Record::Location(r) => r.id = Some(id),
            Record::Institute(r) => r.id = Some(id),
            Record::AcademicProgram(r) => r.id = Some(id),
            Record::Course(r) => r.id = Some(id),
            Record::Syllabus(r) => r.id = Some(id),
            Record::Event(r) => r.id = Some(id),
        }
    }

    /// Column values in schema field order, excluding the surrogate key
    pub fn values(&self) -> Vec<(&'static str, Value)> {
        match self {
            Record::Location(r) => vec![
                ("address", r.address.clone().into()),
                ("city", r.city.clone().into()),
                ("state", r.state.clone().into()),
                ("postal_code", r.postal_code.clone().into()),
                ("phone", r.phone.clone().into()),
                ("email", r.email.clone().into()),
                ("website", r.website.clone().into()),
            ],
            Record::Institute(r) => vec![
                ("name", r.name.clone().into()),
                ("history", r.history.clone().into()),
                ("founded_on", r.founded_on.into()),
                ("mission", r.mission.clone().into()),
                ("vision", r.vision.clone().into()),
                ("values", r.values.clone().into()),
            ],
            Record::AcademicProgram(r) => vec![
                ("name", r.name.clone().into()),
                ("description", r.description.clone().into()),
                ("duration", r.duration.into()),
                ("coordinator", r.coordinator.clone().into()),
            ],
            Record::Course(r) => vec![
                ("name", r.name.clone().into()),
                ("description", r.description.clone().into()),
                ("credit_hours", r.credit_hours.into()),
                ("instructor", r.instructor.clone().into()),
                ("program_id", r.program_id.into()),
            ],
            Record::Syllabus(r) => vec![
                ("course_id", r.course_id.into()),
                ("content", r.content.clone().into()),
                ("bibliography", r.bibliography.clone().into()),
                ("methodology", r.methodology.clone().into()),
                ("assessment", r.assessment.clone().into()),
            ],
            Record::Event(r) => vec![
                ("name", r.name.clone().into()),
                ("description", r.description.clone().into()),
                ("date", r.date.into()),
                ("venue", r.venue.clone().into()),
                ("organizer", r.organizer.clone().into()),
                ("registration_link", r.registration_link.clone().into()),
            ],
        }
    }

    /// Build a record of the given kind from a JSON object. Any `id` in the input is ignored.
    ///
    /// Keys are checked against the schema first, so a misspelled field is
    /// reported by name instead of being dropped.
    pub fn from_json(kind: EntityKind, json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(mut object) = json else {
            return Err(Error::InvalidValue(format!("{} record must be a JSON object", kind)));
        };
        object.remove(KEY_COLUMN);

        let def = SCHEMA.entity(kind)?;
        if let Some(unknown) = object.keys().find(|key| def.field(key).is_none()) {
            return Err(Error::UnknownField { entity: kind, field: unknown.clone() });
        }

        let json = serde_json::Value::Object(object);
        let invalid = |e: serde_json::Error| Error::InvalidValue(format!("{}: {}", kind, e));
        Ok(match kind {
            EntityKind::Location => Record::Location(serde_json::from_value(json).map_err(invalid)?),
            EntityKind::Institute => Record::Institute(serde_json::from_value(json).map_err(invalid)?),
            EntityKind::AcademicProgram => {
                Record::AcademicProgram(serde_json::from_value(json).map_err(invalid)?)
            }
            EntityKind::Course => Record::Course(serde_json::from_value(json).map_err(invalid)?),
            EntityKind::Syllabus => Record::Syllabus(serde_json::from_value(json).map_err(invalid)?),
            EntityKind::Event => Record::Event(serde_json::from_value(json).map_err(invalid)?),
        })
    }

    /// Display label: the record's name if it has one, else `<kind>#<id>`
    pub fn label(&self) -> String {
        let name = match self {
            Record::Institute(r) => r.name.as_deref(),
            Record::AcademicProgram(r) => r.name.as_deref(),
            Record::Course(r) => r.name.as_deref(),
            Record::Event(r) => r.name.as_deref(),
            Record::Location(r) => r.address.as_deref(),
            Record::Syllabus(_) => None,
        };
        match (name, self.id()) {
            (Some(n), _) => n.to_string(),
            (None, Some(id)) => format!("{}#{}", self.kind(), id),
            (None, None) => format!("{} (unsaved)", self.kind()),
        }
    }
}

/// A concrete entity struct that can travel through the store as a [`Record`]
pub trait Entity: Into<Record> + Sized {
    const KIND: EntityKind;

    /// Unwrap a record of this entity's kind
    fn from_record(record: Record) -> Option<Self>;
}

macro_rules! impl_entity {
    ($ty:ident) => {
        impl From<$ty> for Record {
            fn from(e: $ty) -> Self {
                Record::$ty(e)
            }
        }

        impl Entity for $ty {
            const KIND: EntityKind = EntityKind::$ty;

            fn from_record(record: Record) -> Option<Self> {
                match record {
                    Record::$ty(e) => Some(e),
                    _ => None,
                }
            }
        }
    };
}

impl_entity!(Location);
impl_entity!(Institute);
impl_entity!(AcademicProgram);
impl_entity!(Course);
impl_entity!(Syllabus);
impl_entity!(Event);
