//! # campus-store - Institutional Information Store
//!
//! A small relational store for the facts a campus assistant answers
//! questions about: the institute, its academic programs, courses and
//! syllabi, events, and locations.
//!
//! campus-store provides:
//! - An explicit, static schema of six entity types
//! - Store-enforced required-field and foreign-key integrity
//! - SQLite-backed persistence with create, lookup and fail-closed delete
//! - A command-line front end over the same operations

pub mod entity;
pub mod value;
pub mod schema;
pub mod integrity;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use entity::{AcademicProgram, Course, Entity, EntityKind, Event, Institute, Location, Record, Syllabus};
pub use value::Value;
pub use schema::{Schema, SCHEMA};
pub use integrity::Violation;
pub use storage::SqliteStore;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Integrity violation on {entity}: {violation}")]
    IntegrityViolation { entity: EntityKind, violation: Violation },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown field {field} on {entity}")]
    UnknownField { entity: EntityKind, field: String },

    #[error("Table for {0} is not materialized (run create_schema first)")]
    SchemaMissing(EntityKind),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Error::IntegrityViolation { .. })
    }
}
