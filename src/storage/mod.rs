//! Storage Layer - SQLite-backed persistence
//!
//! One table per entity, rendered from the schema descriptors:
//! - location, institute, academic_program, event
//! - course(program_id -> academic_program)
//! - syllabus(course_id -> course)

pub mod ddl;
pub mod sqlite;

pub use sqlite::{DbStats, SqliteStore};
