//! Integrity checks
//!
//! Required-field, foreign-key and value-shape rules are checked here,
//! against the schema descriptors, before the store writes anything. The
//! checks reach storage only through [`KeyLookup`], so they hold whatever
//! backend sits underneath.

use crate::entity::{EntityKind, Record};
use crate::schema::{EntityDef, FieldDef, Schema};
use crate::value::Value;
use crate::{Error, Result};

/// Why a write was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("required field '{field}' is null")]
    RequiredFieldNull { field: &'static str },

    #[error("'{field}' = {id} does not reference an existing {target}")]
    DanglingReference { field: &'static str, target: EntityKind, id: i64 },

    #[error("row {id} is still referenced by {count} {by} row(s) through '{field}'")]
    StillReferenced { id: i64, by: EntityKind, field: &'static str, count: usize },

    /// A constraint the backend enforced on its own
    #[error("backend constraint failed: {0}")]
    Backend(String),
}

/// Key queries the checks need from a backend
pub trait KeyLookup {
    /// Whether a row of `kind` with surrogate key `id` exists
    fn key_exists(&self, kind: EntityKind, id: i64) -> Result<bool>;

    /// Number of `kind` rows whose `field` equals `id`
    fn count_referencing(&self, kind: EntityKind, field: &str, id: i64) -> Result<usize>;
}

fn violation(entity: EntityKind, violation: Violation) -> Error {
    tracing::warn!(%entity, %violation, "rejected write");
    Error::IntegrityViolation { entity, violation }
}

/// Reject values whose shape does not fit the field's column type
pub fn check_type(def: &EntityDef, field: &FieldDef, value: &Value) -> Result<()> {
    if field.ty.accepts(value) {
        Ok(())
    } else {
        Err(Error::InvalidValue(format!(
            "{}.{} is {} but got a {} value",
            def.kind,
            field.name,
            field.ty,
            value.type_name()
        )))
    }
}

fn check_length(def: &EntityDef, field: &FieldDef, value: &Value) -> Result<()> {
    if let (Some(max), Value::Text(text)) = (field.max_len(), value) {
        let len = text.chars().count();
        if len > max {
            return Err(Error::InvalidValue(format!(
                "{}.{} holds at most {} characters, got {}",
                def.kind, field.name, max, len
            )));
        }
    }
    Ok(())
}

/// Validate a record about to be inserted
pub fn check_insert(schema: &Schema, record: &Record, lookup: &impl KeyLookup) -> Result<()> {
    let def = schema.entity(record.kind())?;

    for (name, value) in record.values() {
        let field = def.field(name).ok_or_else(|| Error::UnknownField {
            entity: def.kind,
            field: name.to_string(),
        })?;

        if value.is_null() {
            if field.required {
                return Err(violation(def.kind, Violation::RequiredFieldNull { field: field.name }));
            }
            continue;
        }

        check_type(def, field, &value)?;
        check_length(def, field, &value)?;

        if let (Some(target), Some(id)) = (field.references, value.as_integer()) {
            if !lookup.key_exists(target, id)? {
                return Err(violation(
                    def.kind,
                    Violation::DanglingReference { field: field.name, target, id },
                ));
            }
        }
    }

    Ok(())
}

/// Validate deletion of a row. Deletes fail closed while anything references the row.
pub fn check_delete(schema: &Schema, kind: EntityKind, id: i64, lookup: &impl KeyLookup) -> Result<()> {
    for (def, field) in schema.referencing(kind) {
        let count = lookup.count_referencing(def.kind, field.name, id)?;
        if count > 0 {
            return Err(violation(
                kind,
                Violation::StillReferenced { id, by: def.kind, field: field.name, count },
            ));
        }
    }
    Ok(())
}
