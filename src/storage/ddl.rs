//! SQL rendered from the schema descriptors

use crate::schema::{EntityDef, Schema, KEY_COLUMN};

/// Quote an identifier (`values` and `date` are keywords in SQL)
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `CREATE TABLE IF NOT EXISTS` for one entity
pub fn create_table(def: &EntityDef) -> String {
    let mut columns = vec![format!("    {} INTEGER PRIMARY KEY AUTOINCREMENT", quote(KEY_COLUMN))];

    for field in def.fields {
        let mut column = format!("    {} {}", quote(field.name), field.ty.sql_type());
        if field.required {
            column.push_str(" NOT NULL");
        }
        if let Some(target) = field.references {
            column.push_str(&format!(" REFERENCES {}({})", quote(target.as_str()), quote(KEY_COLUMN)));
        }
        columns.push(column);
    }

    format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", quote(def.table), columns.join(",\n"))
}

/// Indexes on `name` lookups and on every foreign key column
pub fn create_indexes(def: &EntityDef) -> Vec<String> {
    def.fields
        .iter()
        .filter(|f| f.name == "name" || f.references.is_some())
        .map(|f| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                quote(&format!("idx_{}_{}", def.table, f.name)),
                quote(def.table),
                quote(f.name)
            )
        })
        .collect()
}

pub fn drop_table(def: &EntityDef) -> String {
    format!("DROP TABLE IF EXISTS {}", quote(def.table))
}

/// Comma-separated column list, surrogate key first
pub fn select_columns(def: &EntityDef) -> String {
    std::iter::once(KEY_COLUMN)
        .chain(def.fields.iter().map(|f| f.name))
        .map(quote)
        .collect::<Vec<_>>()
        .join(", ")
}

/// All schema creation statements, in dependency order
pub fn all_schema_statements(schema: &Schema) -> Vec<String> {
    let mut stmts: Vec<String> = schema.creation_order().map(create_table).collect();
    stmts.extend(schema.creation_order().flat_map(create_indexes));
    stmts
}
