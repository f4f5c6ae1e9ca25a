use crate::entity::Record;
use crate::storage::DbStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            field: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// One row per field, surrogate key first
pub fn record_table(record: &Record) -> String {
    let mut builder = TableBuilder::new();
    let id = record.id().map(|id| id.to_string()).unwrap_or_default();
    builder.add_row("id", &id);
    for (field, value) in record.values() {
        builder.add_row(field, &value.to_string());
    }
    builder.build()
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    for (kind, count) in &stats.tables {
        builder.add_row(kind.as_str(), &count.to_string());
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AcademicProgram;

    #[test]
    fn test_record_table_lists_every_field() {
        let record: Record = AcademicProgram::new("Ciência da Computação").with_duration(4).into();
        let table = record_table(&record);
        for field in ["id", "name", "description", "duration", "coordinator"] {
            assert!(table.contains(field), "missing {field}");
        }
        assert!(table.contains("Ciência da Computação"));
        assert!(table.contains("null"));
    }

    #[test]
    fn test_empty_builder_renders_nothing() {
        assert!(TableBuilder::new().build().is_empty());
    }
}
