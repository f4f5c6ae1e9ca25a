use crate::schema::FieldDef;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::CAMPUS, text.style(theme().header));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO, label.style(theme().label), value);
}

/// Heading for one table of `schema show`
pub fn table_heading(table: &str) {
    println!();
    println!("{} {}", Icons::TABLE, table.style(theme().header));
}

/// One field of `schema show`: name, column type, and its constraints
pub fn field_row(field: &FieldDef) {
    println!("  {}", format_field(field));
}

fn format_field(field: &FieldDef) -> String {
    let mut notes = Vec::new();
    if field.required {
        notes.push("required".to_string());
    }
    if let Some(target) = field.references {
        notes.push(format!("{} {}", Icons::LINK, target));
    }
    format!(
        "{} {:<13} {}",
        format!("{:<18}", field.name).style(theme().label),
        field.ty.to_string(),
        notes.join(", ").style(theme().constraint)
    )
}

pub fn total_row(count: usize) {
    println!("  {} {}", "Total records:".style(theme().muted), count);
}
