pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, field_row, header, info, success, table_heading, total_row, warn};
pub use table::{record_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
