//! campus-store CLI - Command-line interface for the institutional information store

use anyhow::Context;
use campus_store::config::{self, CampusConfig};
use campus_store::ui::{self, Icons};
use campus_store::{EntityKind, Record, SqliteStore, Value};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "campus-store")]
#[command(version)]
#[command(about = "Institutional information store - institutes, programs, courses, syllabi, events and locations")]
#[command(long_about = r#"
campus-store keeps the facts a campus assistant answers questions about,
with required fields and references checked on every write.

Example usage:
  campus-store init
  campus-store insert academic-program --data '{"name": "Ciência da Computação", "duration": 4}'
  campus-store insert course --data '{"name": "Inteligência Artificial", "program_id": 1}'
  campus-store find course --field name --value "Inteligência Artificial"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file, prepare the data directory and create the schema
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Manage the schema
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },

    /// Insert a record
    Insert {
        /// Entity type (institute, academic-program, course, syllabus, event, location)
        entity: EntityKind,

        /// Record as a JSON object, or @path to read it from a file
        #[arg(long)]
        data: String,
    },

    /// Look up records by field value
    Find {
        entity: EntityKind,

        #[arg(long)]
        field: String,

        #[arg(long)]
        value: String,

        /// Return every match instead of the first
        #[arg(long)]
        all: bool,
    },

    /// Look up a record by id
    Get {
        entity: EntityKind,

        #[arg(long)]
        id: i64,
    },

    /// Delete a record by id (refused while other records reference it)
    Delete {
        entity: EntityKind,

        #[arg(long)]
        id: i64,
    },

    /// Show row counts per table
    Stats,
}

#[derive(Subcommand)]
enum SchemaAction {
    /// Create any missing tables
    Create,
    /// Drop all tables
    Drop,
    /// List materialized tables
    Tables,
    /// Print the schema definition
    Show,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let loaded = config::load_config(Some(&config_path))
        .with_context(|| format!("reading {}", config_path.display()))?;
    let database = config::resolve_database_path(cli.database.as_deref(), loaded.as_ref(), &config_path);
    let format = cli.format;

    match cli.command {
        Commands::Init { force } => {
            let relative_db = Path::new(config::DATA_DIR).join("campus.db");
            let new_config = CampusConfig {
                database: Some(relative_db.to_string_lossy().to_string()),
            };
            config::write_config(&config_path, &new_config, force)?;

            let project_root = config_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            config::ensure_gitignore(project_root)?;

            let database = config::resolve_database_path(cli.database.as_deref(), Some(&new_config), &config_path);
            config::ensure_db_dir(&database)?;
            let store = SqliteStore::open(&database)?;
            store.create_schema()?;
            store.close()?;

            tracing::info!("initialized {}", database.display());
            if format == OutputFormat::Json {
                emit_json(&serde_json::json!({
                    "config": config_path,
                    "database": database,
                }))?;
            } else {
                ui::header("campus-store initialized");
                ui::info("Config", &config_path.display().to_string());
                ui::info("Database", &database.display().to_string());
            }
        }

        Commands::Schema { action } => {
            config::ensure_db_dir(&database)?;
            let store = SqliteStore::open(&database)?;
            match action {
                SchemaAction::Create => {
                    store.create_schema()?;
                    report_tables(&store, format, "Schema created")?;
                }
                SchemaAction::Drop => {
                    store.drop_schema()?;
                    if format == OutputFormat::Json {
                        emit_json(&serde_json::json!({ "dropped": true }))?;
                    } else {
                        ui::success("Schema dropped");
                    }
                }
                SchemaAction::Tables => report_tables(&store, format, "Materialized tables")?,
                SchemaAction::Show => {
                    if format == OutputFormat::Json {
                        emit_json(store.schema())?;
                    } else {
                        for def in store.schema().creation_order() {
                            ui::table_heading(def.table);
                            for field in def.fields {
                                ui::field_row(field);
                            }
                        }
                    }
                }
            }
            store.close()?;
        }

        Commands::Insert { entity, data } => {
            let store = open_with_schema(&database)?;
            let raw = if let Some(path) = data.strip_prefix('@') {
                std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?
            } else {
                data.clone()
            };
            let json: serde_json::Value = serde_json::from_str(&raw).context("parsing record JSON")?;
            let record = store.insert(Record::from_json(entity, json)?)?;

            tracing::info!("inserted {} #{}", entity, record.id().unwrap_or_default());
            emit_record(&record, format)?;
        }

        Commands::Find { entity, field, value, all } => {
            let store = open_with_schema(&database)?;
            let ty = store.schema().entity(entity)?.lookup_field(&field)?.ty;
            let value = Value::parse(ty, &value)?;

            if all {
                let records = store.find_all_by_field(entity, &field, &value)?;
                if format == OutputFormat::Json {
                    emit_json(&records)?;
                } else if records.is_empty() {
                    println!("{} No {} with {} = {}", Icons::EMPTY, entity, field, value);
                } else {
                    println!("{} {} match(es)", Icons::SEARCH, records.len());
                    for record in &records {
                        println!("{}", ui::record_table(record));
                    }
                }
            } else {
                match store.find_by_field(entity, &field, &value)? {
                    Some(record) => emit_record(&record, format)?,
                    None => emit_not_found(entity, &format!("{} = {}", field, value), format)?,
                }
            }
        }

        Commands::Get { entity, id } => {
            let store = open_with_schema(&database)?;
            match store.get(entity, id)? {
                Some(record) => emit_record(&record, format)?,
                None => emit_not_found(entity, &format!("id = {}", id), format)?,
            }
        }

        Commands::Delete { entity, id } => {
            let store = open_with_schema(&database)?;
            let deleted = store.delete(entity, id)?;
            if format == OutputFormat::Json {
                emit_json(&serde_json::json!({ "entity": entity, "id": id, "deleted": deleted }))?;
            } else if deleted {
                println!("{} Deleted {} #{}", Icons::DEL, entity, id);
            } else {
                ui::warn(&format!("No {} with id {}", entity, id));
            }
        }

        Commands::Stats => {
            let store = open_with_schema(&database)?;
            let stats = store.stats()?;

            if format == OutputFormat::Json {
                emit_json(&stats)?;
            } else {
                println!("{} campus-store Statistics ({})", Icons::STATS, database.display());
                println!("{}", ui::stats_table(&stats));
                ui::total_row(stats.total());
            }
        }
    }

    Ok(())
}

/// Open the database, creating the schema if it is missing
fn open_with_schema(database: &Path) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(database)?;
    let store = SqliteStore::open(database)
        .with_context(|| format!("opening {}", database.display()))?;
    store.create_schema()?;
    Ok(store)
}

fn report_tables(store: &SqliteStore, format: OutputFormat, title: &str) -> anyhow::Result<()> {
    let tables = store.list_tables()?;
    if format == OutputFormat::Json {
        return emit_json(&tables);
    }

    ui::success(title);
    if tables.is_empty() {
        println!("  {} none", Icons::EMPTY);
    }
    for table in tables {
        println!("  {} {}", Icons::TABLE, table);
    }
    Ok(())
}

fn emit_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn emit_record(record: &Record, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return emit_json(record);
    }
    println!("{} {}", Icons::DATABASE, record.label());
    println!("{}", ui::record_table(record));
    Ok(())
}

fn emit_not_found(entity: EntityKind, condition: &str, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return emit_json(&serde_json::Value::Null);
    }
    println!("{} No {} with {}", Icons::EMPTY, entity, condition);
    Ok(())
}
