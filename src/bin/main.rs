//! statline CLI - Compile and run table states
//!
//! Usage:
//!   statline compile <state.json> [--dialect <dialect>] [--output <format>]
//!   statline run <state.json> [--db <league.db>]
//!   statline validate <state.json>
//!   statline columns [--kind <kind>]
//!
//! Examples:
//!   statline compile states/rushing_leaders.json --dialect sqlite
//!   statline run states/rushing_leaders.json --db ./data/league.db
//!   statline columns --kind fact

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use statline::compile::{compile_json, CompileOptions};
use statline::config::Settings;
use statline::engine::Engine;
use statline::registry::{registry, ColumnDefinition};
use statline::sql::Dialect;
use statline::storage::SqliteStorage;
use statline::table_state;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "statline")]
#[command(about = "statline - Compile player table states to SQL")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to STATLINE_CONFIG, ./statline.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a table state to SQL
    Compile {
        /// Path to the table-state JSON file
        file: PathBuf,

        /// SQL dialect to generate (defaults to the configured dialect)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Execute a table state against a SQLite database
    Run {
        /// Path to the table-state JSON file
        file: PathBuf,

        /// Database file (defaults to the configured storage path)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Validate a table state without compiling it
    Validate {
        /// Path to the table-state JSON file
        file: PathBuf,
    },

    /// List registered column identifiers
    Columns {
        /// Only list columns of this kind
        #[arg(short, long)]
        kind: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Sqlite,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Sqlite => Dialect::Sqlite,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with a header describing the result columns
    Verbose,
    /// Output an outline of the query plan as JSON
    Plan,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Compile {
            file,
            dialect,
            output,
        } => cmd_compile(&settings, file, dialect, output),
        Commands::Run { file, db } => cmd_run(&settings, file, db).await,
        Commands::Validate { file } => cmd_validate(&settings, file),
        Commands::Columns { kind } => cmd_columns(kind),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, ExitCode> {
    let loaded = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    loaded.map_err(|e| {
        eprintln!("Configuration error: {}", e);
        ExitCode::FAILURE
    })
}

fn read_state(file: &Path) -> Result<Value, ExitCode> {
    let source = fs::read_to_string(file).map_err(|e| {
        eprintln!("Error reading file '{}': {}", file.display(), e);
        ExitCode::FAILURE
    })?;
    serde_json::from_str(&source).map_err(|e| {
        eprintln!("Error parsing '{}': {}", file.display(), e);
        ExitCode::FAILURE
    })
}

fn cmd_compile(
    settings: &Settings,
    file: PathBuf,
    dialect: Option<DialectArg>,
    output: OutputFormat,
) -> ExitCode {
    let raw = match read_state(&file) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let mut options = CompileOptions::from_settings(settings);
    if let Some(dialect) = dialect {
        options = options.with_dialect(dialect.into());
    }

    match compile_json(&raw, &options) {
        Ok(compiled) => {
            match output {
                OutputFormat::Sql => {
                    println!("{}", compiled.sql);
                }
                OutputFormat::Verbose => {
                    println!("-- statline compiled SQL");
                    println!("-- Source: {}", file.display());
                    println!("-- Dialect: {}", compiled.dialect);
                    println!("-- Columns: {}", compiled.plan.output_names().join(", "));
                    println!();
                    println!("{}", compiled.sql);
                }
                OutputFormat::Plan => {
                    match serde_json::to_string_pretty(&compiled.plan.summary()) {
                        Ok(json) => println!("{}", json),
                        Err(e) => {
                            eprintln!("Error serializing plan: {}", e);
                            return ExitCode::FAILURE;
                        }
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_run(settings: &Settings, file: PathBuf, db: Option<PathBuf>) -> ExitCode {
    let raw = match read_state(&file) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let path = match db.map(Ok).unwrap_or_else(|| settings.storage.resolved_path()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Configuration error: {} (pass --db)", e);
            return ExitCode::FAILURE;
        }
    };
    let storage = match SqliteStorage::open(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error opening '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let engine = Engine::from_settings(storage, settings);
    match engine.execute(&raw).await {
        Ok(output) => match serde_json::to_string_pretty(&output.rows) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error serializing rows: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(settings: &Settings, file: PathBuf) -> ExitCode {
    let raw = match read_state(&file) {
        Ok(v) => v,
        Err(code) => return code,
    };

    match table_state::validate(&raw, &settings.query.limits()) {
        Ok(state) => {
            println!(
                "OK: {} is valid ({} columns, {} filters)",
                file.display(),
                state.prefix_columns.len() + state.columns.len(),
                state.filters.len()
            );
            ExitCode::SUCCESS
        }
        Err(errors) => {
            eprintln!("Validation errors:");
            for error in errors.iter() {
                eprintln!("  {}", error);
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_columns(kind: Option<String>) -> ExitCode {
    let mut columns: Vec<&ColumnDefinition> = registry()
        .iter()
        .filter(|c| kind.as_deref().map_or(true, |k| c.kind.name() == k))
        .collect();
    columns.sort_by_key(|c| c.id);

    if columns.is_empty() {
        println!("No columns registered.");
        return ExitCode::SUCCESS;
    }

    for column in columns {
        let splits: Vec<&str> = column.supported_splits().iter().map(|d| d.as_str()).collect();
        let rates: Vec<&str> = column.rate_types.iter().map(|r| r.as_str()).collect();
        println!(
            "  - {} ({}) [{}, {}] splits: {} rates: {}",
            column.id,
            column.label,
            column.kind.name(),
            column.data_type,
            if splits.is_empty() { "-".to_string() } else { splits.join(",") },
            if rates.is_empty() { "-".to_string() } else { rates.join(",") },
        );
    }

    ExitCode::SUCCESS
}
