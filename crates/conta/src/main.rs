use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use conta::config::GeneratorConfig;
use conta::db;
use conta::error::ContaError;
use conta::generator::PrefixedIdGenerator;
use conta::optimizer::OptimizerKind;
use conta::output::{self, OutputMode};

#[derive(Parser)]
#[command(name = "ct", about = "Prefixed sequence ids from an SQLite counter table")]
struct Cli {
    #[arg(long, env = "CONTA_DB", default_value = "conta.db", global = true)]
    db: PathBuf,

    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    #[arg(long, global = true)]
    table: Option<String>,

    #[arg(long, global = true)]
    segment_column: Option<String>,

    #[arg(long, global = true)]
    value_column: Option<String>,

    #[arg(long, global = true)]
    segment_length: Option<usize>,

    #[arg(long, global = true)]
    initial: Option<i64>,

    #[arg(long, global = true)]
    increment: Option<i64>,

    #[arg(long, global = true)]
    optimizer: Option<OptimizerKind>,

    #[arg(long, global = true)]
    number_format: Option<String>,

    #[arg(long, global = true)]
    discriminator: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the counter table if it does not exist
    Init,
    /// Allocate the next identifier(s) for a grouping prefix
    Next {
        prefix: String,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
        /// Print raw counter values instead of rendered identifiers
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// Show the stored counter value for a prefix without advancing it
    Current { prefix: String },
    /// List all counter rows
    List,
}

fn build_config(cli: &Cli) -> GeneratorConfig {
    let mut config = GeneratorConfig::default();
    if let Some(table) = &cli.table {
        config = config.table(table);
    }
    if let Some(column) = &cli.segment_column {
        config = config.segment_column(column);
    }
    if let Some(column) = &cli.value_column {
        config = config.value_column(column);
    }
    if let Some(length) = cli.segment_length {
        config = config.segment_length(length);
    }
    if let Some(initial) = cli.initial {
        config = config.initial_value(initial);
    }
    if let Some(increment) = cli.increment {
        config = config.increment_size(increment);
    }
    if let Some(kind) = cli.optimizer {
        config = config.optimizer(kind);
    }
    if let Some(spec) = &cli.number_format {
        config = config.number_format(spec);
    }
    if let Some(discriminator) = &cli.discriminator {
        config = config.discriminator(discriminator);
    }
    config
}

fn open_db(path: &PathBuf, config: &GeneratorConfig) -> Result<Connection, ContaError> {
    let conn = Connection::open(path)
        .map_err(|e| ContaError::Storage(format!("failed to open database: {e}")))?;
    conn.pragma_update(None, "busy_timeout", 5000)
        .map_err(|e| ContaError::Storage(format!("failed to set busy_timeout: {e}")))?;
    db::ensure_table(&conn, config)?;
    Ok(conn)
}

fn fail(err: ContaError, mode: OutputMode) -> ! {
    output::print_error(&err, mode);
    process::exit(1);
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let config = build_config(&cli);

    match &cli.command {
        Commands::Init => {
            if let Err(e) = open_db(&cli.db, &config) {
                fail(e, mode);
            }
            match mode {
                OutputMode::Json => {
                    output::print_json(&serde_json::json!({ "status": "ready" }));
                }
                OutputMode::Human => println!("counter table ready"),
            }
        }

        Commands::Next { prefix, count, raw } => {
            let conn = match open_db(&cli.db, &config) {
                Ok(c) => c,
                Err(e) => fail(e, mode),
            };
            let generator = match PrefixedIdGenerator::new(config) {
                Ok(g) => g,
                Err(e) => fail(e, mode),
            };

            if *raw {
                let mut values = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    match generator.next_raw(&conn, prefix) {
                        Ok(v) => values.push(v),
                        Err(e) => fail(e, mode),
                    }
                }
                output::print_raw_values(&values, mode);
            } else {
                let mut ids = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    match generator.generate(&conn, prefix) {
                        Ok(id) => ids.push(id),
                        Err(e) => fail(e, mode),
                    }
                }
                output::print_ids(&ids, mode);
            }
        }

        Commands::Current { prefix } => {
            let conn = match open_db(&cli.db, &config) {
                Ok(c) => c,
                Err(e) => fail(e, mode),
            };
            let segment = format!("{}{}", config.discriminator, prefix);
            match db::current_value(&conn, &config, &segment) {
                Ok(value) => output::print_current(&segment, value, mode),
                Err(e) => fail(e, mode),
            }
        }

        Commands::List => {
            let conn = match open_db(&cli.db, &config) {
                Ok(c) => c,
                Err(e) => fail(e, mode),
            };
            match db::list_segments(&conn, &config) {
                Ok(rows) => output::print_segment_list(&rows, mode),
                Err(e) => fail(e, mode),
            }
        }
    }
}
