//! dalkit CLI
//!
//! Assembles a query from flags, prints the SQL and optionally runs it
//! against a SQLite database. Also shows how values are encoded for the cache.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use dalkit::codec;
use dalkit::sql::{QueryBuilder, Row};
use dalkit::{Config, Mode, SqliteDatabase};
use tracing_subscriber::{fmt, EnvFilter};

/// dalkit CLI
#[derive(Parser, Debug)]
#[command(name = "dalkit-cli")]
#[command(about = "Query builder and cache codec tooling")]
#[command(version)]
struct Args {
    /// Run mode (dev, test, produce)
    #[arg(short, long, default_value = "dev")]
    mode: Mode,

    /// Directory holding {mode}.yaml config files
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assemble (and optionally run) a SELECT
    Query {
        /// Table to select from (aliased as `a`)
        #[arg(short, long)]
        table: String,

        /// Field list
        #[arg(short, long, default_value = "*")]
        fields: String,

        /// Join clause, repeatable
        #[arg(short, long)]
        join: Vec<String>,

        /// Raw predicate, repeatable; ANDed in order
        #[arg(short = 'w', long = "where")]
        predicates: Vec<String>,

        #[arg(long)]
        group_by: Option<String>,

        #[arg(long)]
        order_by: Option<String>,

        /// Page number (starting at 1)
        #[arg(short, long)]
        page: Option<i64>,

        #[arg(long, default_value = "10")]
        page_size: u64,

        /// Also fetch the total row count
        #[arg(long)]
        count: bool,

        /// Run against the configured database instead of only printing
        #[arg(short, long)]
        execute: bool,

        /// SQLite file, overriding the configured path
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Print the stored representation of a value
    Encode {
        value: String,

        /// Treat the value as JSON and store it structured
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.mode.default_log_filter()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("dalkit-cli v{} ({} mode)", dalkit::VERSION, args.mode);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> dalkit::Result<()> {
    let config = match &args.config_dir {
        Some(dir) => Config::for_mode(dir, args.mode)?,
        None => Config::builder().mode(args.mode).build(),
    };

    match args.command {
        Commands::Query {
            table,
            fields,
            join,
            predicates,
            group_by,
            order_by,
            page,
            page_size,
            count,
            execute,
            db,
        } => {
            let mut query = QueryBuilder::new(table).fields(fields);
            for clause in join {
                query = query.join(clause);
            }
            for predicate in predicates {
                query = query.filter_raw(predicate);
            }
            if let Some(group_by) = group_by {
                query = query.group_by(group_by);
            }
            if let Some(order_by) = order_by {
                query = query.order_by(order_by);
            }
            if let Some(page) = page {
                query = query.page(page, page_size);
            }

            if count {
                println!("{}", query.build_with_count(config.database.dialect));
            } else {
                println!("{}", query.build());
            }

            if !execute {
                return Ok(());
            }

            let mut db_config = config.database.clone();
            if let Some(path) = db {
                db_config.path = path;
            }
            let database = SqliteDatabase::from_config(&db_config)?;

            let rows: Vec<Row> = if count {
                let (rows, total) = query.get_with_count(&database)?;
                println!("total: {}", total);
                rows
            } else {
                query.get(&database)?
            };
            for row in rows {
                println!("{}", serde_json::Value::Object(row));
            }
        }

        Commands::Encode { value, json } => {
            let encoded = if json {
                let parsed: serde_json::Value = serde_json::from_str(&value)?;
                codec::encode(&parsed)?
            } else {
                codec::encode(value.as_str())?
            };
            println!("{}", encoded);
        }
    }

    Ok(())
}
