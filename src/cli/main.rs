//! Tabular Ingest CLI
//!
//! ## Usage
//!
//! ```bash
//! # Print the inferred column types of a CSV file
//! tabular-ingest guess data/sales.csv
//!
//! # Write a schema config file for a configured source
//! tabular-ingest schema --config extract.toml --output sales.schema.json
//!
//! # Extract into a file, or into a DuckDB staging table
//! tabular-ingest extract --file data/sales.csv --output staged/sales.csv
//! tabular-ingest extract --config extract.toml --staging-db staging.duckdb
//! ```

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commands::{ExtractArgs, GuessArgs, SchemaArgs, SourceArgs};

#[derive(Parser)]
#[command(name = "tabular-ingest")]
#[command(author, version, about = "Extract tabular data and infer its column types")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Args)]
struct SourceOpts {
    /// Extraction config file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Delimited file to read instead of a config
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Field delimiter for --file
    #[arg(short, long, default_value = ",")]
    delimiter: char,

    /// --file has no header row
    #[arg(long)]
    no_header: bool,

    /// Schema name
    #[arg(long)]
    name: Option<String>,
}

impl From<SourceOpts> for SourceArgs {
    fn from(opts: SourceOpts) -> Self {
        SourceArgs {
            config: opts.config,
            file: opts.file,
            delimiter: opts.delimiter,
            no_header: opts.no_header,
            name: opts.name,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the inferred schema of a delimited file
    Guess {
        /// Delimited file
        path: PathBuf,

        /// Field delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// The file has no header row
        #[arg(long)]
        no_header: bool,

        /// Data rows to sample (0 = all)
        #[arg(long, default_value = "1000")]
        sample_size: usize,

        /// Output format (table, json, yaml)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Write the schema config file of a source
    Schema {
        #[command(flatten)]
        source: SourceOpts,

        /// Schema file to write (.json, .yaml or .yml)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract a source into a file or a staging database
    Extract {
        #[command(flatten)]
        source: SourceOpts,

        /// Delimited output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not write a header row to --output
        #[arg(long)]
        no_output_header: bool,

        /// DuckDB staging database to load into
        #[arg(long)]
        staging_db: Option<String>,

        /// Staging table (defaults to the schema name)
        #[arg(long)]
        table: Option<String>,

        /// Schema file replacing declared or inferred types
        #[arg(long)]
        schema_file: Option<PathBuf>,

        /// Directory for the temporary sink file
        #[arg(long)]
        sink_dir: Option<PathBuf>,

        /// Also write the resolved schema to this file
        #[arg(long)]
        schema_output: Option<PathBuf>,
    },
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{level}'"))?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install log subscriber")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let result = match cli.command {
        Commands::Guess {
            path,
            delimiter,
            no_header,
            sample_size,
            format,
        } => commands::handle_guess(&GuessArgs {
            path,
            delimiter,
            no_header,
            sample_size,
            format,
        }),
        Commands::Schema { source, output } => commands::handle_schema(&SchemaArgs {
            source: source.into(),
            output,
        }),
        Commands::Extract {
            source,
            output,
            no_output_header,
            staging_db,
            table,
            schema_file,
            sink_dir,
            schema_output,
        } => commands::handle_extract(&ExtractArgs {
            source: source.into(),
            output,
            no_output_header,
            staging_db,
            table,
            schema_file,
            sink_dir,
            schema_output,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}
