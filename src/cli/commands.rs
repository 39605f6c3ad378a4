//! CLI command implementations

use std::path::PathBuf;

use tabular_ingest::extract::{ExtractConfig, ExtractionPipeline, SourceConfig, TargetConfig};
use tabular_ingest::{ColumnTypeInferencer, DelimitedOptions, InferenceConfig};
use tracing::debug;

use crate::error::CliError;
use crate::output::{format_extract_summary, format_schema};

/// Where a command reads its source from
pub struct SourceArgs {
    /// Extraction config file (TOML, JSON or YAML)
    pub config: Option<PathBuf>,
    /// Delimited file, used when no config is given
    pub file: Option<PathBuf>,
    /// Field delimiter for `file`
    pub delimiter: char,
    /// `file` has no header row
    pub no_header: bool,
    /// Schema name override
    pub name: Option<String>,
}

impl SourceArgs {
    fn load_config(&self) -> Result<ExtractConfig, CliError> {
        let mut config = match (&self.config, &self.file) {
            (Some(path), None) => ExtractConfig::from_file(path)?,
            (None, Some(file)) => ExtractConfig::new(SourceConfig::Delimited {
                path: file.clone(),
                has_header: !self.no_header,
                options: DelimitedOptions::with_delimiter(self.delimiter),
            }),
            (Some(_), Some(_)) => {
                return Err(CliError::InvalidArgument(
                    "Use either --config or --file, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(CliError::InvalidArgument(
                    "A source is required: pass --config or --file".to_string(),
                ));
            }
        };
        if let Some(name) = &self.name {
            config = config.with_name(name.clone());
        }
        Ok(config)
    }
}

/// Arguments for the `guess` command
pub struct GuessArgs {
    /// Delimited file to sample
    pub path: PathBuf,
    /// Field delimiter
    pub delimiter: char,
    /// The file has no header row
    pub no_header: bool,
    /// Data rows to sample (0 = all)
    pub sample_size: usize,
    /// Output format (table, json, yaml)
    pub format: String,
}

/// Arguments for the `schema` command
pub struct SchemaArgs {
    pub source: SourceArgs,
    /// Schema file to write (.json, .yaml or .yml)
    pub output: PathBuf,
}

/// Arguments for the `extract` command
pub struct ExtractArgs {
    pub source: SourceArgs,
    /// Write rows to this delimited file
    pub output: Option<PathBuf>,
    /// Omit the header row in `output`
    pub no_output_header: bool,
    /// Load rows into this DuckDB staging database
    pub staging_db: Option<String>,
    /// Staging table name
    pub table: Option<String>,
    /// Schema file replacing declared or inferred types
    pub schema_file: Option<PathBuf>,
    /// Directory for the temporary sink
    pub sink_dir: Option<PathBuf>,
    /// Also write the resolved schema here
    pub schema_output: Option<PathBuf>,
}

/// Handle the `guess` command
pub fn handle_guess(args: &GuessArgs) -> Result<(), CliError> {
    let options = DelimitedOptions::with_delimiter(args.delimiter);
    options.validate().map_err(CliError::InvalidArgument)?;

    let config = InferenceConfig::builder()
        .sample_size(args.sample_size)
        .build();
    let inferencer = ColumnTypeInferencer::with_config(config);

    eprintln!("Sampling {}...", args.path.display());
    let schema = inferencer.guess_delimited_file(&args.path, options, !args.no_header)?;

    println!("{}", format_schema(&schema, &args.format)?);
    Ok(())
}

/// Handle the `schema` command
pub fn handle_schema(args: &SchemaArgs) -> Result<(), CliError> {
    let config = args.source.load_config()?;
    let mut pipeline = ExtractionPipeline::from_config(&config)?;

    let schema = pipeline.save_schema(&args.output)?;
    eprintln!(
        "Wrote schema '{}' ({} columns) to {}",
        schema.name(),
        schema.columns().len(),
        args.output.display()
    );
    Ok(())
}

/// Handle the `extract` command
pub fn handle_extract(args: &ExtractArgs) -> Result<(), CliError> {
    let mut config = args.source.load_config()?;

    if let Some(path) = &args.schema_file {
        config = config.with_schema_file(path.clone());
    }
    if let Some(dir) = &args.sink_dir {
        config = config.with_sink_dir(dir.clone());
    }
    match (&args.output, &args.staging_db) {
        (Some(_), Some(_)) => {
            return Err(CliError::InvalidArgument(
                "Use either --output or --staging-db, not both".to_string(),
            ));
        }
        (Some(path), None) => {
            config = config.with_target(TargetConfig::File {
                path: path.clone(),
                header: !args.no_output_header,
            });
        }
        (None, Some(database)) => {
            let table = args.table.clone().unwrap_or_else(|| config.schema_name());
            config = config.with_target(TargetConfig::Staging {
                database: database.clone(),
                table,
            });
        }
        (None, None) => {}
    }
    config.validate().map_err(CliError::InvalidArgument)?;
    debug!(source = config.source.kind(), "Resolved extraction config");

    let mut pipeline = ExtractionPipeline::from_config(&config)?;
    let loader = config.loader()?;

    let (schema, summary) = match loader {
        Some(mut loader) => {
            let loaded = pipeline.extract_into(loader.as_mut())?;
            let summary = format_extract_summary(&loaded.stats, Some(&loaded.report));
            (loaded.schema, summary)
        }
        None => {
            let extraction = pipeline.extract()?;
            eprintln!("No target configured; extracted rows are discarded.");
            let summary = format_extract_summary(&extraction.stats, None);
            (extraction.schema, summary)
        }
    };

    if let Some(path) = &args.schema_output {
        schema.write_config(path)?;
        eprintln!("Wrote schema to {}", path.display());
    }

    eprint!("{summary}");
    println!("{}", format_schema(&schema, "table")?);
    Ok(())
}
