//! Output formatting for CLI

use tabular_ingest::SourceSchema;
use tabular_ingest::extract::{ExtractStats, LoadReport};

use crate::error::CliError;

/// Render a schema as `table`, `json` or `yaml`
pub fn format_schema(schema: &SourceSchema, format: &str) -> Result<String, CliError> {
    match format {
        "json" => serde_json::to_string_pretty(schema).map_err(|e| CliError::Output(e.to_string())),
        "yaml" => serde_yaml::to_string(schema).map_err(|e| CliError::Output(e.to_string())),
        "table" => Ok(format_schema_table(schema)),
        other => Err(CliError::InvalidArgument(format!(
            "Unknown output format: {other} (expected table, json or yaml)"
        ))),
    }
}

/// Aligned text table of a schema's columns
pub fn format_schema_table(schema: &SourceSchema) -> String {
    let name_width = schema
        .columns()
        .iter()
        .map(|c| c.name.len())
        .chain(std::iter::once("NAME".len()))
        .max()
        .unwrap_or(4);

    let mut output = format!("Schema: {}\n\n", schema.name());
    output.push_str(&format!(
        "{:<name_width$}  {:<9}  TITLE\n",
        "NAME", "TYPE"
    ));
    for column in schema.columns() {
        let ty = match &column.format {
            Some(format) => format!("{} ({format})", column.ldm_type),
            None => column.ldm_type.to_string(),
        };
        output.push_str(&format!(
            "{:<name_width$}  {:<9}  {}\n",
            column.name, ty, column.title
        ));
    }
    output
}

/// Summary printed after an extraction
pub fn format_extract_summary(stats: &ExtractStats, report: Option<&LoadReport>) -> String {
    let mut output = String::new();
    output.push_str(&format!("Run:      {}\n", stats.run_id));
    output.push_str(&format!("Started:  {}\n", stats.started_at.to_rfc3339()));
    output.push_str(&format!("Rows:     {}\n", stats.rows));
    output.push_str(&format!("Bytes:    {}\n", stats.bytes));
    output.push_str(&format!("Duration: {}ms\n", stats.duration_ms));
    if let Some(report) = report {
        output.push_str(&format!("Loaded:   {} rows into {}\n", report.rows, report.target));
    }
    output
}
