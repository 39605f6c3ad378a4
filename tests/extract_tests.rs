//! End-to-end extraction of delimited files
//!
//! Tests the complete workflow: config file -> connector -> sink -> loader

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

use tabular_ingest::extract::{
    ExtractConfig, ExtractionPipeline, FileLoader, Loader, SourceConfig, TargetConfig,
};
use tabular_ingest::inference::{InferenceConfig, SemanticType};
use tabular_ingest::schema::{SourceColumn, SourceSchema};
use tabular_ingest::source::DelimitedOptions;

/// Helper to write a semicolon separated sales file
fn create_sales_file(dir: &TempDir, rows: usize) -> PathBuf {
    let path = dir.path().join("Monthly Sales.csv");
    let mut file = File::create(&path).expect("Failed to create test file");
    writeln!(file, "Sold On;Net Amount;Region;Order #").unwrap();
    for i in 0..rows {
        writeln!(
            file,
            "{:02}/{:02}/2009;\"{}.{:02} €\";{};{}",
            1 + i % 12,
            1 + i % 28,
            100 + i,
            i % 100,
            ["north", "south", "east"][i % 3],
            10_000 + i
        )
        .unwrap();
    }
    path
}

fn sales_config(path: PathBuf) -> ExtractConfig {
    ExtractConfig::new(SourceConfig::Delimited {
        path,
        has_header: true,
        options: DelimitedOptions::with_delimiter(';'),
    })
}

#[test]
fn test_extract_to_file_with_inferred_schema() {
    let dir = TempDir::new().unwrap();
    let sinks = TempDir::new().unwrap();
    let source = create_sales_file(&dir, 40);
    let destination = dir.path().join("staged.csv");

    let config = sales_config(source)
        .with_sink_dir(sinks.path())
        .with_target(TargetConfig::File {
            path: destination.clone(),
            header: true,
        });
    let mut pipeline = ExtractionPipeline::from_config(&config).unwrap();
    let mut loader = config.loader().unwrap().unwrap();
    let loaded = pipeline.extract_into(loader.as_mut()).unwrap();

    assert_eq!(loaded.stats.rows, 40);
    assert_eq!(loaded.schema.name(), "monthlysales");

    let names: Vec<&str> = loaded.schema.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["soldon", "netamount", "region", "order"]);
    assert_eq!(
        loaded.schema.types(),
        vec![
            SemanticType::Date,
            SemanticType::Fact,
            SemanticType::Attribute,
            SemanticType::Fact
        ]
    );
    assert_eq!(loaded.schema.columns()[0].format.as_deref(), Some("MM/dd/yyyy"));

    let staged = std::fs::read_to_string(&destination).unwrap();
    let mut lines = staged.lines();
    assert_eq!(lines.next(), Some("soldon,netamount,region,order"));
    assert_eq!(lines.next(), Some("01/01/2009,100.00 €,north,10000"));
    assert_eq!(staged.lines().count(), 41);

    assert_eq!(std::fs::read_dir(sinks.path()).unwrap().count(), 0);
}

#[test]
fn test_inference_only_samples_configured_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("late.csv");
    let mut content = String::from("value\n");
    for i in 0..20 {
        content.push_str(&format!("{i}\n"));
    }
    content.push_str("not a number\n");
    std::fs::write(&path, content).unwrap();

    let mut config = ExtractConfig::new(SourceConfig::Delimited {
        path,
        has_header: true,
        options: DelimitedOptions::default(),
    });
    config.inference = InferenceConfig::builder().sample_size(20).build();

    let extraction = ExtractionPipeline::from_config(&config)
        .unwrap()
        .extract()
        .unwrap();
    assert_eq!(extraction.stats.rows, 21);
    assert_eq!(extraction.schema.types(), vec![SemanticType::Fact]);
}

#[test]
fn test_schema_file_overrides_inference() {
    let dir = TempDir::new().unwrap();
    let source = create_sales_file(&dir, 5);
    let schema_path = dir.path().join("sales.schema.json");

    let custom = SourceSchema::new(
        "sales",
        vec![
            SourceColumn::new("sold_on", SemanticType::Date, "Sold On").with_format("MM/dd/yyyy"),
            SourceColumn::new("amount", SemanticType::Fact, "Net Amount"),
            SourceColumn::new("region", SemanticType::Attribute, "Region"),
            SourceColumn::new("order_no", SemanticType::Attribute, "Order #"),
        ],
    );
    custom.write_config(&schema_path).unwrap();

    let config = sales_config(source).with_schema_file(&schema_path);
    let extraction = ExtractionPipeline::from_config(&config)
        .unwrap()
        .extract()
        .unwrap();

    assert_eq!(extraction.schema, custom);
    assert_eq!(extraction.stats.rows, 5);
}

#[test]
fn test_save_schema_then_reuse_it() {
    let dir = TempDir::new().unwrap();
    let source = create_sales_file(&dir, 10);
    let schema_path = dir.path().join("sales.schema.yaml");

    let config = sales_config(source).with_name("sales");
    let saved = ExtractionPipeline::from_config(&config)
        .unwrap()
        .save_schema(&schema_path)
        .unwrap();
    assert_eq!(saved.name(), "sales");
    assert!(std::fs::read_to_string(&schema_path).unwrap().contains("ldmType: DATE"));

    let config = config.with_schema_file(&schema_path);
    let extraction = ExtractionPipeline::from_config(&config)
        .unwrap()
        .extract()
        .unwrap();
    assert_eq!(extraction.schema, saved);
}

#[test]
fn test_missing_schema_file_fails_before_connecting() {
    let dir = TempDir::new().unwrap();
    let source = create_sales_file(&dir, 3);
    let config = sales_config(source).with_schema_file(dir.path().join("absent.json"));

    let mut pipeline = ExtractionPipeline::from_config(&config).unwrap();
    assert!(pipeline.extract().is_err());
    assert_eq!(pipeline.transitions().len(), 2);
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let source = create_sales_file(&dir, 3);
    let destination = dir.path().join("out.csv");
    let config_path = dir.path().join("extract.toml");

    std::fs::write(
        &config_path,
        format!(
            r#"
name = "sales"

[source]
kind = "delimited"
path = "{}"

[source.options]
delimiter = ";"

[target]
kind = "file"
path = "{}"
header = false
"#,
            source.display(),
            destination.display()
        ),
    )
    .unwrap();

    let config = ExtractConfig::from_file(&config_path).unwrap();
    let mut pipeline = ExtractionPipeline::from_config(&config).unwrap();
    let mut loader = config.loader().unwrap().unwrap();
    pipeline.extract_into(loader.as_mut()).unwrap();

    assert_eq!(std::fs::read_to_string(&destination).unwrap().lines().count(), 3);
}

#[test]
fn test_file_loader_directly() {
    let dir = TempDir::new().unwrap();
    let source = create_sales_file(&dir, 2);
    let destination = dir.path().join("direct.csv");

    let extraction = ExtractionPipeline::from_config(&sales_config(source))
        .unwrap()
        .extract()
        .unwrap();
    let mut loader = FileLoader::new(&destination).with_header(false);
    let report = loader.load(&extraction.sink, &extraction.schema).unwrap();
    assert_eq!(report.rows, 2);
}

#[test]
fn test_save_schema_reads_only_the_sample() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("large.csv");
    let mut content = b"amount\n".to_vec();
    for i in 0..1500 {
        content.extend_from_slice(format!("{i}\n").as_bytes());
    }
    // Undecodable trailing record, past the default sample of 1000 rows
    content.extend_from_slice(b"\xff\xfe\n");
    std::fs::write(&path, content).unwrap();

    let config = ExtractConfig::new(SourceConfig::Delimited {
        path,
        has_header: true,
        options: DelimitedOptions::default(),
    });
    let schema = ExtractionPipeline::from_config(&config)
        .unwrap()
        .save_schema(&dir.path().join("large.schema.json"))
        .unwrap();
    assert_eq!(schema.types(), vec![SemanticType::Fact]);

    // A full extraction still reads every row
    assert!(ExtractionPipeline::from_config(&config).unwrap().extract().is_err());
}
