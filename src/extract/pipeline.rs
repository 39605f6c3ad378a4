//! Extraction pipeline with guaranteed cleanup

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::config::ExtractConfig;
use super::connector::{Connector, RowVisitor, Session};
use super::error::{ExtractError, ExtractResult};
use super::loader::{LoadReport, Loader};
use super::sink::{MaterializedSink, RowSink};
use super::state::{ExtractState, StateTracker};
use crate::inference::{ColumnTypeInferencer, InferenceConfig};
use crate::schema::SourceSchema;
use crate::source::{DelimitedOptions, MemorySource, Row, SourceError, TabularSource};

/// Statistics of one extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Unique id of the run
    pub run_id: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Rows written to the sink
    pub rows: u64,
    /// Sink size in bytes
    pub bytes: u64,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

/// A successful extraction: closed sink, schema and statistics
#[derive(Debug)]
pub struct Extraction {
    pub sink: MaterializedSink,
    pub schema: SourceSchema,
    pub stats: ExtractStats,
}

/// A successful extraction handed to a loader
#[derive(Debug)]
pub struct Loaded {
    pub schema: SourceSchema,
    pub stats: ExtractStats,
    pub report: LoadReport,
}

/// Streams one source into a sink and resolves its schema
///
/// Every pass acquires a session, runs, and then closes the session on
/// every exit path. When both the pass and the release fail, the pass's
/// error is returned and the release error is logged.
pub struct ExtractionPipeline {
    connector: Box<dyn Connector>,
    name: String,
    inference: InferenceConfig,
    sink_dir: Option<PathBuf>,
    sink_options: DelimitedOptions,
    schema_file: Option<PathBuf>,
    transitions: Vec<ExtractState>,
}

impl ExtractionPipeline {
    /// Pipeline producing a schema called `name`
    pub fn new(connector: Box<dyn Connector>, name: impl Into<String>) -> Self {
        Self {
            connector,
            name: name.into(),
            inference: InferenceConfig::default(),
            sink_dir: None,
            sink_options: DelimitedOptions::default(),
            schema_file: None,
            transitions: vec![ExtractState::Idle],
        }
    }

    /// Build a pipeline from configuration
    pub fn from_config(config: &ExtractConfig) -> ExtractResult<Self> {
        config.validate().map_err(ExtractError::Config)?;
        let connector = config
            .connector()
            .map_err(|e| ExtractError::Config(e.to_string()))?;

        let mut pipeline =
            Self::new(connector, config.schema_name()).with_inference(config.inference.clone());
        pipeline.sink_dir = config.sink_dir.clone();
        pipeline.schema_file = config.schema_file.clone();
        Ok(pipeline)
    }

    /// Inference settings for untyped sources
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    /// Directory for sink files
    pub fn with_sink_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sink_dir = Some(dir.into());
        self
    }

    /// Dialect of the sink file
    pub fn with_sink_options(mut self, options: DelimitedOptions) -> Self {
        self.sink_options = options;
        self
    }

    /// Use the schema in `path` instead of declared or inferred types
    pub fn with_schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file = Some(path.into());
        self
    }

    /// Schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// States of the most recent pass, starting at `Idle`
    pub fn transitions(&self) -> &[ExtractState] {
        &self.transitions
    }

    /// Stream the whole source into a sink
    ///
    /// A failed extraction leaves no sink behind.
    pub fn extract(&mut self) -> ExtractResult<Extraction> {
        let run_id = Uuid::new_v4().to_string();
        let _span = info_span!(
            "extract",
            run_id = %run_id,
            source = self.connector.name(),
            name = %self.name
        )
        .entered();

        let started_at = Utc::now();
        let start = Instant::now();
        info!(run_id = %run_id, source = self.connector.name(), "Starting extraction");

        let schema_override = match &self.schema_file {
            Some(path) => match SourceSchema::read_config(path) {
                Ok(schema) => Some(schema),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Cannot read schema file");
                    self.transitions = vec![ExtractState::Idle, ExtractState::Failed];
                    return Err(e.into());
                }
            },
            None => None,
        };

        let (sink, schema) = self.with_session(|pipeline, session, tracker| {
            let declared = session.describe()?;
            let streamed = pipeline.stream_to_sink(session, tracker)?;
            let schema = match schema_override {
                Some(schema) => {
                    if let Some(width) = streamed.width
                        && width != schema.columns().len()
                    {
                        warn!(
                            schema_columns = schema.columns().len(),
                            source_columns = width,
                            "Schema file does not match source width"
                        );
                    }
                    schema
                }
                None => match declared {
                    Some(schema) => schema.with_name(pipeline.name.clone()),
                    None => pipeline.infer_from_sink(&streamed.sink, streamed.header)?,
                },
            };
            Ok((streamed.sink, schema))
        })?;

        let stats = ExtractStats {
            run_id,
            started_at,
            rows: sink.rows(),
            bytes: sink.bytes(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            rows = stats.rows,
            bytes = stats.bytes,
            columns = schema.columns().len(),
            duration_ms = stats.duration_ms,
            "Extraction completed"
        );

        Ok(Extraction {
            sink,
            schema,
            stats,
        })
    }

    /// Extract, then hand the sink and schema to `loader`
    ///
    /// The loader is only called after a successful extraction. The sink is
    /// deleted once the loader returns.
    pub fn extract_into(&mut self, loader: &mut dyn Loader) -> ExtractResult<Loaded> {
        let Extraction {
            sink,
            schema,
            stats,
        } = self.extract()?;
        let _span = info_span!("load", loader = loader.name()).entered();
        let report = loader.load(&sink, &schema)?;
        drop(sink);
        info!(
            target = %report.target,
            rows = report.rows,
            run_id = %stats.run_id,
            "Load completed"
        );
        Ok(Loaded {
            schema,
            stats,
            report,
        })
    }

    /// Write the source's schema as a config file
    ///
    /// Declared types are used when the source has them; otherwise a
    /// bounded sample of rows is inferred.
    pub fn save_schema(&mut self, path: &Path) -> ExtractResult<SourceSchema> {
        let _span = info_span!("save_schema", source = self.connector.name()).entered();

        let schema = self.with_session(|pipeline, session, tracker| {
            if let Some(schema) = session.describe()? {
                return Ok(schema.with_name(pipeline.name.clone()));
            }

            let mut sample = SampleCollector::new(&pipeline.inference, tracker);
            let visited = session.stream(&mut sample)?;
            debug!(rows = visited, "Sample collected");
            let rows = sample.rows;
            let header = session.column_names().map(<[String]>::to_vec);
            pipeline
                .infer(MemorySource::new(rows), header)
                .map_err(|e| ExtractError::stream_with("inferring sampled rows", e))
        })?;

        schema.write_config(path)?;
        info!(path = %path.display(), columns = schema.columns().len(), "Schema written");
        Ok(schema)
    }

    /// Run `body` against a fresh session and release it afterwards
    fn with_session<T>(
        &mut self,
        body: impl FnOnce(&Self, &mut dyn Session, &mut StateTracker) -> ExtractResult<T>,
    ) -> ExtractResult<T> {
        let mut tracker = StateTracker::new();

        let mut session = match self.connector.connect() {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Connection failed");
                tracker.advance(ExtractState::Failed);
                self.transitions = tracker.into_history();
                return Err(e);
            }
        };
        tracker.advance(ExtractState::Connected);
        tracker.advance(ExtractState::Executing);

        let primary = body(self, session.as_mut(), &mut tracker);

        tracker.advance(ExtractState::Cleanup);
        let released = session.close();
        let result = settle(primary, released);

        match &result {
            Ok(_) => tracker.advance(ExtractState::Completed),
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "Extraction failed");
                tracker.advance(ExtractState::Failed);
            }
        }
        self.transitions = tracker.into_history();
        result
    }

    fn stream_to_sink(
        &self,
        session: &mut dyn Session,
        tracker: &mut StateTracker,
    ) -> ExtractResult<StreamedRows> {
        let sink = RowSink::create(self.sink_dir.as_deref(), self.sink_options)?;
        debug!(path = %sink.path().display(), "Sink opened");

        let mut visitor = SinkVisitor {
            sink,
            tracker,
            width: None,
        };
        let rows = session.stream(&mut visitor)?;
        let SinkVisitor { sink, width, .. } = visitor;
        debug!(rows, "Source exhausted");

        Ok(StreamedRows {
            sink: sink.finish()?,
            header: session.column_names().map(<[String]>::to_vec),
            width,
        })
    }

    fn infer_from_sink(
        &self,
        sink: &MaterializedSink,
        header: Option<Row>,
    ) -> ExtractResult<SourceSchema> {
        let rows = sink.open()?;
        self.infer(rows, header)
            .map_err(|e| ExtractError::stream_with("inferring sink rows", e))
    }

    fn infer<S: TabularSource>(
        &self,
        rows: S,
        header: Option<Row>,
    ) -> Result<SourceSchema, SourceError> {
        let has_header = header.is_some();
        let source = HeaderThen { header, rows };
        ColumnTypeInferencer::with_config(self.inference.clone()).guess_source_schema(
            &self.name,
            source,
            has_header,
        )
    }
}

/// Combine the outcome of a pass with the outcome of releasing its handles
///
/// The pass's error always wins; a release error is only returned when the
/// pass itself succeeded.
pub fn settle<T>(primary: ExtractResult<T>, released: ExtractResult<()>) -> ExtractResult<T> {
    match (primary, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_error)) => Err(release_error),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_error)) => {
            warn!(error = %release_error, "Release failed after an earlier error");
            Err(e)
        }
    }
}

struct StreamedRows {
    sink: MaterializedSink,
    header: Option<Row>,
    width: Option<usize>,
}

struct SinkVisitor<'a> {
    sink: RowSink,
    tracker: &'a mut StateTracker,
    width: Option<usize>,
}

impl RowVisitor for SinkVisitor<'_> {
    fn cursor_opened(&mut self) {
        self.tracker.advance(ExtractState::Streaming);
    }

    fn visit(&mut self, row: &[String]) -> ExtractResult<()> {
        self.width.get_or_insert(row.len());
        self.sink.write_row(row)
    }
}

/// Keeps the first rows of a stream, up to the inference sample size
struct SampleCollector<'a> {
    rows: Vec<Row>,
    limit: usize,
    tracker: &'a mut StateTracker,
}

impl<'a> SampleCollector<'a> {
    fn new(config: &InferenceConfig, tracker: &'a mut StateTracker) -> Self {
        Self {
            rows: Vec::new(),
            limit: config.sample_size,
            tracker,
        }
    }
}

impl RowVisitor for SampleCollector<'_> {
    fn cursor_opened(&mut self) {
        self.tracker.advance(ExtractState::Streaming);
    }

    fn visit(&mut self, row: &[String]) -> ExtractResult<()> {
        if self.wants_more() {
            self.rows.push(row.to_vec());
        }
        Ok(())
    }

    fn wants_more(&self) -> bool {
        self.limit == 0 || self.rows.len() < self.limit
    }
}

/// A header row followed by the rows of another source
struct HeaderThen<S> {
    header: Option<Row>,
    rows: S,
}

impl<S: TabularSource> TabularSource for HeaderThen<S> {
    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        match self.header.take() {
            Some(header) => Ok(Some(header)),
            None => self.rows.next_row(),
        }
    }

    fn rows_read(&self) -> u64 {
        self.rows.rows_read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DelimitedConnector, ErrorKind};
    use crate::inference::SemanticType;
    use tempfile::TempDir;

    use ExtractState::*;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_settle() {
        let ok: ExtractResult<u8> = settle(Ok(1), Ok(()));
        assert_eq!(ok.unwrap(), 1);

        let release_only = settle(Ok(1), Err(ExtractError::connection("close failed")));
        assert_eq!(release_only.unwrap_err().kind(), ErrorKind::Connection);

        let both: ExtractResult<u8> = settle(
            Err(ExtractError::stream("read failed")),
            Err(ExtractError::connection("close failed")),
        );
        assert_eq!(both.unwrap_err().kind(), ErrorKind::Stream);
    }

    #[test]
    fn test_extract_delimited_file() {
        let dir = TempDir::new().unwrap();
        let sinks = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "orders.csv",
            "Order Date,Total,Customer\n2009-01-05,12.50,Ann\n2009-01-06,\"1,000\",Bob\n",
        );

        let mut pipeline = ExtractionPipeline::new(Box::new(DelimitedConnector::new(&path)), "orders")
            .with_sink_dir(sinks.path());
        let extraction = pipeline.extract().unwrap();

        assert_eq!(extraction.stats.rows, 2);
        assert_eq!(extraction.schema.name(), "orders");
        assert_eq!(
            extraction.schema.types(),
            vec![SemanticType::Date, SemanticType::Fact, SemanticType::Attribute]
        );
        assert_eq!(extraction.schema.columns()[0].name, "orderdate");
        assert_eq!(
            pipeline.transitions(),
            &[Idle, Connected, Executing, Streaming, Cleanup, Completed]
        );

        let sink_path = extraction.sink.path().to_path_buf();
        assert!(sink_path.starts_with(sinks.path()));
        drop(extraction);
        assert!(!sink_path.exists());
    }

    #[test]
    fn test_missing_file_never_reaches_cleanup() {
        let dir = TempDir::new().unwrap();
        let mut pipeline = ExtractionPipeline::new(
            Box::new(DelimitedConnector::new(dir.path().join("missing.csv"))),
            "missing",
        );
        let err = pipeline.extract().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(pipeline.transitions(), &[Idle, Failed]);
    }

    #[test]
    fn test_header_only_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", "a,b,c\n");
        let mut pipeline = ExtractionPipeline::new(Box::new(DelimitedConnector::new(&path)), "empty");

        let extraction = pipeline.extract().unwrap();
        assert_eq!(extraction.stats.rows, 0);
        assert_eq!(extraction.schema.types(), vec![SemanticType::Attribute; 3]);
    }

    #[test]
    fn test_save_schema() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "m.csv", "month,amount\n1/5/2009,3\n2/5/2009,4\n");
        let out = dir.path().join("m.schema.json");

        let mut pipeline = ExtractionPipeline::new(Box::new(DelimitedConnector::new(&path)), "m");
        let schema = pipeline.save_schema(&out).unwrap();
        assert_eq!(schema.types(), vec![SemanticType::Date, SemanticType::Fact]);
        assert_eq!(SourceSchema::read_config(&out).unwrap(), schema);
        assert_eq!(pipeline.transitions().last(), Some(&Completed));
    }

    #[test]
    fn test_schema_file_replaces_inference() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "codes.csv", "code\n001\n002\n");
        let schema_path = dir.path().join("codes.yaml");
        SourceSchema::new(
            "codes",
            vec![crate::schema::SourceColumn::new(
                "code",
                SemanticType::Attribute,
                "Code",
            )],
        )
        .write_config(&schema_path)
        .unwrap();

        let mut pipeline = ExtractionPipeline::new(Box::new(DelimitedConnector::new(&path)), "codes")
            .with_schema_file(&schema_path);
        let extraction = pipeline.extract().unwrap();
        assert_eq!(extraction.schema.types(), vec![SemanticType::Attribute]);
    }
}
