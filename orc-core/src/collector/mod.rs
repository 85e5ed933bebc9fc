//! `SampleCollector`: drives a `FileFinder` walk, classifies every match
//! against the `LimitLedger`, stages in-limits bytes through the
//! `StreamPipeline`, and hands the result off to an `Appender` plus the
//! `TableSink` index row. One instance per command-set execution.

mod naming;
mod row;

pub use naming::archive_name;
pub use row::{write_row, RowInput};

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use orc_contracts::{
    Appender, ArchiveItem, FileFinder, Match, MatchAttribute, MatchSink, Result as ContractResult,
};
use orc_model::{ContentSpec, SampleId, SampleSpec};

use crate::error::Result;
use crate::limits::LimitLedger;
use crate::pipeline::{CryptoAlgorithms, DiscardSink, FuzzyHasher, NullFuzzyHasher, PipelineHandle, StreamPipeline};
use crate::table::TableSink;

/// $DATA bit of the `AttributeType` flags column — every row this
/// collector writes describes one data-stream attribute, never a
/// `$STANDARD_INFORMATION`/`$FILE_NAME` record on its own.
const ATTRIBUTE_TYPE_DATA: u64 = 0x4;

/// Where collected bytes end up: inside the run's archive, or copied
/// loose into a directory (the `/out:dir` CLI mode). In archive mode,
/// `csv_staging_path` is where the `TableSink` writes the
/// index before `finish` reads it back and enqueues it as an archive
/// item — the sink itself has no notion of "inside a zip".
pub enum OutputMode {
    Archive { csv_staging_path: PathBuf },
    Directory(PathBuf),
}

/// Run-wide knobs that don't vary per `SampleSpec`.
#[derive(Clone)]
pub struct CollectorConfig {
    pub computer_name: String,
    pub crypto: CryptoAlgorithms,
    pub fuzzy_algorithms: Vec<String>,
    pub report_all: bool,
    pub content_default: ContentSpec,
}

impl CollectorConfig {
    fn fuzzy_hashers(&self) -> Vec<Box<dyn FuzzyHasher>> {
        self.fuzzy_algorithms
            .iter()
            .filter_map(|name| match name.as_str() {
                "ssdeep" => Some(Box::new(NullFuzzyHasher::ssdeep()) as Box<dyn FuzzyHasher>),
                "tlsh" => Some(Box::new(NullFuzzyHasher::tlsh()) as Box<dyn FuzzyHasher>),
                other => {
                    warn!(algorithm = other, "unknown fuzzy-hash algorithm requested, ignoring");
                    None
                }
            })
            .collect()
    }
}

/// Holds everything one command set's collection pass needs: the run
/// configuration, the dedup set, the global/local limit ledger, the
/// archive appender, the table sink, and the output mode. A fresh
/// instance is built per `ExecutionSet`; `specs` never changes mid-walk.
pub struct SampleCollector<A: Appender, W: Write + Send> {
    specs: Vec<SampleSpec>,
    seen: HashSet<SampleId>,
    ledger: LimitLedger,
    archive: Arc<A>,
    table: Arc<TableSink<W>>,
    output_mode: OutputMode,
    config: CollectorConfig,
    file_finder: Arc<dyn FileFinder>,
    index_file_name: String,
    stats_file_name: String,
}

impl<A: Appender + 'static, W: Write + Send + 'static> SampleCollector<A, W> {
    pub fn new(
        specs: Vec<SampleSpec>,
        ledger: LimitLedger,
        archive: Arc<A>,
        table: Arc<TableSink<W>>,
        output_mode: OutputMode,
        config: CollectorConfig,
        file_finder: Arc<dyn FileFinder>,
    ) -> Self {
        Self {
            specs,
            seen: HashSet::new(),
            ledger,
            archive,
            table,
            output_mode,
            config,
            file_finder,
            index_file_name: "GetThis.csv".to_string(),
            stats_file_name: "Statistics.json".to_string(),
        }
    }

    /// Overrides the default `GetThis.csv` / `Statistics.json` names the
    /// index and the statistics report are enqueued or written under.
    pub fn with_report_names(mut self, index_file_name: impl Into<String>, stats_file_name: impl Into<String>) -> Self {
        self.index_file_name = index_file_name.into();
        self.stats_file_name = stats_file_name.into();
        self
    }

    pub fn search_terms(&self) -> Vec<orc_model::SearchTerm> {
        self.specs.iter().flat_map(|s| s.terms.clone()).collect()
    }

    fn spec_index_for(&self, term_name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.owns_term(term_name))
    }

    /// Processes one matching attribute: classify, charge/mark the
    /// ledger, and either archive the pipeline output or discard it
    /// in-place for `report-all` digest-only collection.
    async fn handle_attribute(
        &mut self,
        event: &Match,
        attribute: &MatchAttribute,
        spec_idx: usize,
    ) -> Result<()> {
        let id = SampleId::new(
            event.file_record_number,
            attribute.attribute_index,
            event.volume_serial,
            event.snapshot_id,
        );
        if !self.seen.insert(id) {
            warn!(frn = event.file_record_number, attribute = attribute.attribute_index, "duplicate sample, skipping");
            return Ok(());
        }

        let status = self
            .ledger
            .classify(&self.specs[spec_idx].limits, attribute.data_size);
        self.ledger
            .charge_or_mark(&mut self.specs[spec_idx].limits, status, attribute.data_size);

        let content_spec = self.specs[spec_idx]
            .content_spec
            .resolve(self.config.content_default);
        let name = archive_name(&self.specs[spec_idx], event, attribute, content_spec.kind);

        let should_read = !status.is_offlimits() || (self.config.report_all && self.config.crypto.any());
        if !should_read {
            // off-limits: archive-name column stays empty, nothing is read.
            self.write_row_now(event, attribute, "", content_spec, Default::default(), 0)?;
            return Ok(());
        }

        let source = self.file_finder.open_stream(event, attribute.attribute_index)?;
        let fuzzy = self.config.fuzzy_hashers();
        let (piped, handle) = StreamPipeline::build(source, &content_spec, self.config.crypto, fuzzy);

        if status.is_offlimits() {
            // report-all digest-only path: drain without ever touching
            // the archive or table sink until the digests are ready.
            // Still off-limits, so the archive-name column stays empty.
            let drained = DiscardSink::new(piped).drain().await?;
            let hashes = handle.finalize();
            self.write_row_now(event, attribute, "", content_spec, hashes, drained)?;
            return Ok(());
        }

        match &self.output_mode {
            OutputMode::Archive { .. } => self.archive_item(event.clone(), attribute.clone(), name, content_spec, piped, handle).await,
            OutputMode::Directory(dir) => self.copy_to_directory(event, attribute, &name, dir, content_spec, piped, handle).await,
        }
    }

    async fn archive_item(
        &self,
        event: Match,
        attribute: MatchAttribute,
        name: String,
        content_spec: ContentSpec,
        piped: crate::pipeline::PipelineOutput,
        handle: PipelineHandle,
    ) -> Result<()> {
        let table = self.table.clone();
        let computer_name = self.config.computer_name.clone();
        let rule_description = self
            .specs
            .iter()
            .flat_map(|s| s.terms.iter())
            .find(|t| t.name == event.term_name)
            .map(|t| t.required_criteria.clone())
            .unwrap_or_default();
        let archive_name_for_row = name.clone();

        let completion: orc_contracts::CompletionCallback = Box::new(move |result: ContractResult<()>| {
            if let Err(err) = result {
                warn!(error = %err, name = %archive_name_for_row, "archive item failed to write, row skipped");
                return;
            }
            let size_after_pipeline = handle.bytes_seen();
            let hashes = handle.finalize();
            let row = row::RowInput {
                computer_name,
                volume_serial: event.volume_serial,
                parent_frn: event.parent_file_record_number,
                frn: event.file_record_number,
                full_path: event.full_path.clone(),
                sample_name: archive_name_for_row,
                size_after_pipeline,
                hashes,
                rule_description,
                content_kind: content_spec.kind,
                collection_time: now(),
                standard_information_times: event.standard_information_times,
                file_name_times: event.file_name_times,
                attribute_type_flags: ATTRIBUTE_TYPE_DATA,
                attribute_name: attribute.stream_name.clone(),
                instance_id: attribute.instance_id,
                snapshot_id: event.snapshot_id,
                record_in_use: event.record_in_use,
            };
            if let Err(err) = row::write_row(&table, &row) {
                warn!(error = %err, "failed to write index row for completed archive item");
            }
        });

        let item = ArchiveItem::new(name, piped).with_completion(completion);
        self.archive.add(item).await?;
        Ok(())
    }

    async fn copy_to_directory(
        &self,
        event: &Match,
        attribute: &MatchAttribute,
        name: &str,
        dir: &std::path::Path,
        content_spec: ContentSpec,
        mut piped: crate::pipeline::PipelineOutput,
        handle: PipelineHandle,
    ) -> Result<()> {
        use tokio::io::AsyncWriteExt;

        let dest = dir.join(name.replace('\\', "_"));
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut out = tokio::fs::File::create(&dest).await?;
        tokio::io::copy(&mut piped, &mut out).await?;
        out.flush().await?;

        let bytes_seen = handle.bytes_seen();
        let hashes = handle.finalize();
        self.write_row_now(event, attribute, name, content_spec, hashes, bytes_seen)?;
        Ok(())
    }

    /// `name` is the archive-name column verbatim; callers pass `""` for
    /// an off-limits sample so the column stays empty. `size_after_pipeline`
    /// is whatever the pipeline actually saw, not the raw attribute size.
    fn write_row_now(
        &self,
        event: &Match,
        attribute: &MatchAttribute,
        name: &str,
        content_spec: ContentSpec,
        hashes: orc_model::HashBuffers,
        size_after_pipeline: u64,
    ) -> Result<()> {
        let rule_description = self
            .specs
            .iter()
            .flat_map(|s| s.terms.iter())
            .find(|t| t.name == event.term_name)
            .map(|t| t.required_criteria.clone())
            .unwrap_or_default();

        let row = row::RowInput {
            computer_name: self.config.computer_name.clone(),
            volume_serial: event.volume_serial,
            parent_frn: event.parent_file_record_number,
            frn: event.file_record_number,
            full_path: event.full_path.clone(),
            sample_name: name.to_string(),
            size_after_pipeline,
            hashes,
            rule_description,
            content_kind: content_spec.kind,
            collection_time: now(),
            standard_information_times: event.standard_information_times,
            file_name_times: event.file_name_times,
            attribute_type_flags: ATTRIBUTE_TYPE_DATA,
            attribute_name: attribute.stream_name.clone(),
            instance_id: attribute.instance_id,
            snapshot_id: event.snapshot_id,
            record_in_use: event.record_in_use,
        };
        row::write_row(&self.table, &row)
    }

    /// Flushes the table sink, writes the CSV index and statistics
    /// report into the archive (or loose into the output directory),
    /// then closes the archive. Called once after the walk completes.
    pub async fn finish(&self, stats: &crate::stats::StatisticsJson) -> Result<()> {
        self.table.flush()?;
        match &self.output_mode {
            OutputMode::Directory(dir) => {
                let stats_path = dir.join(&self.stats_file_name);
                tokio::fs::write(stats_path, stats.to_bytes()?).await?;
            }
            OutputMode::Archive { csv_staging_path } => {
                let index_source = tokio::fs::File::open(csv_staging_path).await?;
                self.archive
                    .add(ArchiveItem::new(self.index_file_name.clone(), Box::new(index_source)))
                    .await?;

                let stats_bytes = stats.to_bytes()?;
                self.archive
                    .add(ArchiveItem::new(
                        self.stats_file_name.clone(),
                        Box::new(std::io::Cursor::new(stats_bytes)),
                    ))
                    .await?;
            }
        }
        self.archive.close().await?;
        Ok(())
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use orc_contracts::TimestampQuad;
    use orc_model::{ContentKind, ContentSpec, SampleSpec, SearchTerm};
    use uuid::Uuid;

    struct FixedByteFileFinder(Vec<u8>);

    #[async_trait]
    impl FileFinder for FixedByteFileFinder {
        fn search_terms(&self) -> Vec<orc_model::SearchTerm> {
            Vec::new()
        }

        async fn walk(&self, _sink: &mut dyn MatchSink) -> ContractResult<()> {
            Ok(())
        }

        fn open_stream(&self, _event: &Match, _attribute_index: u32) -> ContractResult<Box<dyn tokio::io::AsyncRead + Unpin + Send>> {
            Ok(Box::new(std::io::Cursor::new(self.0.clone())))
        }
    }

    #[derive(Default)]
    struct RecordingAppender {
        names: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl Appender for RecordingAppender {
        async fn add(&self, mut item: ArchiveItem) -> ContractResult<()> {
            self.names.lock().unwrap().push(item.name.clone());
            if let Some(callback) = item.on_complete.take() {
                callback(Ok(()));
            }
            Ok(())
        }

        async fn flush(&self) -> ContractResult<()> {
            Ok(())
        }

        async fn close(&self) -> ContractResult<()> {
            Ok(())
        }
    }

    fn test_match() -> Match {
        Match {
            term_name: "cfg".into(),
            file_record_number: 0x10,
            parent_file_record_number: 0x5,
            volume_serial: 0x42,
            snapshot_id: Uuid::nil(),
            full_path: "C:\\boot.ini".into(),
            names: vec!["boot.ini".into()],
            attributes: vec![MatchAttribute {
                attribute_index: 0,
                instance_id: 0,
                data_size: 5,
                stream_name: String::new(),
            }],
            record_in_use: true,
            standard_information_times: TimestampQuad::default(),
            file_name_times: TimestampQuad::default(),
        }
    }

    fn test_config() -> CollectorConfig {
        CollectorConfig {
            computer_name: "TESTHOST".into(),
            crypto: CryptoAlgorithms::default(),
            fuzzy_algorithms: Vec::new(),
            report_all: false,
            content_default: ContentSpec::new(ContentKind::Data),
        }
    }

    fn test_specs() -> Vec<SampleSpec> {
        vec![SampleSpec::new("", ContentSpec::new(ContentKind::Data)).with_term(SearchTerm::new("cfg"))]
    }

    #[tokio::test]
    async fn archive_mode_writes_one_row_per_matched_attribute() {
        let table = Arc::new(TableSink::csv(Vec::<u8>::new(), crate::table::CsvOptions::default()));
        table.set_schema(orc_model::schema::get_this_csv_schema()).unwrap();
        let appender = Arc::new(RecordingAppender::default());
        let finder: Arc<dyn FileFinder> = Arc::new(FixedByteFileFinder(b"hello".to_vec()));

        let mut collector = SampleCollector::new(
            test_specs(),
            LimitLedger::new(orc_model::Limits::new()),
            appender.clone(),
            table,
            OutputMode::Archive { csv_staging_path: PathBuf::from("/dev/null") },
            test_config(),
            finder,
        );

        collector.on_match(test_match()).await.unwrap();

        assert_eq!(appender.names.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_match_is_collected_once() {
        let table = Arc::new(TableSink::csv(Vec::<u8>::new(), crate::table::CsvOptions::default()));
        table.set_schema(orc_model::schema::get_this_csv_schema()).unwrap();
        let appender = Arc::new(RecordingAppender::default());
        let finder: Arc<dyn FileFinder> = Arc::new(FixedByteFileFinder(b"hello".to_vec()));

        let mut collector = SampleCollector::new(
            test_specs(),
            LimitLedger::new(orc_model::Limits::new()),
            appender.clone(),
            table,
            OutputMode::Archive { csv_staging_path: PathBuf::from("/dev/null") },
            test_config(),
            finder,
        );

        collector.on_match(test_match()).await.unwrap();
        collector.on_match(test_match()).await.unwrap();

        assert_eq!(appender.names.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn offlimits_without_report_all_writes_a_zero_size_row_without_reading() {
        let table = Arc::new(TableSink::csv(Vec::<u8>::new(), crate::table::CsvOptions::default()));
        table.set_schema(orc_model::schema::get_this_csv_schema()).unwrap();
        let appender = Arc::new(RecordingAppender::default());
        let finder: Arc<dyn FileFinder> = Arc::new(FixedByteFileFinder(b"hello".to_vec()));

        let specs = vec![SampleSpec::new("", ContentSpec::new(ContentKind::Data))
            .with_term(SearchTerm::new("cfg"))
            .with_limits(orc_model::Limits::new().with_max_sample_count(0))];

        let mut collector = SampleCollector::new(
            specs,
            LimitLedger::new(orc_model::Limits::new()),
            appender.clone(),
            table,
            OutputMode::Archive { csv_staging_path: PathBuf::from("/dev/null") },
            test_config(),
            finder,
        );

        collector.on_match(test_match()).await.unwrap();

        // No bytes were read and nothing was handed to the archive.
        assert!(appender.names.lock().unwrap().is_empty());
    }
}

#[async_trait]
impl<A: Appender + 'static, W: Write + Send + 'static> MatchSink for SampleCollector<A, W> {
    async fn on_match(&mut self, event: Match) -> ContractResult<()> {
        if event.attributes.is_empty() {
            warn!(frn = event.file_record_number, "match carried no attributes, skipping");
            return Ok(());
        }
        let spec_idx = match self.spec_index_for(&event.term_name) {
            Some(idx) => idx,
            None => {
                warn!(term = %event.term_name, "match for unowned term, skipping");
                return Ok(());
            }
        };

        for attribute in event.attributes.clone() {
            if let Err(err) = self.handle_attribute(&event, &attribute, spec_idx).await {
                warn!(error = %err, "failed to collect matched attribute");
            }
        }
        Ok(())
    }
}
