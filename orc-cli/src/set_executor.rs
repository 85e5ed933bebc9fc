//! The concrete `SetExecutor`: wires a `SampleCollector` around a
//! `ZipArchiveAppender` (or a plain directory) and a CSV `TableSink`, then
//! drives the configured `FileFinder` to completion for one `ExecutionSet`.
//! This binary only implements the GetThis-shaped tool, so every set it
//! runs is a sample collection pass against the same `RunConfig`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use orc_core::archive::{CompressionProfile, ZipArchiveAppender};
use orc_core::collector::{CollectorConfig, OutputMode, SampleCollector};
use orc_core::limits::LimitLedger;
use orc_core::orchestrator::{
    NullEnvironmentEffects, ScopedEffect, SetExecutor, TerminationCascade, TerminationOutcome,
};
use orc_core::stats::StatisticsReporter;
use orc_core::table::{CsvOptions, TableSink};
use orc_core::Result;
use orc_contracts::{Appender, FileFinder};
use orc_model::schema::get_this_csv_schema;
use orc_model::ExecutionSet;

pub struct GetThisSetExecutor {
    file_finder: Arc<dyn FileFinder>,
    specs: Vec<orc_model::SampleSpec>,
    global_limits: orc_model::Limits,
    collector_config: CollectorConfig,
    work_dir: PathBuf,
    environment: NullEnvironmentEffects,
}

impl GetThisSetExecutor {
    pub fn new(
        file_finder: Arc<dyn FileFinder>,
        specs: Vec<orc_model::SampleSpec>,
        global_limits: orc_model::Limits,
        collector_config: CollectorConfig,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            file_finder,
            specs,
            global_limits,
            collector_config,
            work_dir,
            environment: NullEnvironmentEffects,
        }
    }
}

#[async_trait]
impl SetExecutor for GetThisSetExecutor {
    async fn local_state(&self, set: &ExecutionSet) -> std::io::Result<Option<u64>> {
        match tokio::fs::metadata(&set.output_full_path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn execute(&self, set: &ExecutionSet, cascade: &mut TerminationCascade) -> Result<()> {
        tokio::fs::create_dir_all(&self.work_dir).await?;

        // Held for the set's whole walk; dropping at the end of this
        // function restores normal scheduling regardless of how the
        // walk below returns.
        let _sleep_guard = ScopedEffect::sleep_inhibition(&self.environment);

        let to_directory = set.output_full_path.extension().is_none();

        let ledger = LimitLedger::new(self.global_limits.clone());

        if to_directory {
            tokio::fs::create_dir_all(&set.output_full_path).await?;
            let csv_path = set.output_full_path.join("GetThis.csv");
            let file = std::fs::File::create(&csv_path)?;
            let table = Arc::new(TableSink::csv(file, CsvOptions::default()));
            table.set_schema(get_this_csv_schema())?;

            let appender = Arc::new(NoopAppender);
            register_close_handlers(cascade, table.clone(), appender.clone());
            let collector = SampleCollector::new(
                self.specs.clone(),
                ledger,
                appender,
                table,
                OutputMode::Directory(set.output_full_path.clone()),
                self.collector_config.clone(),
                self.file_finder.clone(),
            );
            run_walk(collector, self.file_finder.as_ref(), &set.keyword).await
        } else {
            let csv_staging_path = self.work_dir.join(format!("{}-index.csv", set.keyword));
            let file = std::fs::File::create(&csv_staging_path)?;
            let table = Arc::new(TableSink::csv(file, CsvOptions::default()));
            table.set_schema(get_this_csv_schema())?;

            let appender = Arc::new(ZipArchiveAppender::new(
                &self.work_dir,
                set.output_full_path.clone(),
                CompressionProfile::Normal,
            ));
            register_close_handlers(cascade, table.clone(), appender.clone());
            let collector = SampleCollector::new(
                self.specs.clone(),
                ledger,
                appender,
                table,
                OutputMode::Archive { csv_staging_path },
                self.collector_config.clone(),
                self.file_finder.clone(),
            );
            run_walk(collector, self.file_finder.as_ref(), &set.keyword).await
        }
    }
}

/// Registers the cascade's CSV-flush and archive-close handlers so a
/// walk that errors out still leaves a partial-but-valid archive and
/// whatever index rows had already been committed. The orchestrator
/// only calls `cascade.run()` when `execute()` returns an error; on the
/// success path `SampleCollector::finish` already flushes and closes
/// normally, so these never double-run in practice.
fn register_close_handlers<A, W>(cascade: &mut TerminationCascade, table: Arc<TableSink<W>>, archive: Arc<A>)
where
    A: Appender + 'static,
    W: std::io::Write + Send + 'static,
{
    cascade.register("flush-csv", Box::new(move || {
        let table = table.clone();
        Box::pin(async move {
            match table.flush() {
                Ok(()) => TerminationOutcome::Ok,
                Err(err) => {
                    tracing::warn!(error = %err, "termination cascade: failed to flush table sink");
                    TerminationOutcome::Failed
                }
            }
        })
    }));
    cascade.register("close-archive", Box::new(move || {
        let archive = archive.clone();
        Box::pin(async move {
            match archive.close().await {
                Ok(()) => TerminationOutcome::Ok,
                Err(err) => {
                    tracing::warn!(error = %err, "termination cascade: failed to close archive");
                    TerminationOutcome::Failed
                }
            }
        })
    }));
}

/// An `Appender` that accepts directory-mode collection, where the table
/// sink's archive handle is present only to satisfy `SampleCollector`'s
/// type parameter; directory mode never calls `add`.
struct NoopAppender;

#[async_trait]
impl orc_contracts::Appender for NoopAppender {
    async fn add(&self, _item: orc_contracts::ArchiveItem) -> orc_contracts::Result<()> {
        Ok(())
    }

    async fn flush(&self) -> orc_contracts::Result<()> {
        Ok(())
    }

    async fn close(&self) -> orc_contracts::Result<()> {
        Ok(())
    }
}

async fn run_walk<A, W>(
    mut collector: SampleCollector<A, W>,
    file_finder: &dyn FileFinder,
    keyword: &str,
) -> Result<()>
where
    A: orc_contracts::Appender + 'static,
    W: std::io::Write + Send + 'static,
{
    file_finder.walk(&mut collector).await?;

    let terms = collector.search_terms();
    let reporter = StatisticsReporter::new(keyword.to_string());
    let stats = reporter.report(&terms);
    collector.finish(&stats).await?;
    Ok(())
}
