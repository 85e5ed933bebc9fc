//! `orc-collect`: command-line front-end for the evidence collector.
//! Parses arguments, assembles the run configuration, wires the
//! orchestrator around the `orc-core` engine, and prints the resulting
//! Outcome manifest.

mod args;
mod config;
mod set_executor;
mod stubs;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use orc_contracts::FileFinder;
use orc_model::{ExecutionSet, ProcessInfo, RepeatPolicy, SystemIdentity};

use args::Args;
use set_executor::GetThisSetExecutor;
use stubs::UnimplementedFileFinder;

const TOOL_NAME: &str = "GetThis";
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let run_config = config::build(&args).map_err(anyhow::Error::msg)?;

    if args.keywords {
        print_keywords();
        return Ok(());
    }

    let start = Utc::now();
    let computer_name = run_config.collector.computer_name.clone();
    let system_identity = SystemIdentity {
        hostname: computer_name.clone(),
        pid: std::process::id(),
        executable_sha1: None,
    };
    let self_info = ProcessInfo {
        cmdline: std::env::args().collect::<Vec<_>>().join(" "),
        sha1: None,
    };
    let mothership = ProcessInfo::default();

    let set = ExecutionSet::new(TOOL_NAME, run_config.out.clone())
        .with_repeat_policy(RepeatPolicy::Overwrite);
    let sets = vec![set];

    let orchestrator = orc_core::orchestrator::CommandSetOrchestrator::new(
        TOOL_NAME,
        TOOL_VERSION,
        computer_name,
        None,
    );
    let outline = orchestrator.build_outline(&sets, start, mothership.clone(), self_info.clone(), system_identity);
    info!(planned = outline.planned.len(), "collection outline assembled");

    let work_dir = work_dir_for(&run_config.out);
    let file_finder: Arc<dyn FileFinder> = Arc::new(UnimplementedFileFinder);
    let executor = GetThisSetExecutor::new(
        file_finder,
        run_config.specs,
        run_config.global_limits,
        run_config.collector,
        work_dir,
    );

    let outcome = orchestrator
        .run_execute(&sets, &executor, start, start.to_rfc3339(), mothership, self_info, Vec::new())
        .await?;

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{json}"),
        Err(err) => warn!(error = %err, "failed to render outcome as JSON"),
    }

    if outcome.produced.is_empty() {
        warn!("run completed without producing any archive");
    }

    Ok(())
}

fn work_dir_for(out: &std::path::Path) -> PathBuf {
    out.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".orc-work")
}

fn print_keywords() {
    let set = ExecutionSet::new(TOOL_NAME, PathBuf::from("."));
    let orchestrator = orc_core::orchestrator::CommandSetOrchestrator::new(TOOL_NAME, TOOL_VERSION, "", None);
    for keyword in orchestrator.enumerate_keywords(&[set]) {
        println!("{keyword}");
    }
}

fn init_tracing(args: &Args) {
    let default_filter = if args.verbose { "orc_cli=debug,orc_core=debug" } else { "orc_cli=info,orc_core=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);

    match (&args.log_file, args.no_console) {
        (Some(path), true) => {
            let writer = file_writer(path);
            registry.with(tracing_subscriber::fmt::layer().with_writer(writer)).init();
        }
        (Some(path), false) => {
            let writer = file_writer(path);
            registry
                .with(tracing_subscriber::fmt::layer())
                .with(tracing_subscriber::fmt::layer().with_writer(writer))
                .init();
        }
        (None, true) => {
            registry.init();
        }
        (None, false) => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}

/// Opens (or creates) the rolling log file and returns a `MakeWriter`
/// closure over a fresh handle per write, the simplest faithful mapping
/// of `/Out=<path>` style flags without pulling in a dedicated appender
/// crate for a single file target.
fn file_writer(path: &std::path::Path) -> impl Fn() -> std::fs::File + Clone {
    let path = path.to_path_buf();
    move || {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap_or_else(|err| panic!("failed to open log file {}: {err}", path.display()))
    }
}
