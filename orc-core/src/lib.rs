//! The collection-and-limits engine: a streaming pipeline, a limit
//! ledger, a table sink, an archive appender, a sample collector, a
//! command-set orchestrator, and a statistics reporter, built over the
//! contracts in `orc-contracts` and the data model in `orc-model`.

pub mod archive;
pub mod collector;
pub mod error;
pub mod limits;
pub mod orchestrator;
pub mod pipeline;
pub mod stats;
pub mod table;

pub use error::{CoreError, Result};
