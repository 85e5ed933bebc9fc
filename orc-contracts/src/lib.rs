//! Trait contracts for the collector's external collaborators: the NTFS
//! walker, the archive backend and the upload transport. Everything here
//! is a seam, not an implementation — the concrete NTFS/Yara/7-Zip/
//! transport code lives outside this repo (`orc-core` provides the
//! default `Appender` over the `zip` crate as the one exception, since a
//! usable default makes the core testable end to end).

pub mod appender;
pub mod error;
pub mod file_finder;
pub mod match_event;
pub mod upload;

pub use appender::{ArchiveItem, CompletionCallback};
pub use error::{ContractError, Result};
pub use file_finder::{FileFinder, MatchSink};
pub use match_event::{Match, MatchAttribute, TimestampQuad};
pub use upload::{UploadAgent, UploadMethod, UploadRequest};

pub use appender::Appender;
