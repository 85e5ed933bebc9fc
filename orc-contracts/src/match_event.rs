use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `$STANDARD_INFORMATION` or `$FILE_NAME` timestamp quad, as carried by
/// an MFT record. Both attribute types expose the same four fields.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TimestampQuad {
    pub create: Option<DateTime<Utc>>,
    pub last_modification: Option<DateTime<Utc>>,
    pub last_access: Option<DateTime<Utc>>,
    pub last_attr_change: Option<DateTime<Utc>>,
}

/// One matching data-stream attribute within a `Match`'s MFT record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchAttribute {
    pub attribute_index: u32,
    pub instance_id: u32,
    pub data_size: u64,
    /// Named data-stream suffix (`file.txt:stream`), empty for `$DATA`.
    pub stream_name: String,
}

/// A FileFinder event: a SearchTerm paired with one MFT record and its
/// matching attributes and names. Emitted synchronously from the walker's
/// own thread — the collector that consumes it must not block for long.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Match {
    pub term_name: String,
    pub file_record_number: u64,
    pub parent_file_record_number: u64,
    pub volume_serial: i64,
    pub snapshot_id: Uuid,
    pub full_path: String,
    /// Every name this record is known by (hard links); the collector
    /// picks the *last* entry for the archive-name template (spec
    /// mandates last over earliest/longest for compatibility).
    pub names: Vec<String>,
    pub attributes: Vec<MatchAttribute>,
    pub record_in_use: bool,
    pub standard_information_times: TimestampQuad,
    pub file_name_times: TimestampQuad,
}

impl Match {
    /// The name the archive-name template should use: the last alias.
    pub fn preferred_name(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }
}
