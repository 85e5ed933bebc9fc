use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A process identity: command line plus an optional SHA-1 of the binary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub cmdline: String,
    pub sha1: Option<String>,
}

/// Minimal stand-in for the original `SystemIdentity` facilities (OS
/// build, domain membership, IP list): those are Win32-specific calls with
/// no portable equivalent in this stack, so only the host-identifying
/// fields obtainable anywhere are kept (see DESIGN.md).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SystemIdentity {
    pub hostname: String,
    pub pid: u32,
    pub executable_sha1: Option<String>,
}

/// An encryption target attached to an archive for later decryption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub pem_cert: String,
}

/// One planned (Outline) or produced (Outcome) archive and the command
/// keywords that populate it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveManifestEntry {
    pub keyword: String,
    pub archive_file_name: String,
    pub commands: Vec<String>,
}

/// Pre-run manifest: what the orchestrator is about to do.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Outline {
    pub version: String,
    pub tool_name: String,
    pub tool_version: String,
    pub start: DateTime<Utc>,
    pub mothership: ProcessInfo,
    pub self_info: ProcessInfo,
    pub system_identity: SystemIdentity,
    pub planned: Vec<ArchiveManifestEntry>,
}

impl Outline {
    pub fn new(tool_name: impl Into<String>, tool_version: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            version: "1.0".to_string(),
            tool_name: tool_name.into(),
            tool_version: tool_version.into(),
            start,
            mothership: ProcessInfo::default(),
            self_info: ProcessInfo::default(),
            system_identity: SystemIdentity::default(),
            planned: Vec::new(),
        }
    }
}

/// Post-run manifest. Mutated under a lock by the orchestrator as each
/// set completes; `orc-core` wraps this in the actual lock, this crate
/// only defines the shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Outcome {
    pub computer_name: String,
    pub timestamp_key: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub mothership: ProcessInfo,
    pub self_info: ProcessInfo,
    pub console_file_name: Option<String>,
    pub log_file_name: Option<String>,
    pub outline_file_name: Option<String>,
    pub recipients: Vec<Recipient>,
    pub produced: Vec<ArchiveManifestEntry>,
}

impl Outcome {
    pub fn new(computer_name: impl Into<String>, timestamp_key: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            computer_name: computer_name.into(),
            timestamp_key: timestamp_key.into(),
            start,
            end: None,
            mothership: ProcessInfo::default(),
            self_info: ProcessInfo::default(),
            console_file_name: None,
            log_file_name: None,
            outline_file_name: None,
            recipients: Vec::new(),
            produced: Vec::new(),
        }
    }

    pub fn push_produced(&mut self, entry: ArchiveManifestEntry) {
        self.produced.push(entry);
    }

    pub fn finish(&mut self, end: DateTime<Utc>) {
        self.end = Some(end);
    }
}
