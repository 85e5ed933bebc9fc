use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// What the pipeline should extract from a matched attribute.
///
/// `Invalid` means "inherit from the owning spec's default" — it is a
/// parse/placeholder state, never the effective kind the pipeline runs
/// with (see `ContentSpec::resolve`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Data,
    Strings,
    Raw,
    Invalid,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentKind::Data => "data",
            ContentKind::Strings => "strings",
            ContentKind::Raw => "raw",
            ContentKind::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

impl FromStr for ContentKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(ContentKind::Data),
            "strings" => Ok(ContentKind::Strings),
            "raw" => Ok(ContentKind::Raw),
            "invalid" => Ok(ContentKind::Invalid),
            other => Err(ModelError::InvalidContentSpec(other.to_string())),
        }
    }
}

/// Minimum printable-string run length the pipeline's strings filter will
/// emit, absent an override on the `ContentSpec` itself.
pub const DEFAULT_MIN_CHARS: u32 = 4;
/// Maximum printable-string run length before the filter starts a new run.
pub const DEFAULT_MAX_CHARS: u32 = 1024;

/// `{kind, min-chars, max-chars}` describing how the pipeline should treat
/// a matched attribute's bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSpec {
    pub kind: ContentKind,
    pub min_chars: Option<u32>,
    pub max_chars: Option<u32>,
}

impl ContentSpec {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            min_chars: None,
            max_chars: None,
        }
    }

    pub fn strings(min_chars: u32, max_chars: u32) -> Self {
        Self {
            kind: ContentKind::Strings,
            min_chars: Some(min_chars),
            max_chars: Some(max_chars),
        }
    }

    /// Resolves an `Invalid` kind to the caller's default, leaving any
    /// other kind untouched. Called once per sample, never mutating `self`.
    pub fn resolve(self, default: ContentSpec) -> ContentSpec {
        if self.kind == ContentKind::Invalid {
            default
        } else {
            self
        }
    }

    pub fn effective_min_chars(&self) -> u32 {
        self.min_chars.unwrap_or(DEFAULT_MIN_CHARS)
    }

    pub fn effective_max_chars(&self) -> u32 {
        self.max_chars.unwrap_or(DEFAULT_MAX_CHARS)
    }
}

impl Default for ContentSpec {
    fn default() -> Self {
        ContentSpec::new(ContentKind::Data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_resolves_to_spec_default() {
        let spec = ContentSpec::new(ContentKind::Invalid);
        let default = ContentSpec::strings(5, 16);
        assert_eq!(spec.resolve(default), default);
    }

    #[test]
    fn non_invalid_kind_is_untouched_by_resolve() {
        let spec = ContentSpec::new(ContentKind::Raw);
        let default = ContentSpec::strings(5, 16);
        assert_eq!(spec.resolve(default), spec);
    }

    #[test]
    fn parses_from_cli_tokens() {
        assert_eq!("data".parse::<ContentKind>().unwrap(), ContentKind::Data);
        assert!("bogus".parse::<ContentKind>().is_err());
    }
}
