//! Translates parsed CLI flags into the types `orc-core`/`orc-model`
//! actually consume: a list of `SampleSpec`s, the global `Limits`, the
//! crypto/fuzzy algorithm selection, and the output mode.

use std::path::PathBuf;
use std::str::FromStr;

use orc_core::collector::{CollectorConfig, OutputMode};
use orc_core::pipeline::CryptoAlgorithms;
use orc_model::{ContentKind, ContentSpec, Limits, SampleSpec, SearchTerm};

use crate::args::Args;

pub struct RunConfig {
    pub out: PathBuf,
    pub output_mode: OutputMode,
    pub specs: Vec<SampleSpec>,
    pub global_limits: Limits,
    pub collector: CollectorConfig,
}

/// Parses `/Content=<data|strings|raw>[,min=N][,max=N]`.
fn parse_content(spec: &str) -> Result<ContentSpec, String> {
    let mut parts = spec.split(',');
    let kind: ContentKind = parts
        .next()
        .ok_or_else(|| "empty --content value".to_string())?
        .parse()
        .map_err(|e| format!("{e}"))?;

    let mut content = ContentSpec::new(kind);
    for part in parts {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| format!("malformed --content qualifier: {part}"))?;
        let parsed: u32 = value
            .parse()
            .map_err(|_| format!("--content qualifier {key} must be a number"))?;
        match key {
            "min" => content.min_chars = Some(parsed),
            "max" => content.max_chars = Some(parsed),
            other => return Err(format!("unknown --content qualifier: {other}")),
        }
    }
    Ok(content)
}

/// Parses `/Hash=<csv-of{md5,sha1,sha256}>`.
fn parse_hash_csv(csv: &str) -> Result<CryptoAlgorithms, String> {
    let mut algorithms = CryptoAlgorithms::default();
    for token in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match token {
            "md5" => algorithms.md5 = true,
            "sha1" => algorithms.sha1 = true,
            "sha256" => algorithms.sha256 = true,
            other => return Err(format!("unknown hash algorithm: {other}")),
        }
    }
    Ok(algorithms)
}

fn parse_fuzzy_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One `/Sample=<name-or-path>` flag: a leading `\` is a path match,
/// everything else is a name match. Each flag gets its own `SampleSpec`
/// with a single term, the simplest faithful reading of the CLI surface
/// (grouping multiple terms under one spec needs a richer config file
/// format, out of scope for flag parsing alone).
fn sample_spec_for(token: &str, content_default: ContentSpec) -> SampleSpec {
    let required_criteria = if let Some(path) = token.strip_prefix('\\') {
        format!("path:{path}")
    } else {
        format!("name:{token}")
    };
    let term = SearchTerm::new(token).with_required_criteria(required_criteria);
    SampleSpec::new(String::new(), content_default).with_term(term)
}

pub fn build(args: &Args) -> Result<RunConfig, String> {
    if args.sample.is_empty() && !args.keywords {
        return Err("at least one --sample is required".to_string());
    }

    let content_default = match &args.content {
        Some(spec) => parse_content(spec)?,
        None => ContentSpec::default(),
    };

    let mut global_limits = Limits::new();
    if args.no_limits {
        global_limits = global_limits.ignoring_all();
    } else {
        if let Some(n) = args.max_per_sample_bytes {
            global_limits = global_limits.with_max_bytes_per_sample(n);
        }
        if let Some(n) = args.max_total_bytes {
            global_limits = global_limits.with_max_total_bytes(n);
        }
        if let Some(n) = args.max_sample_count {
            global_limits = global_limits.with_max_sample_count(n);
        }
    }

    let crypto = match &args.hash {
        Some(csv) => parse_hash_csv(csv)?,
        None => CryptoAlgorithms::default(),
    };
    let fuzzy_algorithms = args.fuzzy_hash.as_deref().map(parse_fuzzy_csv).unwrap_or_default();

    let specs = args
        .sample
        .iter()
        .map(|token| sample_spec_for(token, content_default))
        .collect();

    let out_is_dir = args
        .out
        .to_string_lossy()
        .ends_with(std::path::MAIN_SEPARATOR)
        || args.out.extension().is_none();
    // The real staging path for the CSV index is only known once a
    // concrete `ExecutionSet` (and its temp directory) exists; the
    // set executor rebuilds this with a real path per set, this is
    // only a mode selector at the run-config level.
    let output_mode = if out_is_dir {
        OutputMode::Directory(args.out.clone())
    } else {
        OutputMode::Archive { csv_staging_path: PathBuf::new() }
    };

    let computer_name = hostname_best_effort();

    Ok(RunConfig {
        out: args.out.clone(),
        output_mode,
        specs,
        global_limits,
        collector: CollectorConfig {
            computer_name,
            crypto,
            fuzzy_algorithms,
            report_all: args.report_all,
            content_default,
        },
    })
}

fn hostname_best_effort() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strings_content_with_bounds() {
        let spec = parse_content("strings,min=5,max=100").unwrap();
        assert_eq!(spec.kind, ContentKind::Strings);
        assert_eq!(spec.min_chars, Some(5));
        assert_eq!(spec.max_chars, Some(100));
    }

    #[test]
    fn rejects_unknown_content_kind() {
        assert!(parse_content("bogus").is_err());
    }

    #[test]
    fn parses_multiple_hash_algorithms() {
        let algorithms = parse_hash_csv("md5,sha256").unwrap();
        assert!(algorithms.md5);
        assert!(!algorithms.sha1);
        assert!(algorithms.sha256);
    }

    #[test]
    fn leading_backslash_is_a_path_match() {
        let spec = sample_spec_for("\\Windows\\boot.ini", ContentSpec::default());
        assert!(spec.terms[0].required_criteria.starts_with("path:"));
    }

    #[test]
    fn bare_token_is_a_name_match() {
        let spec = sample_spec_for("*.ini", ContentSpec::default());
        assert!(spec.terms[0].required_criteria.starts_with("name:"));
    }
}
