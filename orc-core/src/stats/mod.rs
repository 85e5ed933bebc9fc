//! Aggregates per-`SearchTerm` profiling counters (collected by the
//! external `FileFinder`) into the JSON statistics document archived as
//! `Statistics.json`. A write failure here is non-fatal: the run is still
//! considered successful.

use serde::Serialize;

use orc_model::SearchTerm;

use crate::error::Result;

#[derive(Serialize)]
struct TermStatistics {
    description: String,
    match_time: f64,
    match_read: u64,
    #[serde(rename = "match")]
    match_count: u64,
    miss: u64,
    collection_time: f64,
    collection_read: u64,
}

impl From<&SearchTerm> for TermStatistics {
    fn from(term: &SearchTerm) -> Self {
        Self {
            description: term.required_criteria.clone(),
            match_time: term.counters.match_time_seconds,
            match_read: term.counters.bytes_read,
            match_count: term.counters.match_count,
            miss: term.counters.miss_count,
            collection_time: term.counters.collection_time_seconds,
            collection_read: term.counters.bytes_read,
        }
    }
}

#[derive(Serialize)]
struct StatisticsDocument {
    version: String,
    #[serde(rename = "dfir-orc")]
    dfir_orc: std::collections::HashMap<String, ToolStatistics>,
}

#[derive(Serialize)]
struct ToolStatistics {
    statistics: ToolStatisticsBody,
}

#[derive(Serialize)]
struct ToolStatisticsBody {
    ntfs_find: Vec<TermStatistics>,
}

pub struct StatisticsReporter {
    tool_name: String,
}

impl StatisticsReporter {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
        }
    }

    /// Reads the profiling counters off every term and renders the
    /// per-keyword statistics document.
    pub fn report(&self, terms: &[SearchTerm]) -> StatisticsJson {
        let doc = StatisticsDocument {
            version: "1.0".to_string(),
            dfir_orc: std::collections::HashMap::from([(
                self.tool_name.clone(),
                ToolStatistics {
                    statistics: ToolStatisticsBody {
                        ntfs_find: terms.iter().map(TermStatistics::from).collect(),
                    },
                },
            )]),
        };
        StatisticsJson(doc)
    }
}

pub struct StatisticsJson(StatisticsDocument);

impl StatisticsJson {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_entry_per_term() {
        let terms = vec![
            SearchTerm::new("*.ini").with_required_criteria("name"),
            SearchTerm::new("*.exe").with_required_criteria("name"),
        ];
        let reporter = StatisticsReporter::new("GetThis");
        let report = reporter.report(&terms);
        let bytes = report.to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"], "1.0");
        let entries = value["dfir-orc"]["GetThis"]["statistics"]["ntfs_find"]
            .as_array()
            .unwrap();
        assert_eq!(entries.len(), 2);
    }
}
