//! Assembles one CSV/JSON row against the GetThis profile schema
//! (`orc_model::get_this_csv_schema`), in exactly the column order the
//! schema declares.

use std::io::Write;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use orc_contracts::TimestampQuad;
use orc_model::{ContentKind, HashBuffers};

use crate::error::Result;
use crate::table::TableSink;

/// Everything `write_row` needs, gathered by the collector once per
/// archived (or report-all discarded) attribute.
pub struct RowInput {
    pub computer_name: String,
    pub volume_serial: i64,
    pub parent_frn: u64,
    pub frn: u64,
    pub full_path: String,
    pub sample_name: String,
    pub size_after_pipeline: u64,
    pub hashes: HashBuffers,
    pub rule_description: String,
    pub content_kind: ContentKind,
    pub collection_time: DateTime<Utc>,
    pub standard_information_times: TimestampQuad,
    pub file_name_times: TimestampQuad,
    pub attribute_type_flags: u64,
    pub attribute_name: String,
    pub instance_id: u32,
    pub snapshot_id: Uuid,
    pub record_in_use: bool,
}

fn write_timestamp_opt<W: Write + Send>(
    table: &TableSink<W>,
    value: Option<DateTime<Utc>>,
) -> Result<()> {
    match value {
        Some(ts) => table.write_timestamp(ts),
        None => table.write_nothing(),
    }
}

fn write_binary_opt<W: Write + Send>(table: &TableSink<W>, value: &Option<Vec<u8>>) -> Result<()> {
    match value {
        Some(bytes) => table.write_binary(bytes.clone()),
        None => table.write_nothing(),
    }
}

fn write_utf8_opt<W: Write + Send>(table: &TableSink<W>, value: &Option<String>) -> Result<()> {
    match value {
        Some(s) => table.write_utf8(s.clone()),
        None => table.write_nothing(),
    }
}

/// Writes the 29 columns of `get_this_csv_schema` in order, then closes
/// the row. The caller must have called `set_schema` with that schema
/// beforehand. `row.sample_name` is the archive-name column and must
/// already be empty for an off-limits sample — this function writes it
/// verbatim.
pub fn write_row<W: Write + Send>(table: &TableSink<W>, row: &RowInput) -> Result<()> {
    table.write_utf8(row.computer_name.clone())?;
    table.write_i64(row.volume_serial)?;
    table.write_u64(row.parent_frn)?;
    table.write_u64(row.frn)?;
    table.write_utf8(row.full_path.clone())?;
    table.write_utf8(row.sample_name.clone())?;
    table.write_u64(row.size_after_pipeline)?;
    write_binary_opt(table, &row.hashes.md5)?;
    write_binary_opt(table, &row.hashes.sha1)?;
    table.write_utf8(row.rule_description.clone())?;
    table.write_utf8(row.content_kind.to_string())?;
    table.write_timestamp(row.collection_time)?;
    write_timestamp_opt(table, row.standard_information_times.create)?;
    write_timestamp_opt(table, row.standard_information_times.last_modification)?;
    write_timestamp_opt(table, row.standard_information_times.last_access)?;
    write_timestamp_opt(table, row.standard_information_times.last_attr_change)?;
    write_timestamp_opt(table, row.file_name_times.create)?;
    write_timestamp_opt(table, row.file_name_times.last_modification)?;
    write_timestamp_opt(table, row.file_name_times.last_access)?;
    write_timestamp_opt(table, row.file_name_times.last_attr_change)?;
    table.write_flags(row.attribute_type_flags)?;
    table.write_utf8(row.attribute_name.clone())?;
    table.write_u32(row.instance_id)?;
    table.write_guid(row.snapshot_id)?;
    write_binary_opt(table, &row.hashes.sha256)?;
    write_utf8_opt(table, &row.hashes.ssdeep)?;
    write_utf8_opt(table, &row.hashes.tlsh)?;
    table.write_nothing()?; // YaraRules: Yara matching is an external contract, not evaluated here.
    table.write_bool(row.record_in_use)?;
    table.end_of_line()?;
    Ok(())
}
