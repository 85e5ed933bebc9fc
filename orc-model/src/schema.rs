use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic type carried by a single table column.
///
/// Mirrors the GetThis CSV/structured-output column types: everything that
/// can appear as a cell in the archive's index, independent of back-end
/// (CSV text vs. structured JSON).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Nothing,
    Bool,
    U32,
    U64,
    I64,
    Utf8,
    Utf16,
    Timestamp,
    BinaryFixed(usize),
    BinaryVariable,
    Guid,
    Enum(LabelTable),
    Flags(LabelTable),
    Xml,
}

/// Integer-to-label mapping used to render `Enum`/`Flags` columns.
///
/// `Flags` values are rendered `label1|label2|...` for every bit set in the
/// cell that has a matching label, falling back to the raw integer when no
/// label matches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTable(pub HashMap<u64, String>);

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, value: u64, label: impl Into<String>) -> Self {
        self.0.insert(value, label.into());
        self
    }

    pub fn label(&self, value: u64) -> Option<&str> {
        self.0.get(&value).map(String::as_str)
    }

    /// Renders a `Flags` cell: every label whose bit is set, joined by `|`.
    /// Returns `None` when no known flag bit matches, so the caller can
    /// fall back to the raw integer.
    pub fn render_flags(&self, value: u64) -> Option<String> {
        let mut parts = Vec::new();
        for (&bit, label) in &self.0 {
            if bit != 0 && value & bit == bit {
                parts.push(label.clone());
            }
        }
        if parts.is_empty() {
            None
        } else {
            parts.sort();
            Some(parts.join("|"))
        }
    }
}

/// A single named column in a `Schema`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub fixed_length: Option<usize>,
    pub max_length: Option<usize>,
    pub format_hint: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            fixed_length: None,
            max_length: None,
            format_hint: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format_hint = Some(format.into());
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// Ordered, immutable-after-first-write column list for a `TableSink`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }
}

/// The GetThis CSV profile column order. 29 columns in a fixed order —
/// do not reorder without updating `row::write_row` to match.
pub fn get_this_csv_schema() -> Schema {
    Schema::new(vec![
        Column::new("ComputerName", ColumnType::Utf8),
        Column::new("VolumeSerial", ColumnType::I64),
        Column::new("ParentFRN", ColumnType::U64).with_format("{:016X}"),
        Column::new("FRN", ColumnType::U64).with_format("{:016X}"),
        Column::new("FullPath", ColumnType::Utf8),
        Column::new("SampleName", ColumnType::Utf8),
        Column::new("SampleSize", ColumnType::U64),
        Column::new("MD5", ColumnType::BinaryVariable).with_format("{:02X}"),
        Column::new("SHA1", ColumnType::BinaryVariable).with_format("{:02X}"),
        Column::new("RuleDescription", ColumnType::Utf8),
        Column::new("ContentType", ColumnType::Utf8),
        Column::new("CollectionDate", ColumnType::Timestamp),
        Column::new("CreationDate", ColumnType::Timestamp),
        Column::new("LastModificationDate", ColumnType::Timestamp),
        Column::new("LastAccessDate", ColumnType::Timestamp),
        Column::new("LastAttrChangeDate", ColumnType::Timestamp),
        Column::new("FNCreationDate", ColumnType::Timestamp),
        Column::new("FNLastModificationDate", ColumnType::Timestamp),
        Column::new("FNLastAccessDate", ColumnType::Timestamp),
        Column::new("FNLastAttrModificationDate", ColumnType::Timestamp),
        Column::new("AttributeType", attribute_type_flags()),
        Column::new("AttributeName", ColumnType::Utf8),
        Column::new("InstanceID", ColumnType::U32),
        Column::new("SnapshotID", ColumnType::Guid),
        Column::new("SHA256", ColumnType::BinaryVariable).with_format("{:02X}"),
        Column::new("SSDeep", ColumnType::Utf8),
        Column::new("TLSH", ColumnType::Utf8),
        Column::new("YaraRules", ColumnType::Utf8),
        Column::new("RecordInUse", ColumnType::Bool),
    ])
}

fn attribute_type_flags() -> ColumnType {
    ColumnType::Flags(
        LabelTable::new()
            .with(0x1, "STANDARD_INFORMATION")
            .with(0x2, "FILE_NAME")
            .with(0x4, "DATA")
            .with(0x8, "INDEX_ALLOCATION")
            .with(0x10, "BITMAP")
            .with(0x20, "REPARSE_POINT"),
    )
}
