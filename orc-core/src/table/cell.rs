use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One written cell value, tagged by the semantic type it was written as.
/// `Nothing` covers both `write_nothing()` and a failed conversion (spec:
/// "a failed conversion counts as a successful nothing and proceeds").
#[derive(Clone, Debug)]
pub enum Cell {
    Nothing,
    Bool(bool),
    U32(u32),
    U64(u64),
    I64(i64),
    Utf8(String),
    Utf16(String),
    Timestamp(DateTime<Utc>),
    Binary(Vec<u8>),
    Guid(Uuid),
    Enum(u64),
    Flags(u64),
    Xml(String),
}

impl Cell {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Cell::Nothing)
    }
}
