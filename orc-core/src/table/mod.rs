//! Buffered, schema-validated tabular writer with CSV and structured-JSON
//! back-ends (spec's "Model as a single `TableSink` capability with
//! variant back-ends; avoid deep hierarchies"). A mutex guards the whole
//! sink so `flush`/`write_*` calls from a single collector thread are
//! always serialised, matching the concurrency model's description of
//! the sink's shared-resource discipline.

mod cell;
mod csv_backend;
mod format;
mod json_backend;

pub use cell::Cell;
pub use csv_backend::CsvOptions;
pub use format::{render_binary, render_timestamp};
pub use json_backend::JsonOptions;

use std::io::Write;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use orc_model::Schema;

use crate::error::{CoreError, Result};
use csv_backend::CsvBackend;
use json_backend::JsonBackend;

/// Default high-water mark before a `write_*` call forces a best-effort
/// flush: 256 KiB of rendered cell text.
pub const DEFAULT_HIGH_WATER_MARK: usize = 256 * 1024;

enum Backend<W: Write> {
    Csv(CsvBackend<W>),
    Json(JsonBackend<W>),
}

struct Inner<W: Write> {
    backend: Backend<W>,
    schema: Option<Schema>,
    column_index: usize,
    buffered_bytes: usize,
    high_water_mark: usize,
}

pub struct TableSink<W: Write + Send> {
    inner: Mutex<Inner<W>>,
}

impl<W: Write + Send> TableSink<W> {
    pub fn csv(sink: W, options: CsvOptions) -> Self {
        Self::with_high_water_mark(Backend::Csv(CsvBackend::new(sink, options)), DEFAULT_HIGH_WATER_MARK)
    }

    pub fn json(sink: W, options: JsonOptions) -> Self {
        Self::with_high_water_mark(Backend::Json(JsonBackend::new(sink, options)), DEFAULT_HIGH_WATER_MARK)
    }

    fn with_high_water_mark(backend: Backend<W>, high_water_mark: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                backend,
                schema: None,
                column_index: 0,
                buffered_bytes: 0,
                high_water_mark,
            }),
        }
    }

    /// Idempotent: a schema already set is left untouched (schema-identity
    /// assertion is not enforced here).
    pub fn set_schema(&self, schema: Schema) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.schema.is_some() {
            return Ok(());
        }
        if let Backend::Csv(csv) = &mut inner.backend {
            csv.set_schema(&schema)?;
        }
        inner.schema = Some(schema);
        Ok(())
    }

    pub fn write_cell(&self, cell: Cell) -> Result<()> {
        self.write_cell_hex(cell, false)
    }

    pub fn write_cell_hex(&self, cell: Cell, hex: bool) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = inner.column_index;
        let column = inner.schema.as_ref().and_then(|s| s.column(idx)).cloned();

        let bytes_added = match &mut inner.backend {
            Backend::Csv(csv) => {
                let rendered = match &column {
                    Some(col) => csv.render(&cell, col),
                    None => format!("{cell:?}"),
                };
                let len = rendered.len();
                csv.push_cell(rendered);
                len
            }
            Backend::Json(json) => {
                let key = column
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| format!("col{idx}"));
                json.push_cell(&key, &cell, hex);
                64
            }
        };

        inner.buffered_bytes += bytes_added;
        inner.column_index += 1;
        self.maybe_autoflush(&mut inner);
        Ok(())
    }

    pub fn write_bool(&self, v: bool) -> Result<()> {
        self.write_cell(Cell::Bool(v))
    }
    pub fn write_u32(&self, v: u32) -> Result<()> {
        self.write_cell(Cell::U32(v))
    }
    pub fn write_u64(&self, v: u64) -> Result<()> {
        self.write_cell(Cell::U64(v))
    }
    pub fn write_i64(&self, v: i64) -> Result<()> {
        self.write_cell(Cell::I64(v))
    }
    pub fn write_utf8(&self, v: impl Into<String>) -> Result<()> {
        self.write_cell(Cell::Utf8(v.into()))
    }
    pub fn write_timestamp(&self, v: DateTime<Utc>) -> Result<()> {
        self.write_cell(Cell::Timestamp(v))
    }
    pub fn write_binary(&self, v: impl Into<Vec<u8>>) -> Result<()> {
        self.write_cell(Cell::Binary(v.into()))
    }
    pub fn write_guid(&self, v: Uuid) -> Result<()> {
        self.write_cell(Cell::Guid(v))
    }
    pub fn write_enum(&self, v: u64) -> Result<()> {
        self.write_cell(Cell::Enum(v))
    }
    pub fn write_flags(&self, v: u64) -> Result<()> {
        self.write_cell(Cell::Flags(v))
    }

    pub fn write_nothing(&self) -> Result<()> {
        self.write_cell(Cell::Nothing)
    }

    pub fn abandon_column(&self) -> Result<()> {
        self.write_nothing()
    }

    pub fn abandon_row(&self) -> Result<()> {
        loop {
            let remaining = {
                let inner = self.inner.lock();
                let width = inner.schema.as_ref().map(|s| s.width()).unwrap_or(0);
                width.saturating_sub(inner.column_index)
            };
            if remaining == 0 {
                break;
            }
            self.write_nothing()?;
        }
        Ok(())
    }

    pub fn end_of_line(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let width = inner.schema.as_ref().map(|s| s.width()).unwrap_or(0);
        let written = inner.column_index;
        if written != width {
            return Err(CoreError::IntegrityViolation(format!(
                "row wrote {written} columns, schema has {width}"
            )));
        }
        match &mut inner.backend {
            Backend::Csv(csv) => csv.end_of_line()?,
            Backend::Json(json) => json.end_of_line()?,
        }
        inner.column_index = 0;
        self.maybe_autoflush(&mut inner);
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::flush_locked(&mut inner)
    }

    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let result = match &mut inner.backend {
            Backend::Csv(csv) => csv.close(),
            Backend::Json(json) => json.close(),
        };
        inner.buffered_bytes = 0;
        result
    }

    fn flush_locked(inner: &mut Inner<W>) -> Result<()> {
        let result = match &mut inner.backend {
            Backend::Csv(csv) => csv.flush(),
            Backend::Json(json) => json.flush(),
        };
        // Buffer is cleared regardless of I/O outcome so a write error
        // cannot cause unbounded growth.
        inner.buffered_bytes = 0;
        result
    }

    fn maybe_autoflush(&self, inner: &mut Inner<W>) {
        if inner.buffered_bytes >= inner.high_water_mark {
            let _ = Self::flush_locked(inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_model::{get_this_csv_schema, Column, ColumnType};

    #[test]
    fn fewer_writes_than_schema_width_is_fatal() {
        let schema = Schema::new(vec![
            Column::new("a", ColumnType::U32),
            Column::new("b", ColumnType::U32),
        ]);
        let sink = TableSink::csv(Vec::new(), CsvOptions::default());
        sink.set_schema(schema).unwrap();
        sink.write_u32(1).unwrap();
        assert!(sink.end_of_line().is_err());
    }

    #[test]
    fn more_writes_than_schema_width_is_fatal() {
        let schema = Schema::new(vec![Column::new("a", ColumnType::U32)]);
        let sink = TableSink::csv(Vec::new(), CsvOptions::default());
        sink.set_schema(schema).unwrap();
        sink.write_u32(1).unwrap();
        sink.write_u32(2).unwrap();
        assert!(sink.end_of_line().is_err());
    }

    #[test]
    fn exact_width_row_succeeds_and_resets_for_next_row() {
        let schema = Schema::new(vec![
            Column::new("a", ColumnType::U32),
            Column::new("b", ColumnType::Utf8),
        ]);
        let sink = TableSink::csv(Vec::new(), CsvOptions::default());
        sink.set_schema(schema).unwrap();
        sink.write_u32(1).unwrap();
        sink.write_utf8("x").unwrap();
        sink.end_of_line().unwrap();
        sink.write_u32(2).unwrap();
        sink.write_utf8("y").unwrap();
        sink.end_of_line().unwrap();
    }

    #[test]
    fn full_get_this_schema_round_trips_one_row() {
        let schema = get_this_csv_schema();
        let width = schema.width();
        let sink = TableSink::csv(Vec::new(), CsvOptions::default());
        sink.set_schema(schema).unwrap();
        for _ in 0..width {
            sink.write_nothing().unwrap();
        }
        sink.end_of_line().unwrap();
    }
}
