use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use orc_model::{Column, ColumnType, Schema};

use crate::error::{CoreError, Result};

use super::cell::Cell;
use super::format::{render_binary, render_timestamp, DEFAULT_TIMESTAMP_TEMPLATE};

#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub write_bom: bool,
    pub bool_true: String,
    pub bool_false: String,
    pub timestamp_template: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            write_bom: false,
            bool_true: "True".to_string(),
            bool_false: "False".to_string(),
            timestamp_template: DEFAULT_TIMESTAMP_TEMPLATE.to_string(),
        }
    }
}

/// CSV back-end for `TableSink`. Delegates quoting/escaping to the `csv`
/// crate's writer, which already doubles interior quote characters and
/// quotes fields containing the delimiter (the first/last quote marks
/// are not doubled, only interior ones, which is the crate's default
/// discipline).
struct SharedWriter<W>(Arc<Mutex<W>>);

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

pub struct CsvBackend<W: Write> {
    writer: csv::Writer<SharedWriter<W>>,
    sink: Arc<Mutex<W>>,
    options: CsvOptions,
    pending_row: Vec<String>,
    bom_written: bool,
    header_written: bool,
}

impl<W: Write> CsvBackend<W> {
    pub fn new(sink: W, options: CsvOptions) -> Self {
        let sink = Arc::new(Mutex::new(sink));
        let writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .has_headers(false)
            .from_writer(SharedWriter(sink.clone()));
        Self {
            writer,
            sink,
            options,
            pending_row: Vec::new(),
            bom_written: false,
            header_written: false,
        }
    }

    pub fn set_schema(&mut self, schema: &Schema) -> Result<()> {
        if !self.bom_written && self.options.write_bom {
            self.sink
                .lock()
                .write_all(&[0xEF, 0xBB, 0xBF])
                .map_err(CoreError::Io)?;
            self.bom_written = true;
        }
        if !self.header_written {
            let header: Vec<String> = schema.columns().iter().map(|c| c.name.clone()).collect();
            self.writer.write_record(&header).map_err(CoreError::Csv)?;
            self.header_written = true;
        }
        Ok(())
    }

    pub fn render(&self, cell: &Cell, column: &Column) -> String {
        match cell {
            Cell::Nothing => String::new(),
            Cell::Bool(b) => {
                if *b {
                    self.options.bool_true.clone()
                } else {
                    self.options.bool_false.clone()
                }
            }
            Cell::U32(v) => v.to_string(),
            Cell::U64(v) => v.to_string(),
            Cell::I64(v) => v.to_string(),
            Cell::Utf8(s) => s.clone(),
            Cell::Utf16(s) => s.clone(),
            Cell::Timestamp(ts) => render_timestamp(ts, &self.options.timestamp_template),
            Cell::Binary(bytes) => render_binary(bytes, column.format_hint.as_deref()),
            Cell::Guid(guid) => guid.to_string(),
            Cell::Enum(value) => render_label(column, *value, false),
            Cell::Flags(value) => render_label(column, *value, true),
            Cell::Xml(s) => s.clone(),
        }
    }

    pub fn push_cell(&mut self, rendered: String) {
        self.pending_row.push(rendered);
    }

    pub fn end_of_line(&mut self) -> Result<()> {
        let row = std::mem::take(&mut self.pending_row);
        self.writer.write_record(&row).map_err(CoreError::Csv)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(CoreError::Io)
    }

    pub fn close(&mut self) -> Result<()> {
        self.flush()
    }
}

fn render_label(column: &Column, value: u64, flags: bool) -> String {
    match &column.column_type {
        ColumnType::Enum(table) if !flags => table
            .label(value)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        ColumnType::Flags(table) if flags => table
            .render_flags(value)
            .unwrap_or_else(|| value.to_string()),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_model::{get_this_csv_schema, Column};

    #[test]
    fn header_row_written_once() {
        let mut backend = CsvBackend::new(Vec::new(), CsvOptions::default());
        let schema = get_this_csv_schema();
        backend.set_schema(&schema).unwrap();
        backend.set_schema(&schema).unwrap();
        assert!(backend.header_written);
    }

    #[test]
    fn renders_bool_with_configured_words() {
        let backend = CsvBackend::new(Vec::new(), CsvOptions::default());
        let col = Column::new("x", ColumnType::Bool);
        assert_eq!(backend.render(&Cell::Bool(true), &col), "True");
        assert_eq!(backend.render(&Cell::Bool(false), &col), "False");
    }
}
