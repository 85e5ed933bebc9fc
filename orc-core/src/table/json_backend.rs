use std::io::Write;

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

use super::cell::Cell;
use super::format::render_timestamp;
use super::format::DEFAULT_TIMESTAMP_TEMPLATE;

#[derive(Clone, Debug)]
pub struct JsonOptions {
    pub pretty: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self { pretty: false }
    }
}

enum Frame {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl Frame {
    fn into_value(self) -> Value {
        match self {
            Frame::Object(map) => Value::Object(map),
            Frame::Array(items) => Value::Array(items),
        }
    }
}

/// Structured (JSON) back-end for `TableSink`. Each row is an object;
/// `begin_element`/`end_element`/`begin_collection`/`end_collection`
/// compose nested documents inside it. Row emission is deferred until
/// `end_of_line` so a crash mid-row cannot produce a truncated document
/// in the committed output — the atomic-row discipline required of every
/// back-end.
pub struct JsonBackend<W: Write> {
    sink: W,
    options: JsonOptions,
    stack: Vec<(Option<String>, Frame)>,
    array_opened: bool,
    rows_written: u64,
    closed: bool,
}

impl<W: Write> JsonBackend<W> {
    pub fn new(sink: W, options: JsonOptions) -> Self {
        Self {
            sink,
            options,
            stack: Vec::new(),
            array_opened: false,
            rows_written: 0,
            closed: false,
        }
    }

    fn ensure_root(&mut self) {
        if self.stack.is_empty() {
            self.stack.push((None, Frame::Object(Map::new())));
        }
    }

    pub fn begin_element(&mut self, name: &str) {
        self.ensure_root();
        self.stack
            .push((Some(name.to_string()), Frame::Object(Map::new())));
    }

    pub fn end_element(&mut self) -> Result<()> {
        self.pop_into_parent()
    }

    pub fn begin_collection(&mut self, name: &str) {
        self.ensure_root();
        self.stack
            .push((Some(name.to_string()), Frame::Array(Vec::new())));
    }

    pub fn end_collection(&mut self) -> Result<()> {
        self.pop_into_parent()
    }

    fn pop_into_parent(&mut self) -> Result<()> {
        let (name, frame) = self.stack.pop().ok_or_else(|| {
            CoreError::IntegrityViolation("end_element/end_collection with no open frame".into())
        })?;
        let name = name.ok_or_else(|| {
            CoreError::IntegrityViolation("cannot close the row root as a nested element".into())
        })?;
        let value = frame.into_value();
        self.insert_named(&name, value);
        Ok(())
    }

    fn insert_named(&mut self, key: &str, value: Value) {
        self.ensure_root();
        match &mut self.stack.last_mut().unwrap().1 {
            Frame::Object(map) => {
                map.insert(key.to_string(), value);
            }
            Frame::Array(items) => items.push(value),
        }
    }

    pub fn push_cell(&mut self, key: &str, cell: &Cell, as_hex: bool) {
        let value = cell_to_value(cell, as_hex);
        self.insert_named(key, value);
    }

    pub fn end_of_line(&mut self) -> Result<()> {
        if self.stack.len() != 1 {
            return Err(CoreError::IntegrityViolation(
                "end_of_line with unclosed nested element".into(),
            ));
        }
        let (_, frame) = self.stack.pop().unwrap();
        let row = frame.into_value();

        if !self.array_opened {
            self.sink.write_all(b"[").map_err(CoreError::Io)?;
            self.array_opened = true;
        } else {
            self.sink.write_all(b",").map_err(CoreError::Io)?;
        }
        if self.options.pretty {
            self.sink.write_all(b"\n  ").map_err(CoreError::Io)?;
            let text = serde_json::to_string_pretty(&row).map_err(CoreError::Json)?;
            self.sink.write_all(text.as_bytes()).map_err(CoreError::Io)?;
        } else {
            serde_json::to_writer(&mut self.sink, &row).map_err(CoreError::Json)?;
        }
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush().map_err(CoreError::Io)
    }

    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if !self.array_opened {
            self.sink.write_all(b"[").map_err(CoreError::Io)?;
        }
        if self.options.pretty {
            self.sink.write_all(b"\n]\n").map_err(CoreError::Io)?;
        } else {
            self.sink.write_all(b"]").map_err(CoreError::Io)?;
        }
        self.flush()?;
        self.closed = true;
        Ok(())
    }
}

fn cell_to_value(cell: &Cell, as_hex: bool) -> Value {
    match cell {
        Cell::Nothing => Value::Null,
        Cell::Bool(b) => Value::Bool(*b),
        Cell::U32(v) => {
            if as_hex {
                Value::String(format!("{v:08X}"))
            } else {
                Value::Number((*v).into())
            }
        }
        Cell::U64(v) => {
            if as_hex {
                Value::String(format!("{v:016X}"))
            } else {
                Value::Number((*v).into())
            }
        }
        Cell::I64(v) => {
            if as_hex {
                Value::String(format!("{v:016X}"))
            } else {
                Value::Number((*v).into())
            }
        }
        Cell::Utf8(s) | Cell::Utf16(s) | Cell::Xml(s) => Value::String(s.clone()),
        Cell::Timestamp(ts) => Value::String(render_timestamp(ts, DEFAULT_TIMESTAMP_TEMPLATE)),
        Cell::Binary(bytes) => Value::String(hex::encode_upper(bytes)),
        Cell::Guid(guid) => Value::String(guid.to_string()),
        Cell::Enum(v) | Cell::Flags(v) => Value::Number((*v).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_is_not_emitted_until_end_of_line() {
        let mut backend = JsonBackend::new(Vec::new(), JsonOptions::default());
        backend.push_cell("a", &Cell::U32(1), false);
        assert!(backend.sink.is_empty());
        backend.end_of_line().unwrap();
        assert!(!backend.sink.is_empty());
    }

    #[test]
    fn nested_element_closes_into_parent() {
        let mut backend = JsonBackend::new(Vec::new(), JsonOptions::default());
        backend.push_cell("name", &Cell::Utf8("cfg".into()), false);
        backend.begin_element("nested");
        backend.push_cell("inner", &Cell::U32(7), false);
        backend.end_element().unwrap();
        backend.end_of_line().unwrap();
        backend.close().unwrap();
        let text = String::from_utf8(backend.sink).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["nested"]["inner"], 7);
    }

    #[test]
    fn hex_flag_renders_integers_as_strings() {
        assert_eq!(cell_to_value(&Cell::U64(255), true), Value::String("00000000000000FF".into()));
        assert_eq!(cell_to_value(&Cell::U64(255), false), Value::Number(255.into()));
    }
}
