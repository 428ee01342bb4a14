use anyhow::{Context, Result};
use std::io::Write;

use crate::flatten::types::Row;

/// Writes rows as line-delimited JSON: one self-contained object per line.
pub struct RowWriter<W: Write> {
    writer: W,
    rows: usize,
}

impl<W: Write> RowWriter<W> {
    pub fn new(writer: W) -> Self {
        RowWriter { writer, rows: 0 }
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let line = serde_json::to_string(row).context("Failed to serialize row")?;
        writeln!(self.writer, "{}", line).context("Failed to write row")?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far.
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush output")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_one_line_per_row() {
        let mut writer = RowWriter::new(Vec::new());

        let row = json!({"a.b": 1, "c": "x"}).as_object().unwrap().clone();
        writer.write_row(&row).unwrap();
        let row = json!({"a.b": 2, "c": "y"}).as_object().unwrap().clone();
        writer.write_row(&row).unwrap();

        assert_eq!(writer.rows_written(), 2);

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(lines[0]).unwrap(),
            json!({"a.b": 1, "c": "x"})
        );
    }
}
