//! Table file formats and per-file compression codecs.

use crate::error::{DatasetError, Result};
use calamine::{open_workbook_from_rs, DataType, Reader, Xlsx};
use semtab_model::{Column, ColumnBasedTable, FullTable};
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use std::io::{Cursor, Read, Write};
use std::str::FromStr;

// ============================================================================
// Compression
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Gz,
    Bz2,
    Lz4,
}

impl Compression {
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Gz => "gz",
            Compression::Bz2 => "bz2",
            Compression::Lz4 => "lz4",
        }
    }

    /// Codec for a file extension given without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "gz" => Some(Compression::Gz),
            "bz2" => Some(Compression::Bz2),
            "lz4" => Some(Compression::Lz4),
            _ => None,
        }
    }

    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::Gz => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Compression::Bz2 => {
                let mut encoder =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Compression::Lz4 => {
                let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
                encoder.write_all(data)?;
                encoder
                    .finish()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e).into())
            }
        }
    }

    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Compression::Gz => {
                flate2::read::GzDecoder::new(data).read_to_end(&mut out)?;
            }
            Compression::Bz2 => {
                bzip2::read::BzDecoder::new(data).read_to_end(&mut out)?;
            }
            Compression::Lz4 => {
                lz4_flex::frame::FrameDecoder::new(data).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

impl FromStr for Compression {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        Compression::from_extension(s).ok_or_else(|| DatasetError::UnsupportedFormat {
            kind: "compression",
            tag: s.to_string(),
        })
    }
}

// ============================================================================
// Table formats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Json,
    Csv,
    Xlsx,
}

impl TableFormat {
    /// Format for a suffix such as `.json`.
    pub fn from_suffix(suffix: &str) -> Result<Self> {
        match suffix {
            ".json" => Ok(TableFormat::Json),
            ".csv" => Ok(TableFormat::Csv),
            ".xlsx" => Ok(TableFormat::Xlsx),
            other => Err(DatasetError::UnsupportedFormat {
                kind: "table file type",
                tag: other.to_string(),
            }),
        }
    }
}

/// Decode one table file. CSV/XLSX tables get an empty context and no links.
pub fn decode_table(table_id: &str, data: &[u8], format: TableFormat) -> Result<FullTable> {
    match format {
        TableFormat::Json => {
            let value: Value = serde_json::from_slice(data)?;
            Ok(FullTable::from_record(value)?)
        }
        TableFormat::Csv => Ok(FullTable::from_table(read_csv(table_id, data)?)),
        TableFormat::Xlsx => Ok(FullTable::from_table(read_xlsx(table_id, data)?)),
    }
}

fn header_name(ci: usize, raw: &str) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {ci}")
    } else {
        raw.to_string()
    }
}

fn infer_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return json!(v);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn columns_from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Vec<Column> {
    let mut values: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); headers.len()];
    for row in rows {
        for (ci, cell) in row.into_iter().enumerate() {
            if let Some(col) = values.get_mut(ci) {
                col.push(cell);
            }
        }
    }
    headers
        .into_iter()
        .zip(values)
        .enumerate()
        .map(|(ci, (name, values))| Column::new(ci, Some(name), values))
        .collect()
}

/// Parse a CSV file whose first row is the header.
pub fn read_csv(table_id: &str, data: &[u8]) -> Result<ColumnBasedTable> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(data);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(ci, h)| header_name(ci, h))
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(infer_cell).collect());
    }
    Ok(ColumnBasedTable::new(table_id, columns_from_rows(headers, rows))?)
}

fn xlsx_cell(cell: &DataType) -> Value {
    match cell {
        DataType::Empty => Value::Null,
        DataType::Int(v) => json!(v),
        DataType::Bool(v) => json!(v),
        DataType::String(v) => json!(v),
        DataType::Float(v) if v.fract() == 0.0 && v.abs() < 9.007_199_254_740_992e15 => {
            json!(*v as i64)
        }
        DataType::Float(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
        other => json!(other.to_string()),
    }
}

/// Parse the first worksheet of an XLSX workbook; its first row is the header.
pub fn read_xlsx(table_id: &str, data: &[u8]) -> Result<ColumnBasedTable> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DatasetError::InvalidLayout(format!("workbook `{table_id}` has no sheets")))??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(ci, cell)| header_name(ci, &cell.to_string()))
            .collect(),
        None => Vec::new(),
    };
    let rows = rows.map(|row| row.iter().map(xlsx_cell).collect()).collect();
    Ok(ColumnBasedTable::new(table_id, columns_from_rows(headers, rows))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_round_trip_each_codec() {
        let payload = br#"{"version": 2, "table": {}}"#.repeat(20);
        for codec in [Compression::Gz, Compression::Bz2, Compression::Lz4] {
            let packed = codec.compress(&payload).unwrap();
            assert_ne!(packed, payload);
            assert_eq!(codec.decompress(&packed).unwrap(), payload, "{codec:?}");
        }
    }

    #[test]
    fn unknown_codec_and_format() {
        assert!(matches!(
            "zst".parse::<Compression>(),
            Err(DatasetError::UnsupportedFormat { kind: "compression", .. })
        ));
        assert!(matches!(
            TableFormat::from_suffix(".parquet"),
            Err(DatasetError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn csv_with_inferred_cells() {
        let data = b"name,population,,capital\nParis,2.1,x,true\nLyon,,y,FALSE\n";
        let table = read_csv("fr", data).unwrap();
        assert_eq!(table.shape(), (2, 4));
        assert_eq!(table.columns()[2].name.as_deref(), Some("Unnamed: 2"));
        assert_eq!(table.cell(0, 1), Some(&json!(2.1)));
        assert_eq!(table.cell(1, 1), Some(&Value::Null));
        assert_eq!(table.cell(1, 3), Some(&json!(false)));

        let full = decode_table("fr", data, TableFormat::Csv).unwrap();
        assert_eq!(full.links.shape().unwrap(), (2, 4));
        assert_eq!(full.id(), "fr");
    }
}
