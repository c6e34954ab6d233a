//! Column-major tables.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Version tag written into every table record.
pub const TABLE_RECORD_VERSION: &str = "2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub index: usize,
    pub name: Option<String>,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(index: usize, name: Option<String>, values: Vec<Value>) -> Self {
        Self {
            index,
            name,
            values,
        }
    }

    /// Header with runs of whitespace collapsed; `None` for missing or blank names.
    pub fn clean_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
        (!cleaned.is_empty()).then_some(cleaned)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A table stored column by column. All columns have the same number of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBasedTable {
    pub table_id: String,
    columns: Vec<Column>,
}

impl ColumnBasedTable {
    pub fn new(table_id: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(ModelError::RaggedColumn {
                    index: bad.index,
                    expected,
                    actual: bad.len(),
                });
            }
        }
        Ok(Self {
            table_id: table_id.into(),
            columns,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// `(nrows, ncols)`.
    pub fn shape(&self) -> (usize, usize) {
        match self.columns.first() {
            None => (0, 0),
            Some(col) => (col.len(), self.columns.len()),
        }
    }

    pub fn nrows(&self) -> usize {
        self.shape().0
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn get_column_by_index(&self, index: usize) -> Option<&Column> {
        self.columns.iter().find(|c| c.index == index)
    }

    /// Position of the column carrying `index` in [`Self::columns`].
    pub fn column_position(&self, index: usize) -> Option<usize> {
        self.columns.iter().position(|c| c.index == index)
    }

    /// Cell at `(row, column position)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.columns.get(col)?.values.get(row)
    }

    /// Rows `start..end`, clamped to the table.
    pub fn subset(&self, start: usize, end: usize) -> ColumnBasedTable {
        let end = end.min(self.nrows());
        let start = start.min(end);
        ColumnBasedTable {
            table_id: self.table_id.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.index, c.name.clone(), c.values[start..end].to_vec()))
                .collect(),
        }
    }

    /// New table made of `indices` rows, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<ColumnBasedTable> {
        let nrows = self.nrows();
        if let Some(&index) = indices.iter().find(|&&i| i >= nrows) {
            return Err(ModelError::RowOutOfRange { index, nrows });
        }
        Ok(ColumnBasedTable {
            table_id: self.table_id.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| {
                    Column::new(
                        c.index,
                        c.name.clone(),
                        indices.iter().map(|&i| c.values[i].clone()).collect(),
                    )
                })
                .collect(),
        })
    }

    /// Keep the columns whose `index` is listed, in the listed order. With
    /// `reindex` the kept columns are renumbered `0..n`.
    pub fn keep_columns(&self, columns: &[usize], reindex: bool) -> Result<ColumnBasedTable> {
        let mut kept = Vec::with_capacity(columns.len());
        for (new_index, &index) in columns.iter().enumerate() {
            let col = self
                .get_column_by_index(index)
                .ok_or(ModelError::MissingColumn(index))?;
            let mut col = col.clone();
            if reindex {
                col.index = new_index;
            }
            kept.push(col);
        }
        Ok(ColumnBasedTable {
            table_id: self.table_id.clone(),
            columns: kept,
        })
    }
}

#[derive(Serialize)]
struct TableRecordRef<'a> {
    version: &'static str,
    table_id: &'a str,
    columns: &'a [Column],
}

#[derive(Deserialize)]
struct TableRecord {
    version: Option<Value>,
    table_id: String,
    columns: Vec<Column>,
}

impl Serialize for ColumnBasedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        TableRecordRef {
            version: TABLE_RECORD_VERSION,
            table_id: &self.table_id,
            columns: &self.columns,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ColumnBasedTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rec = TableRecord::deserialize(deserializer)?;
        match rec.version.as_ref().and_then(Value::as_str) {
            Some(TABLE_RECORD_VERSION) => {}
            _ => {
                return Err(serde::de::Error::custom(ModelError::UnknownVersion {
                    kind: "table",
                    version: rec
                        .version
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "<missing>".to_string()),
                }))
            }
        }
        ColumnBasedTable::new(rec.table_id, rec.columns).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cities() -> ColumnBasedTable {
        ColumnBasedTable::new(
            "cities",
            vec![
                Column::new(0, Some("City".into()), vec![json!("Paris"), json!("Rome"), json!("Oslo")]),
                Column::new(1, Some(" Country \n".into()), vec![json!("France"), json!("Italy"), json!("Norway")]),
                Column::new(2, None, vec![json!(2_148_000), json!(2_873_000), json!(709_000)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn shape_and_cells() {
        let t = cities();
        assert_eq!(t.shape(), (3, 3));
        assert_eq!(t.cell(1, 0), Some(&json!("Rome")));
        assert_eq!(t.cell(3, 0), None);
        assert_eq!(t.columns()[1].clean_name().as_deref(), Some("Country"));
        assert_eq!(t.columns()[2].clean_name(), None);
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let err = ColumnBasedTable::new(
            "bad",
            vec![
                Column::new(0, None, vec![json!(1), json!(2)]),
                Column::new(1, None, vec![json!(1)]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::RaggedColumn { index: 1, .. }));
    }

    #[test]
    fn select_rows_follows_index_order() {
        let t = cities().select_rows(&[2, 0]).unwrap();
        assert_eq!(t.shape(), (2, 3));
        assert_eq!(t.cell(0, 0), Some(&json!("Oslo")));
        assert_eq!(t.cell(1, 0), Some(&json!("Paris")));
        assert!(cities().select_rows(&[5]).is_err());
    }

    #[test]
    fn keep_columns_with_and_without_reindex() {
        let t = cities();
        let kept = t.keep_columns(&[2, 0], false).unwrap();
        assert_eq!(
            kept.columns().iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![2, 0]
        );
        let kept = t.keep_columns(&[2, 0], true).unwrap();
        assert_eq!(
            kept.columns().iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert!(matches!(
            t.keep_columns(&[9], false),
            Err(ModelError::MissingColumn(9))
        ));
    }

    #[test]
    fn subset_clamps() {
        let t = cities().subset(1, 10);
        assert_eq!(t.nrows(), 2);
    }

    #[test]
    fn table_record_requires_version_2() {
        let ok: ColumnBasedTable = serde_json::from_value(json!({
            "version": "2",
            "table_id": "t",
            "columns": [{"index": 0, "name": "a", "values": [1, 2]}]
        }))
        .unwrap();
        assert_eq!(ok.shape(), (2, 1));

        let bad = serde_json::from_value::<ColumnBasedTable>(json!({
            "version": 2,
            "table_id": "t",
            "columns": []
        }));
        assert!(bad.is_err());
    }
}
