//! A table together with its page context and per-cell links.

use crate::context::Context;
use crate::error::{ModelError, Result};
use crate::link::Link;
use crate::matrix::Matrix;
use crate::semantic_model::SemanticModel;
use crate::table::ColumnBasedTable;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct FullTable {
    pub table: ColumnBasedTable,
    pub context: Context,
    /// One list of links per cell; same shape as `table`.
    pub links: Matrix<Vec<Link>>,
}

fn check_links_shape(table: &ColumnBasedTable, links: &Matrix<Vec<Link>>) -> Result<()> {
    let expected = table.shape();
    let actual = links.shape()?;
    // a table with columns but no rows has no link rows either
    if actual == expected || (expected.0 == 0 && actual.0 == 0) {
        return Ok(());
    }
    Err(ModelError::ShapeMismatch {
        what: "links",
        expected,
        actual,
    })
}

impl FullTable {
    pub fn new(table: ColumnBasedTable, context: Context, links: Matrix<Vec<Link>>) -> Result<Self> {
        check_links_shape(&table, &links)?;
        Ok(Self {
            table,
            context,
            links,
        })
    }

    /// A table with an empty context and no links.
    pub fn from_table(table: ColumnBasedTable) -> Self {
        let links = Matrix::default_of_shape(table.shape());
        Self {
            table,
            context: Context::default(),
            links,
        }
    }

    pub fn id(&self) -> &str {
        &self.table.table_id
    }

    pub fn nrows(&self) -> usize {
        self.table.nrows()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.table.shape()
    }

    /// Rows `indices`, in exactly that order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<FullTable> {
        let table = self.table.select_rows(indices)?;
        let links = Matrix::new(
            indices
                .iter()
                .map(|&i| self.links.data.get(i).cloned().unwrap_or_default())
                .collect(),
        );
        FullTable::new(table, self.context.clone(), links)
    }

    /// Keep the columns with the given column indices (see
    /// [`ColumnBasedTable::keep_columns`]); links follow their columns.
    pub fn keep_columns(&self, columns: &[usize], reindex: bool) -> Result<FullTable> {
        let positions = columns
            .iter()
            .map(|&ci| {
                self.table
                    .column_position(ci)
                    .ok_or(ModelError::MissingColumn(ci))
            })
            .collect::<Result<Vec<_>>>()?;
        let table = self.table.keep_columns(columns, reindex)?;
        let links = Matrix::new(
            self.links
                .data
                .iter()
                .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
                .collect(),
        );
        FullTable::new(table, self.context.clone(), links)
    }

    /// Drop zero-width links.
    pub fn remove_empty_links(self) -> FullTable {
        FullTable {
            table: self.table,
            context: self.context,
            links: self.links.map(|cell| {
                cell.into_iter()
                    .filter(|link| link.end > link.start)
                    .collect()
            }),
        }
    }

    /// Current-version (`2`) record of this table.
    pub fn to_record(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a full-table record. Accepts record versions `"1.1"`, `"1.2"`
    /// and `2`; a record without `links` gets an empty link matrix.
    pub fn from_record(mut value: Value) -> Result<Self> {
        let version = value.get("version").cloned().unwrap_or(Value::Null);
        let known = matches!(&version, Value::String(s) if s == "1.1" || s == "1.2")
            || version.as_u64() == Some(2);
        if !known {
            return Err(ModelError::UnknownVersion {
                kind: "full table",
                version: version.to_string(),
            });
        }

        let obj = value
            .as_object_mut()
            .ok_or_else(|| ModelError::InvalidRecord("full table record is not an object".into()))?;
        let table: ColumnBasedTable = serde_json::from_value(
            obj.remove("table")
                .ok_or_else(|| ModelError::InvalidRecord("missing `table`".into()))?,
        )?;
        let context = Context::from_record(
            obj.remove("context")
                .ok_or_else(|| ModelError::InvalidRecord("missing `context`".into()))?,
        )?;
        let links = match obj.remove("links") {
            Some(links) => serde_json::from_value::<Matrix<Vec<Link>>>(links)?,
            None => Matrix::default_of_shape(table.shape()),
        };
        FullTable::new(table, context, links)
    }
}

#[derive(Serialize)]
struct FullTableRecordRef<'a> {
    version: u8,
    table: &'a ColumnBasedTable,
    context: &'a Context,
    links: &'a Matrix<Vec<Link>>,
}

impl Serialize for FullTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        FullTableRecordRef {
            version: 2,
            table: &self.table,
            context: &self.context,
            links: &self.links,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FullTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FullTable::from_record(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Examples
// ============================================================================

/// A labeled instance: a table and the semantic models describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Example<T> {
    pub id: String,
    pub sms: Vec<SemanticModel>,
    pub table: T,
}

impl<T> Example<T> {
    pub fn replace_table<U>(self, table: U) -> Example<U> {
        Example {
            id: self.id,
            sms: self.sms,
            table,
        }
    }
}

impl Example<FullTable> {
    pub fn new(sms: Vec<SemanticModel>, table: FullTable) -> Self {
        Self {
            id: table.table.table_id.clone(),
            sms,
            table,
        }
    }
}

/// Tables whose rows can be subsampled.
pub trait Sampleable: Sized {
    fn nrows(&self) -> usize;
    fn select_rows(&self, indices: &[usize]) -> Result<Self>;
}

impl Sampleable for FullTable {
    fn nrows(&self) -> usize {
        FullTable::nrows(self)
    }

    fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        FullTable::select_rows(self, indices)
    }
}

impl Sampleable for ColumnBasedTable {
    fn nrows(&self) -> usize {
        ColumnBasedTable::nrows(self)
    }

    fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        ColumnBasedTable::select_rows(self, indices)
    }
}
