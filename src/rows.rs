use crate::{Cursor, Result, Value};
use std::sync::Arc;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Box<[Value]>,
}

impl Row {
    pub fn new(labels: RowNames, values: Box<[Value]>) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|label| label == name)
            .and_then(|i| self.values.get(i))
    }
}

/// Label of the synthetic column carrying a generated key.
pub const GENERATED_KEY_LABEL: &str = "last_insert_rowid";

/// Result installed by an execute call.
///
/// Either a live cursor over the rows a query produced, or a synthetic
/// one-row, one-column result carrying the key generated by an insert. Both
/// variants share the same iteration contract; the cursor variant is strictly
/// forward-only and read-only.
pub enum Rows<'c> {
    Cursor(Cursor<'c>),
    Key(KeyRow),
}

/// Single synthetic row holding the row id produced by an insert.
pub struct KeyRow {
    value: i64,
    labels: RowNames,
    consumed: bool,
}

impl KeyRow {
    pub(crate) fn new(value: i64) -> Self {
        Self {
            value,
            labels: vec![GENERATED_KEY_LABEL.to_string()].into(),
            consumed: false,
        }
    }

    /// The generated key itself.
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl<'c> Rows<'c> {
    pub fn is_cursor(&self) -> bool {
        matches!(self, Rows::Cursor(..))
    }

    pub fn labels(&self) -> &RowNames {
        match self {
            Rows::Cursor(cursor) => cursor.labels(),
            Rows::Key(key) => &key.labels,
        }
    }

    /// Next row of the result, `None` once exhausted.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        match self {
            Rows::Cursor(cursor) => cursor.next_row(),
            Rows::Key(key) => {
                if key.consumed {
                    return Ok(None);
                }
                key.consumed = true;
                Ok(Some(Row::new(
                    key.labels.clone(),
                    vec![Value::Integer(key.value)].into_boxed_slice(),
                )))
            }
        }
    }

    /// Releases whatever the result holds. Closing twice is a no-op.
    pub fn close(&mut self) {
        match self {
            Rows::Cursor(cursor) => cursor.close(),
            Rows::Key(key) => key.consumed = true,
        }
    }
}
