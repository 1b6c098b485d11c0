//! Derived tables: the column-typed shape handed to the chart adapter.

use serde::{Deserialize, Serialize};

use crate::domain::{Cell, Field};

/// A row type with a fixed, declared set of columns.
pub trait Tabular {
    /// Columns in display order.
    const COLUMNS: &'static [Field];

    /// Value of `field` for this row, or `None` if the row has no such column.
    fn cell(&self, field: Field) -> Option<Cell>;
}

/// A generic snapshot of an aggregate: typed columns plus row cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedTable {
    pub columns: Vec<Field>,
    pub rows: Vec<Vec<Cell>>,
}

impl DerivedTable {
    pub fn from_rows<T: Tabular>(rows: &[T]) -> Self {
        let columns = T::COLUMNS.to_vec();
        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .filter_map(|field| row.cell(*field))
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, field: Field) -> Option<usize> {
        self.columns.iter().position(|f| *f == field)
    }

    pub fn has_column(&self, field: Field) -> bool {
        self.column_index(field).is_some()
    }

    /// Iterate one column's cells (empty if the column is absent).
    pub fn column(&self, field: Field) -> impl Iterator<Item = &Cell> + '_ {
        let idx = self.column_index(field);
        self.rows
            .iter()
            .filter_map(move |row| idx.and_then(|i| row.get(i)))
    }
}
