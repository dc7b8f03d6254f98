// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Columnar data sources.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use peniko::Color;

use crate::{Indices, Selection, Version};

/// One named column of a data source.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// Numeric values.
    Number(Arc<[f64]>),
    /// Strings (text labels, URLs, factors).
    Text(Arc<[String]>),
    /// Colors; `None` means "no paint".
    Color(Arc<[Option<Color>]>),
    /// One numeric list per record (multi-lines, patches).
    NumberList(Arc<[Vec<f64>]>),
}

impl Column {
    /// Number of records in the column.
    pub fn len(&self) -> usize {
        match self {
            Self::Number(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Color(v) => v.len(),
            Self::NumberList(v) => v.len(),
        }
    }

    /// Returns `true` if the column has no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns numeric values, if this is a numeric column.
    pub fn as_numbers(&self) -> Option<&[f64]> {
        match self {
            Self::Number(v) => Some(v),
            _ => None,
        }
    }

    /// Returns strings, if this is a text column.
    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns colors, if this is a color column.
    pub fn as_colors(&self) -> Option<&[Option<Color>]> {
        match self {
            Self::Color(v) => Some(v),
            _ => None,
        }
    }

    /// Returns per-record numeric lists, if this is a list column.
    pub fn as_number_lists(&self) -> Option<&[Vec<f64>]> {
        match self {
            Self::NumberList(v) => Some(v),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Color(_) => "color",
            Self::NumberList(_) => "number list",
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Self::Number(values.into())
    }
}

impl From<&[f64]> for Column {
    fn from(values: &[f64]) -> Self {
        Self::Number(values.into())
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Self::Text(values.into())
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Self::Text(values.into_iter().map(String::from).collect())
    }
}

impl From<Vec<Color>> for Column {
    fn from(values: Vec<Color>) -> Self {
        Self::Color(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<Vec<f64>>> for Column {
    fn from(values: Vec<Vec<f64>>) -> Self {
        Self::NumberList(values.into())
    }
}

/// Errors returned when mutating a [`ColumnDataSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// A column's length does not match the other columns.
    LengthMismatch {
        /// The offending column.
        column: String,
        /// Length of the existing columns.
        expected: usize,
        /// Length of the new column.
        found: usize,
    },
    /// The referenced column does not exist.
    MissingColumn(String),
    /// The referenced column has a different element type.
    TypeMismatch {
        /// The offending column.
        column: String,
        /// The column's actual type.
        found: &'static str,
    },
    /// A patch index is past the end of the column.
    IndexOutOfRange {
        /// The offending column.
        column: String,
        /// The requested record.
        index: usize,
        /// Number of records.
        len: usize,
    },
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                column,
                expected,
                found,
            } => write!(
                f,
                "column `{column}` has {found} records, expected {expected}"
            ),
            Self::MissingColumn(column) => write!(f, "no column named `{column}`"),
            Self::TypeMismatch { column, found } => {
                write!(f, "column `{column}` holds {found} values")
            }
            Self::IndexOutOfRange { column, index, len } => write!(
                f,
                "record {index} is out of range for column `{column}` of length {len}"
            ),
        }
    }
}

impl core::error::Error for DataSourceError {}

/// Read access to a columnar data source.
///
/// Glyph views read columns by name; a missing column makes the glyph fall back to the
/// property's scalar default. [`DataSource::version`] changes on every column mutation, which is
/// how consumers detect that per-record data must be rebuilt.
pub trait DataSource: fmt::Debug {
    /// Number of records.
    fn len(&self) -> usize;

    /// Returns `true` if there are no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a column by name.
    fn column(&self, name: &str) -> Option<&Column>;

    /// Monotonic change counter for the columns.
    fn version(&self) -> Version;

    /// Records currently selected.
    fn selected(&self) -> &Selection;

    /// Records currently inspected (hovered).
    fn inspected(&self) -> &Selection;

    /// Records flagged as muted.
    fn muted(&self) -> &Indices;
}

/// An owned set of equal-length named columns.
#[derive(Clone, Debug)]
pub struct ColumnDataSource {
    columns: HashMap<String, Column>,
    len: usize,
    version: Version,
    selected: Selection,
    inspected: Selection,
    muted: Indices,
}

impl ColumnDataSource {
    /// Creates an empty source with version `1`.
    pub fn new() -> Self {
        Self {
            columns: HashMap::new(),
            len: 0,
            version: 1,
            selected: Selection::empty(),
            inspected: Selection::empty(),
            muted: Indices::new(0),
        }
    }

    /// Adds a column, builder style.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: impl Into<Column>,
    ) -> Result<Self, DataSourceError> {
        self.set_column(name, column)?;
        Ok(self)
    }

    /// Inserts or replaces a column and bumps the version.
    ///
    /// All columns must have the same length; replacing the only column may change it.
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        column: impl Into<Column>,
    ) -> Result<(), DataSourceError> {
        let name = name.into();
        let column = column.into();
        let others = self.columns.keys().filter(|k| **k != name).count();
        if others > 0 && column.len() != self.len {
            return Err(DataSourceError::LengthMismatch {
                column: name,
                expected: self.len,
                found: column.len(),
            });
        }
        if column.len() != self.len {
            self.resize(column.len());
        }
        self.columns.insert(name, column);
        self.bump();
        Ok(())
    }

    /// Removes a column and bumps the version.
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let removed = self.columns.remove(name);
        if removed.is_some() {
            if self.columns.is_empty() {
                self.resize(0);
            }
            self.bump();
        }
        removed
    }

    /// Overwrites a single numeric value in place and bumps the version.
    pub fn patch(&mut self, name: &str, index: usize, value: f64) -> Result<(), DataSourceError> {
        let len = self.len;
        let Some(column) = self.columns.get_mut(name) else {
            return Err(DataSourceError::MissingColumn(name.to_string()));
        };
        let values = match column {
            Column::Number(values) => values,
            other => {
                return Err(DataSourceError::TypeMismatch {
                    column: name.to_string(),
                    found: other.kind(),
                });
            }
        };
        if index >= len {
            return Err(DataSourceError::IndexOutOfRange {
                column: name.to_string(),
                index,
                len,
            });
        }
        let mut owned: Vec<f64> = values.to_vec();
        owned[index] = value;
        *values = owned.into();
        self.bump();
        Ok(())
    }

    /// Names of all columns, in arbitrary order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Replaces the selected records.
    pub fn set_selected(&mut self, selection: Selection) {
        self.selected = selection;
    }

    /// Replaces the inspected (hovered) records.
    pub fn set_inspected(&mut self, selection: Selection) {
        self.inspected = selection;
    }

    /// Flags or unflags a record as muted.
    pub fn set_muted(&mut self, index: usize, muted: bool) {
        if muted {
            self.muted.insert(index);
        } else {
            self.muted.remove(index);
        }
    }

    /// Increments the version counter.
    pub fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn resize(&mut self, len: usize) {
        self.len = len;
        self.muted = Indices::from_indices(len, self.muted.iter());
        self.selected = Selection::from_indices(
            self.selected.indices().iter().copied().filter(|i| *i < len),
        );
        self.inspected = Selection::empty();
    }
}

impl Default for ColumnDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSource for ColumnDataSource {
    fn len(&self) -> usize {
        self.len
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    fn version(&self) -> Version {
        self.version
    }

    fn selected(&self) -> &Selection {
        &self.selected
    }

    fn inspected(&self) -> &Selection {
        &self.inspected
    }

    fn muted(&self) -> &Indices {
        &self.muted
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn mutations_bump_the_version() {
        let mut source = ColumnDataSource::new();
        let v0 = source.version();
        source.set_column("x", vec![0.0, 1.0, 2.0]).unwrap();
        let v1 = source.version();
        assert!(v1 > v0);
        source.patch("x", 1, 5.0).unwrap();
        assert!(source.version() > v1);
        assert_eq!(
            source.column("x").and_then(Column::as_numbers),
            Some(&[0.0, 5.0, 2.0][..])
        );
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let mut source = ColumnDataSource::new()
            .with_column("x", vec![0.0, 1.0])
            .unwrap();
        let err = source.set_column("y", vec![0.0]).unwrap_err();
        assert_eq!(
            err,
            DataSourceError::LengthMismatch {
                column: "y".into(),
                expected: 2,
                found: 1,
            }
        );
        // Replacing the only column may change the length.
        source.set_column("x", vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn muted_flags_follow_resizes() {
        let mut source = ColumnDataSource::new()
            .with_column("x", vec![0.0, 1.0, 2.0])
            .unwrap();
        source.set_muted(2, true);
        assert!(source.muted().contains(2));
        source.set_column("x", vec![0.0, 1.0]).unwrap();
        assert!(!source.muted().contains(2));
        assert_eq!(source.muted().size(), 2);
    }

    #[test]
    fn patch_reports_missing_columns() {
        let mut source = ColumnDataSource::new();
        assert_eq!(
            source.patch("nope", 0, 1.0),
            Err(DataSourceError::MissingColumn("nope".into()))
        );
    }
}
