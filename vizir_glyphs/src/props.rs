// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph property specifications and their resolution against a data source.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use peniko::Color;
use vizir_core::{Column, DataSource, Uniform};

use crate::mapper::Units;

/// Errors detected while resolving a glyph's configuration against its data.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecError {
    /// A field refers to a column holding a different element type.
    TypeMismatch {
        /// The property being resolved.
        property: &'static str,
        /// The column name.
        field: String,
        /// The element type the property expects.
        expected: &'static str,
    },
    /// A scalar value is outside the property's valid range.
    InvalidValue {
        /// The property being resolved.
        property: &'static str,
        /// The rejected value.
        value: f64,
    },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch {
                property,
                field,
                expected,
            } => write!(
                f,
                "property `{property}` expects {expected} values but column `{field}` holds another type"
            ),
            Self::InvalidValue { property, value } => {
                write!(f, "invalid value {value} for property `{property}`")
            }
        }
    }
}

impl core::error::Error for SpecError {}

/// A property that is either one value for every record or a column of per-record values.
#[derive(Clone, Debug, PartialEq)]
pub enum VectorSpec<T> {
    /// The same value for all records.
    Value(T),
    /// Values read from the named column.
    Field(String),
}

impl<T> VectorSpec<T> {
    /// Reads values from a column.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Returns the scalar value, if this is not a field.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Field(_) => None,
        }
    }
}

impl<T> From<T> for VectorSpec<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

/// Element types that can be read from a [`Column`].
pub trait ColumnValue: Clone + fmt::Debug + PartialEq + Sized {
    /// Name of the element type, for error messages.
    const KIND: &'static str;

    /// Copies the column's values, or returns `None` for a type mismatch.
    fn read(column: &Column) -> Option<Vec<Self>>;
}

impl ColumnValue for f64 {
    const KIND: &'static str = "number";

    fn read(column: &Column) -> Option<Vec<Self>> {
        column.as_numbers().map(<[f64]>::to_vec)
    }
}

impl ColumnValue for String {
    const KIND: &'static str = "text";

    fn read(column: &Column) -> Option<Vec<Self>> {
        column.as_text().map(<[String]>::to_vec)
    }
}

impl ColumnValue for Option<Color> {
    const KIND: &'static str = "color";

    fn read(column: &Column) -> Option<Vec<Self>> {
        column.as_colors().map(<[Option<Color>]>::to_vec)
    }
}

impl ColumnValue for Vec<f64> {
    const KIND: &'static str = "number list";

    fn read(column: &Column) -> Option<Vec<Self>> {
        column.as_number_lists().map(<[Vec<f64>]>::to_vec)
    }
}

impl<T: ColumnValue> VectorSpec<T> {
    /// Resolves the property for every record of `source`.
    ///
    /// A field naming a missing column falls back to `fallback` for every record.
    pub fn resolve(
        &self,
        property: &'static str,
        source: &dyn DataSource,
        fallback: &T,
    ) -> Result<Uniform<T>, SpecError> {
        let n = source.len();
        match self {
            Self::Value(v) => Ok(Uniform::scalar(v.clone(), n)),
            Self::Field(name) => match source.column(name) {
                None => {
                    log::debug!("`{property}`: no column `{name}`, using {fallback:?}");
                    Ok(Uniform::scalar(fallback.clone(), n))
                }
                Some(column) => T::read(column).map(Uniform::vector).ok_or_else(|| {
                    SpecError::TypeMismatch {
                        property,
                        field: name.clone(),
                        expected: T::KIND,
                    }
                }),
            },
        }
    }
}

impl VectorSpec<f64> {
    /// Like [`VectorSpec::resolve`], rejecting negative scalar values.
    pub fn resolve_non_negative(
        &self,
        property: &'static str,
        source: &dyn DataSource,
        fallback: f64,
    ) -> Result<Uniform<f64>, SpecError> {
        if let Self::Value(v) = self
            && *v < 0.0
        {
            return Err(SpecError::InvalidValue {
                property,
                value: *v,
            });
        }
        self.resolve(property, source, &fallback)
    }
}

/// A coordinate or distance property together with the units it is expressed in.
#[derive(Clone, Debug, PartialEq)]
pub struct Spatial {
    /// The values.
    pub spec: VectorSpec<f64>,
    /// The coordinate system of the values.
    pub units: Units,
}

impl Spatial {
    /// A data-space property.
    pub fn data(spec: impl Into<VectorSpec<f64>>) -> Self {
        Self {
            spec: spec.into(),
            units: Units::Data,
        }
    }

    /// A screen-space property (pixels relative to the plot frame).
    pub fn screen(spec: impl Into<VectorSpec<f64>>) -> Self {
        Self {
            spec: spec.into(),
            units: Units::Screen,
        }
    }

    /// A data-space property read from a column.
    pub fn field(name: impl Into<String>) -> Self {
        Self::data(VectorSpec::field(name))
    }

    /// Sets the units.
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Resolves the values for every record.
    pub fn resolve(
        &self,
        property: &'static str,
        source: &dyn DataSource,
    ) -> Result<Uniform<f64>, SpecError> {
        self.spec.resolve(property, source, &f64::NAN)
    }
}

impl From<f64> for Spatial {
    fn from(value: f64) -> Self {
        Self::data(value)
    }
}

impl From<&str> for Spatial {
    fn from(value: &str) -> Self {
        Self::field(value)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use vizir_core::ColumnDataSource;

    use super::*;

    fn source() -> ColumnDataSource {
        ColumnDataSource::new()
            .with_column("x", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("label", vec!["a", "b", "c"])
            .unwrap()
    }

    #[test]
    fn scalars_broadcast_without_materializing() {
        let u = VectorSpec::Value(4.0).resolve("size", &source(), &0.0).unwrap();
        assert!(u.is_scalar());
        assert_eq!(u.len(), 3);
    }

    #[test]
    fn missing_fields_fall_back() {
        let u = VectorSpec::<f64>::field("nope")
            .resolve("size", &source(), &7.0)
            .unwrap();
        assert_eq!(*u.get(2), 7.0);
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let err = VectorSpec::<f64>::field("label")
            .resolve("x", &source(), &0.0)
            .unwrap_err();
        assert!(matches!(err, SpecError::TypeMismatch { expected: "number", .. }));
    }

    #[test]
    fn negative_scalars_are_rejected() {
        let err = VectorSpec::Value(-1.0)
            .resolve_non_negative("radius", &source(), 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            SpecError::InvalidValue {
                property: "radius",
                value: -1.0,
            }
        );
    }
}
