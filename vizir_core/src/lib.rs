// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `vizir_core`: the data layer consumed by VizIR glyphs.
//!
//! This crate provides:
//! - columnar data sources with a monotonic change [`Version`] ([`ColumnDataSource`])
//! - per-record arrays that are either owned or inherited from a peer ([`Shared`])
//! - scalar-or-vector accessors that never materialize broadcast scalars ([`Uniform`])
//! - immutable hit-test results ([`Selection`]) and a compact index bitset ([`Indices`])
//!
//! Conceptually, a plot frontend can:
//! - store columns in a [`ColumnDataSource`] and mutate them between frames
//! - let glyph views compare the source [`Version`] with the one they were built from
//! - keep interaction state (`selected`, `inspected`, `muted`) on the same source so every
//!   renderer drawing from it agrees on which records are highlighted.

#![no_std]

extern crate alloc;

mod indices;
mod selection;
mod shared;
mod source;

pub use indices::Indices;
pub use selection::{Selection, SelectionMode};
pub use shared::{Shared, Uniform};
pub use source::{Column, ColumnDataSource, DataSource, DataSourceError};

/// Monotonic version counter for data sources.
pub type Version = u64;
