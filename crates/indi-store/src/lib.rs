//! # indi-store
//!
//! Backend adapters for the INDI engine. Each adapter implements the same
//! abstract data model — auto-incrementing integer primary keys, column-level
//! null handling, single-equality-predicate lookup — on top of a different
//! native primitive set:
//!
//! - [`relational`]: 1:1 translation to SQL text, shared across relational
//!   engines and parameterized by a small [`relational::Dialect`].
//! - [`keyvalue`]: row/column emulation over a flat key space, one key per
//!   cell plus a per-table counter key.
//! - [`document`]: row/column emulation over one document per cell plus a
//!   counter document per table.
//!
//! All three conform to [`StoreAdapter`]; the multi-store executor in
//! `indi-engine` fans statements out across them and asserts that the
//! results agree.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod adapter;

/// Document-store emulation.
pub mod document;
/// Key-value emulation.
pub mod keyvalue;
/// Shared SQL translation for relational engines.
pub mod relational;

pub use adapter::{BackendError, StoreAdapter, StoreResult};
