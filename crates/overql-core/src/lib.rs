//! # overql core
//!
//! Composable terms for the Overpass query language and the renderer that
//! turns any composition of them into one program string.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of overql.**
//!
//! Users should depend on the main [`overql`](https://crates.io/crates/overql) crate
//! instead, which provides the stable public API. This crate's API may change
//! without notice between minor versions.
//!
//! Rendering is done through `Display`: every term, the settings block,
//! the output format and the register render themselves. Validation
//! happens when terms are built or combined, so rendering cannot fail.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
/// Element kinds and selectors
#[allow(missing_docs)]
pub mod element;
/// Filter terms and sequences
#[allow(missing_docs)]
pub mod filter;
/// Output format block
#[allow(missing_docs)]
pub mod format;
/// Statement register
#[allow(missing_docs)]
pub mod register;
/// Global settings block
#[allow(missing_docs)]
pub mod settings;
/// Statements and set algebra
#[allow(missing_docs)]
pub mod statement;
pub mod transport;

pub use element::{ElementKind, Selector};
pub use error::{Error, Result};
pub use filter::{
    append_predicate, BoundingBox, Filter, FilterOperand, FilterSeq, IdFilter, KeySpec,
    RawFilter, TagFilter, MATCH_ANY,
};
pub use format::{Geometry, OutputFormat, ResultLimit, SortOrder, Verbosity};
pub use register::{Register, DESCEND_CLAUSE};
pub use settings::{
    CsvFormat, PayloadFormat, QueryDate, QuerySettings, DEFAULT_FORMAT, DEFAULT_TIMEOUT,
    MAXSIZE_LIMIT,
};
pub use statement::{
    difference_of, union_all, union_of, DifferenceSet, QueryStatement, Term, UnionSet,
    DEFAULT_SET,
};
pub use transport::{RawResponse, Transport, TransportError};
