//! # overql
//!
//! Build Overpass QL programs for OpenStreetMap data from composable terms
//! and submit them to an Overpass endpoint.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use overql::{union_of, HttpTransport, QueryBuilder, QueryStatement, TagFilter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let buildings = QueryStatement::node().with_filter(TagFilter::has_key("building")?)?;
//!     let primaries = QueryStatement::way().with_filter(TagFilter::equals("highway", "primary")?)?;
//!
//!     let mut builder = QueryBuilder::new();
//!     builder.append(union_of(buildings, primaries))?;
//!     println!("{}", builder.raw_query_string());
//!
//!     let transport = HttpTransport::with_defaults()?;
//!     let response = builder.request(&transport)?;
//!     println!("{} bytes", response.body.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Program layout
//!
//! A program is the settings block (`[out:json][timeout:25];`), then every
//! registered statement in order, then the `out ...;` statement. With
//! auto-descend on, `(._;>;);` is inserted before `out` when the last
//! statement returns ways or relations so their nodes come along.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

pub mod logging;

// Re-export core types
pub use overql_core::{Error, Result};

// Query algebra
pub use overql_core::{
    append_predicate, difference_of, union_all, union_of, BoundingBox, DifferenceSet,
    ElementKind, Filter, FilterOperand, FilterSeq, IdFilter, KeySpec, QueryStatement,
    RawFilter, Selector, TagFilter, Term, UnionSet, DEFAULT_SET, MATCH_ANY,
};

// Program blocks
pub use overql_core::{
    CsvFormat, Geometry, OutputFormat, PayloadFormat, QueryDate, QuerySettings, Register,
    ResultLimit, SortOrder, Verbosity, DEFAULT_FORMAT, DEFAULT_TIMEOUT, DESCEND_CLAUSE,
    MAXSIZE_LIMIT,
};

// Transport
pub use overql_core::{RawResponse, Transport, TransportError};
pub use overql_http::{HttpConfig, HttpMethod, HttpTransport, DEFAULT_ENDPOINT};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Construction options for a [`QueryBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Label used in log events
    pub name: String,
    /// Sort output by quadtile (`qt`) instead of object id
    pub basic_optimize: bool,
    /// Insert the descend clause when the output is not plain nodes
    pub auto_descend: bool,
    /// Initial global settings
    pub settings: QuerySettings,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            basic_optimize: true,
            auto_descend: true,
            settings: QuerySettings::default(),
        }
    }
}

impl BuilderConfig {
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_basic_optimize(mut self, basic_optimize: bool) -> Self {
        self.basic_optimize = basic_optimize;
        self
    }

    pub fn with_auto_descend(mut self, auto_descend: bool) -> Self {
        self.auto_descend = auto_descend;
        self
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Assembles settings, statements and output format into one program.
///
/// # Examples
///
/// ```rust
/// use overql::{BuilderConfig, QueryBuilder, QueryStatement, QuerySettings, PayloadFormat};
///
/// let config = BuilderConfig::default()
///     .with_settings(QuerySettings::new().with_payload_format(PayloadFormat::Json).with_timeout(25));
/// let mut builder = QueryBuilder::with_config(config);
/// builder.append(QueryStatement::node().with_filter("[amenity=cafe]")?)?;
///
/// assert_eq!(
///     builder.raw_query_string(),
///     "[out:json][timeout:25];node[amenity=cafe];out qt;"
/// );
/// # Ok::<(), overql::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    name: String,
    settings: QuerySettings,
    output: OutputFormat,
    register: Register,
    auto_descend: bool,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    /// Builder with [`BuilderConfig::default`].
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        let mut output = OutputFormat::new();
        if config.basic_optimize {
            output.set_sort_order(SortOrder::Quadtile);
        }
        debug!(
            name = %config.name,
            basic_optimize = config.basic_optimize,
            auto_descend = config.auto_descend,
            "query builder created"
        );
        Self {
            name: config.name,
            settings: config.settings,
            output,
            register: Register::new(),
            auto_descend: config.auto_descend,
        }
    }

    /// Builder whose register starts with `term`.
    pub fn from_term(term: impl Into<Term>, config: BuilderConfig) -> Result<Self> {
        let mut builder = Self::with_config(config);
        builder.append(term)?;
        Ok(builder)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut QuerySettings {
        &mut self.settings
    }

    pub fn output_format(&self) -> &OutputFormat {
        &self.output
    }

    pub fn output_format_mut(&mut self) -> &mut OutputFormat {
        &mut self.output
    }

    pub fn register(&self) -> &Register {
        &self.register
    }

    pub fn auto_descend(&self) -> bool {
        self.auto_descend
    }

    pub fn set_auto_descend(&mut self, auto_descend: bool) {
        self.auto_descend = auto_descend;
    }

    /// The `[bbox:...]` directive applied to every statement.
    pub fn global_bbox(&self) -> Option<&BoundingBox> {
        self.settings.bbox()
    }

    pub fn set_global_bbox(&mut self, bbox: Option<BoundingBox>) {
        self.settings.set_bbox(bbox);
    }

    /// Request full geometry (`geom`).
    pub fn include_geometries(&mut self) {
        self.output.set_geometry(Some(Geometry::Full));
    }

    /// Request bounding boxes (`bb`).
    pub fn include_bounding_boxes(&mut self) {
        self.output.set_geometry(Some(Geometry::BoundingBox));
    }

    /// Request center points (`center`).
    pub fn include_center_points(&mut self) {
        self.output.set_geometry(Some(Geometry::CenterPoint));
    }

    /// Register a statement or set; it becomes the program's output.
    pub fn append(&mut self, term: impl Into<Term>) -> Result<()> {
        self.register.append(term)
    }

    /// Register a statement or set stored into the named set.
    pub fn append_named(&mut self, name: &str, term: impl Into<Term>) -> Result<()> {
        self.register.append_named(name, term)
    }

    /// The complete program text.
    pub fn raw_query_string(&self) -> String {
        format!(
            "{}{}{}",
            self.settings,
            self.register.render(&self.output, self.auto_descend),
            self.output
        )
    }

    /// Submit the program through `transport`. One call, no retries.
    pub fn request<T: Transport + ?Sized>(&self, transport: &T) -> Result<RawResponse> {
        let program = self.raw_query_string();
        info!(name = %self.name, bytes = program.len(), "submitting query");
        debug!(program = %program, "program text");

        match transport.submit(&program) {
            Ok(response) => {
                info!(
                    name = %self.name,
                    status = response.status,
                    bytes = response.body.len(),
                    "query answered"
                );
                Ok(response)
            }
            Err(e) => {
                warn!(name = %self.name, error = %e, "query failed");
                Err(e.into())
            }
        }
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_query_string())
    }
}
