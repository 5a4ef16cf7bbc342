//! Output format block: the trailing `out ...;` statement.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// How much of each element is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// `body`: ids, tags, and member/node references
    #[default]
    Generic,
    /// `skel`: ids and references only
    Concise,
    /// `ids`: ids only
    Brief,
    /// `meta`: everything including metadata; implies tags
    Verbose,
}

impl Verbosity {
    pub fn token(self) -> &'static str {
        match self {
            Verbosity::Generic => "body",
            Verbosity::Concise => "skel",
            Verbosity::Brief => "ids",
            Verbosity::Verbose => "meta",
        }
    }
}

/// Geometry attached to each element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    /// `geom`
    Full,
    /// `bb`
    BoundingBox,
    /// `center`
    CenterPoint,
}

impl Geometry {
    pub fn token(self) -> &'static str {
        match self {
            Geometry::Full => "geom",
            Geometry::BoundingBox => "bb",
            Geometry::CenterPoint => "center",
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// `asc`
    #[default]
    ObjectId,
    /// `qt`: faster, ordered by quadtile index
    Quadtile,
}

impl SortOrder {
    pub fn token(self) -> &'static str {
        match self {
            SortOrder::ObjectId => "asc",
            SortOrder::Quadtile => "qt",
        }
    }
}

/// Maximum number of returned elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResultLimit {
    #[default]
    Unlimited,
    Count(NonZeroU64),
}

impl ResultLimit {
    /// `-1` means unlimited, positive values are a count, anything else
    /// is rejected.
    pub fn from_i64(limit: i64) -> Result<Self> {
        match limit {
            -1 => Ok(ResultLimit::Unlimited),
            n if n > 0 => Ok(ResultLimit::Count(
                NonZeroU64::new(n as u64).ok_or_else(|| invalid_limit(n))?,
            )),
            n => Err(invalid_limit(n)),
        }
    }

    /// Inverse of [`ResultLimit::from_i64`].
    pub fn as_i64(self) -> i64 {
        match self {
            ResultLimit::Unlimited => -1,
            ResultLimit::Count(n) => i64::try_from(n.get()).unwrap_or(i64::MAX),
        }
    }
}

fn invalid_limit(limit: i64) -> Error {
    Error::InvalidArgument(format!(
        "Result limit must be greater than zero or -1, got {}",
        limit
    ))
}

/// Directives of the final `out` statement.
///
/// Renders `out;` when everything is at its default, otherwise `out`
/// followed by the non-default tokens in the order verbosity, geometry,
/// sort order, `tags`, limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputFormat {
    verbosity: Verbosity,
    geometry: Option<Geometry>,
    sort_order: SortOrder,
    include_tags: bool,
    result_limit: ResultLimit,
}

impl OutputFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn include_tags(&self) -> bool {
        self.include_tags
    }

    pub fn result_limit(&self) -> ResultLimit {
        self.result_limit
    }

    /// Setting [`Verbosity::Verbose`] turns tag inclusion on and locks it.
    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
        if verbosity == Verbosity::Verbose {
            self.include_tags = true;
        }
    }

    pub fn set_geometry(&mut self, geometry: Option<Geometry>) {
        self.geometry = geometry;
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
    }

    /// Fails when clearing tags while verbosity is [`Verbosity::Verbose`].
    pub fn set_include_tags(&mut self, include_tags: bool) -> Result<()> {
        if !include_tags && self.verbosity == Verbosity::Verbose {
            return Err(Error::InvalidStateTransition(
                "Tags are always included at verbose (meta) verbosity".to_string(),
            ));
        }
        self.include_tags = include_tags;
        Ok(())
    }

    /// See [`ResultLimit::from_i64`].
    pub fn set_result_limit(&mut self, limit: i64) -> Result<()> {
        self.result_limit = ResultLimit::from_i64(limit)?;
        Ok(())
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.set_verbosity(verbosity);
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_include_tags(mut self, include_tags: bool) -> Result<Self> {
        self.set_include_tags(include_tags)?;
        Ok(self)
    }

    pub fn with_result_limit(mut self, limit: i64) -> Result<Self> {
        self.set_result_limit(limit)?;
        Ok(self)
    }

    // meta already carries tags, so the token would be redundant
    fn writes_tags(&self) -> bool {
        self.include_tags && self.verbosity != Verbosity::Verbose
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<String> = Vec::new();
        if self.verbosity != Verbosity::Generic {
            tokens.push(self.verbosity.token().to_string());
        }
        if let Some(geometry) = self.geometry {
            tokens.push(geometry.token().to_string());
        }
        if self.sort_order == SortOrder::Quadtile {
            tokens.push(self.sort_order.token().to_string());
        }
        if self.writes_tags() {
            tokens.push("tags".to_string());
        }
        if let ResultLimit::Count(n) = self.result_limit {
            tokens.push(n.to_string());
        }

        write!(f, "out")?;
        if !tokens.is_empty() {
            write!(f, " {}", tokens.join(" "))?;
        }
        write!(f, ";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(Verbosity::Generic.token(), "body");
        assert_eq!(Verbosity::Concise.token(), "skel");
        assert_eq!(Verbosity::Brief.token(), "ids");
        assert_eq!(Verbosity::Verbose.token(), "meta");
        assert_eq!(Geometry::Full.token(), "geom");
        assert_eq!(Geometry::BoundingBox.token(), "bb");
        assert_eq!(Geometry::CenterPoint.token(), "center");
        assert_eq!(SortOrder::ObjectId.token(), "asc");
        assert_eq!(SortOrder::Quadtile.token(), "qt");
    }

    #[test]
    fn test_defaults() {
        let format = OutputFormat::new();
        assert_eq!(format.verbosity(), Verbosity::Generic);
        assert_eq!(format.geometry(), None);
        assert_eq!(format.sort_order(), SortOrder::ObjectId);
        assert!(!format.include_tags());
        assert_eq!(format.result_limit().as_i64(), -1);
        assert_eq!(format.to_string(), "out;");
    }

    #[test]
    fn test_tags_and_limit() {
        let mut format = OutputFormat::new();
        format.set_include_tags(true).unwrap();
        format.set_result_limit(10).unwrap();
        assert_eq!(format.to_string(), "out tags 10;");
    }

    #[test]
    fn test_all_tokens_in_order() {
        let format = OutputFormat::new()
            .with_result_limit(5)
            .unwrap()
            .with_include_tags(true)
            .unwrap()
            .with_sort_order(SortOrder::Quadtile)
            .with_geometry(Geometry::CenterPoint)
            .with_verbosity(Verbosity::Concise);
        assert_eq!(format.to_string(), "out skel center qt tags 5;");
    }

    #[test]
    fn test_verbose_locks_tags() {
        let mut format = OutputFormat::new();
        format.set_verbosity(Verbosity::Verbose);
        assert!(format.include_tags());
        assert_eq!(format.to_string(), "out meta;");

        assert!(matches!(
            format.set_include_tags(false),
            Err(Error::InvalidStateTransition(_))
        ));
        assert!(format.include_tags());

        format.set_verbosity(Verbosity::Generic);
        format.set_include_tags(false).unwrap();
        assert_eq!(format.to_string(), "out;");
    }

    #[test]
    fn test_result_limit_validation() {
        let mut format = OutputFormat::new();
        assert!(matches!(
            format.set_result_limit(0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(format.set_result_limit(-5).is_err());
        format.set_result_limit(3).unwrap();
        format.set_result_limit(-1).unwrap();
        assert_eq!(format.result_limit(), ResultLimit::Unlimited);
        assert_eq!(ResultLimit::from_i64(42).unwrap().as_i64(), 42);
    }
}
