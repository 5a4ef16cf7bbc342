//! Filter terms and filter sequences
//!
//! Leaf predicates render to one bracketed or parenthesized fragment.
//! A `FilterSeq` keeps them in insertion order and flattens nested
//! sequences on append.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value that matches any tag value. A tag filter whose only value is
/// this token is an existence filter.
pub const MATCH_ANY: &str = "*";

/// Rectangle given as (south, west, north, east) in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl BoundingBox {
    /// Create a bounding box. All bounds must be finite.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self> {
        let bounds = [
            ("south", south),
            ("west", west),
            ("north", north),
            ("east", east),
        ];
        for (name, value) in bounds {
            if !value.is_finite() {
                return Err(Error::InvalidArgument(format!(
                    "Bounding box {} bound must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Create a bounding box from exactly four ordered bounds.
    pub fn from_slice(bounds: &[f64]) -> Result<Self> {
        match *bounds {
            [south, west, north, east] => Self::new(south, west, north, east),
            _ => Err(Error::InvalidArgument(format!(
                "Bounding box needs 4 bounds (south, west, north, east), got {}",
                bounds.len()
            ))),
        }
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }
}

impl TryFrom<&[f64]> for BoundingBox {
    type Error = Error;

    fn try_from(bounds: &[f64]) -> Result<Self> {
        Self::from_slice(bounds)
    }
}

impl TryFrom<Vec<f64>> for BoundingBox {
    type Error = Error;

    fn try_from(bounds: Vec<f64>) -> Result<Self> {
        Self::from_slice(&bounds)
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = Error;

    fn try_from([south, west, north, east]: [f64; 4]) -> Result<Self> {
        Self::new(south, west, north, east)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.south, bbox.west, bbox.north, bbox.east]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.8},{:.8},{:.8},{:.8}",
            self.south, self.west, self.north, self.east
        )
    }
}

/// A tag key plus whether the tag must exist.
///
/// A leading `!` on the key name means "must not exist" and is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    key: String,
    exists: bool,
}

impl KeySpec {
    pub fn new(key: impl Into<String>, exists: bool) -> Result<Self> {
        let key = key.into();
        let (key, exists) = if key.starts_with('!') {
            if !exists {
                return Err(Error::InvalidArgument(format!(
                    "Key '{}' is negated twice (leading '!' and exists=false)",
                    key
                )));
            }
            (key.trim_matches('!').to_string(), false)
        } else {
            (key, exists)
        };

        if key.is_empty() {
            return Err(Error::InvalidArgument("Tag key cannot be empty".to_string()));
        }

        Ok(Self { key, exists })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn exists(&self) -> bool {
        self.exists
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.exists {
            write!(f, "!")?;
        }
        write!(f, "{}", self.key)
    }
}

/// Tag filter: key existence, key absence, or key matched against values.
///
/// | values | exists | renders |
/// |--------|--------|---------|
/// | none   | true   | `[k]` |
/// | none   | false  | `[!k]` |
/// | one    | true   | `[k=v]` |
/// | many   | true   | `[k~"^(a\|b)$"]` |
/// | any    | false  | `[k][k!=v]` / `[k][k!~"^(a\|b)$"]` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    key: KeySpec,
    values: Vec<String>,
    exists: bool,
}

impl TagFilter {
    pub fn new<K, I, V>(key: K, values: I, exists: bool) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = normalize_values(values)?;
        let key = if values.is_empty() {
            KeySpec::new(key, exists)?
        } else {
            KeySpec::new(key, true)?
        };

        if !values.is_empty() && !key.exists() {
            return Err(Error::InvalidArgument(format!(
                "Negated key '{}' cannot be combined with values",
                key.key()
            )));
        }

        Ok(Self {
            key,
            values,
            exists,
        })
    }

    /// `[key]`
    pub fn has_key(key: impl Into<String>) -> Result<Self> {
        Self::new(key, Vec::<String>::new(), true)
    }

    /// `[!key]`
    pub fn lacks_key(key: impl Into<String>) -> Result<Self> {
        Self::new(key, Vec::<String>::new(), false)
    }

    /// `[key=value]`
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        Self::new(key, [value.into()], true)
    }

    pub fn any_of<I, V>(key: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::new(key, values, true)
    }

    /// Tag present but matching none of `values`.
    pub fn none_of<I, V>(key: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::new(key, values, false)
    }

    pub fn key(&self) -> &KeySpec {
        &self.key
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Replace the value list, re-running construction checks.
    pub fn set_values<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = if self.exists {
            self.key.to_string()
        } else {
            self.key.key().to_string()
        };
        *self = Self::new(key, values, self.exists)?;
        Ok(())
    }

    fn write_values(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.values.as_slice() {
            [value] => write!(f, "={}", value),
            values => write!(f, "~\"^({})$\"", values.join("|")),
        }
    }
}

fn normalize_values<I, V>(values: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = V>,
    V: Into<String>,
{
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    if values.len() == 1 && values[0] == MATCH_ANY {
        return Ok(Vec::new());
    }
    if values.iter().any(|v| v.is_empty()) {
        return Err(Error::InvalidArgument(
            "Tag values cannot be empty strings".to_string(),
        ));
    }
    Ok(values)
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.key.exists() || self.values.is_empty() {
            return write!(f, "[{}]", self.key);
        }
        if self.exists {
            write!(f, "[{}", self.key)?;
            self.write_values(f)?;
            write!(f, "]")
        } else {
            write!(f, "[{}][{}!", self.key, self.key)?;
            self.write_values(f)?;
            write!(f, "]")
        }
    }
}

/// Match elements by OSM id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFilter {
    ids: Vec<u64>,
}

impl IdFilter {
    pub fn new(osm_id: u64) -> Self {
        Self { ids: vec![osm_id] }
    }

    /// Match any of several ids: `(id:1,2,3)`.
    pub fn many(ids: impl IntoIterator<Item = u64>) -> Result<Self> {
        let ids: Vec<u64> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(Error::InvalidArgument(
                "Id filter needs at least one id".to_string(),
            ));
        }
        Ok(Self { ids })
    }

    /// First id of the filter.
    pub fn osm_id(&self) -> u64 {
        self.ids[0]
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn set_osm_id(&mut self, osm_id: u64) {
        self.ids = vec![osm_id];
    }
}

impl fmt::Display for IdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(id:")?;
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, ")")
    }
}

/// Filter text emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter(String);

impl RawFilter {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::InvalidArgument(
                "Raw filter text cannot be empty".to_string(),
            ));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single filter term
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Escape hatch: text emitted as-is
    Raw(RawFilter),
    /// `(id:...)`
    Id(IdFilter),
    /// `(s,w,n,e)`
    Bbox(BoundingBox),
    /// `[key...]`
    Tag(TagFilter),
}

impl Filter {
    pub fn raw(text: impl Into<String>) -> Result<Self> {
        Ok(Filter::Raw(RawFilter::new(text)?))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Raw(raw) => write!(f, "{}", raw.as_str()),
            Filter::Id(id) => write!(f, "{}", id),
            Filter::Bbox(bbox) => write!(f, "({})", bbox),
            Filter::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

impl From<TagFilter> for Filter {
    fn from(tag: TagFilter) -> Self {
        Filter::Tag(tag)
    }
}

impl From<IdFilter> for Filter {
    fn from(id: IdFilter) -> Self {
        Filter::Id(id)
    }
}

impl From<BoundingBox> for Filter {
    fn from(bbox: BoundingBox) -> Self {
        Filter::Bbox(bbox)
    }
}

impl From<RawFilter> for Filter {
    fn from(raw: RawFilter) -> Self {
        Filter::Raw(raw)
    }
}

/// Anything that can be appended to a `FilterSeq`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperand {
    /// Text wrapped as a raw filter on append
    Text(String),
    /// One term
    Filter(Filter),
    /// A sequence whose terms are spliced in
    Seq(FilterSeq),
    /// Operands appended one by one
    List(Vec<FilterOperand>),
}

impl From<&str> for FilterOperand {
    fn from(text: &str) -> Self {
        FilterOperand::Text(text.to_string())
    }
}

impl From<String> for FilterOperand {
    fn from(text: String) -> Self {
        FilterOperand::Text(text)
    }
}

impl From<Filter> for FilterOperand {
    fn from(filter: Filter) -> Self {
        FilterOperand::Filter(filter)
    }
}

impl From<TagFilter> for FilterOperand {
    fn from(tag: TagFilter) -> Self {
        FilterOperand::Filter(tag.into())
    }
}

impl From<IdFilter> for FilterOperand {
    fn from(id: IdFilter) -> Self {
        FilterOperand::Filter(id.into())
    }
}

impl From<BoundingBox> for FilterOperand {
    fn from(bbox: BoundingBox) -> Self {
        FilterOperand::Filter(bbox.into())
    }
}

impl From<FilterSeq> for FilterOperand {
    fn from(seq: FilterSeq) -> Self {
        FilterOperand::Seq(seq)
    }
}

impl<T: Into<FilterOperand>> From<Vec<T>> for FilterOperand {
    fn from(items: Vec<T>) -> Self {
        FilterOperand::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterOperand>, const N: usize> From<[T; N]> for FilterOperand {
    fn from(items: [T; N]) -> Self {
        FilterOperand::List(items.into_iter().map(Into::into).collect())
    }
}

/// Ordered, flat list of filters. Renders as their concatenation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSeq {
    filters: Vec<Filter>,
}

impl FilterSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from a single operand.
    pub fn from_operand(operand: impl Into<FilterOperand>) -> Result<Self> {
        let mut seq = Self::new();
        seq.add(operand)?;
        Ok(seq)
    }

    /// Append an operand. Nested sequences and lists are flattened.
    ///
    /// Either every term of the operand is appended or, on error, none.
    pub fn add(&mut self, operand: impl Into<FilterOperand>) -> Result<()> {
        let mut staged = Vec::new();
        flatten_operand(operand.into(), &mut staged)?;
        self.filters.extend(staged);
        Ok(())
    }

    /// Consuming form of [`FilterSeq::add`].
    pub fn with(mut self, operand: impl Into<FilterOperand>) -> Result<Self> {
        self.add(operand)?;
        Ok(self)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }
}

fn flatten_operand(operand: FilterOperand, out: &mut Vec<Filter>) -> Result<()> {
    match operand {
        FilterOperand::Text(text) => out.push(Filter::raw(text)?),
        FilterOperand::Filter(filter) => out.push(filter),
        FilterOperand::Seq(seq) => out.extend(seq.filters),
        FilterOperand::List(items) => {
            for item in items {
                flatten_operand(item, out)?;
            }
        }
    }
    Ok(())
}

impl<'a> IntoIterator for &'a FilterSeq {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

impl fmt::Display for FilterSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for filter in &self.filters {
            write!(f, "{}", filter)?;
        }
        Ok(())
    }
}

/// Append `operand` to `seq`.
pub fn append_predicate(seq: &mut FilterSeq, operand: impl Into<FilterOperand>) -> Result<()> {
    seq.add(operand)
}
