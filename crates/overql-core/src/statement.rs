//! Query statements and the set algebra over them.
//!
//! A [`QueryStatement`] is a selector bound to a filter sequence. Unions
//! and differences combine statements into [`Term`]s, which nest:
//!
//! - a union is n-ary and never contains another union (members are
//!   flattened on combination);
//! - a difference is strictly binary and keeps minuend and subtrahend
//!   apart. A difference may be a union member but not a difference
//!   operand.

use crate::element::Selector;
use crate::error::{Error, Result};
use crate::filter::{FilterOperand, FilterSeq};
use std::fmt;
use tracing::trace;

/// Name of the set every statement reads from and writes to by default.
pub const DEFAULT_SET: &str = "_";

/// Check that `name` is usable as a result-set name.
pub(crate) fn validate_set_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        return Err(Error::InvalidArgument(format!(
            "'{}' is not a valid set name",
            name
        )));
    }
    Ok(())
}

/// One selector plus its filters; the unit of retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatement {
    selector: Selector,
    filters: FilterSeq,
    input: Option<String>,
}

impl QueryStatement {
    /// Create a statement with no filters.
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            filters: FilterSeq::new(),
            input: None,
        }
    }

    /// Create a statement with initial filters.
    pub fn with_filters(selector: Selector, filters: impl Into<FilterOperand>) -> Result<Self> {
        Ok(Self {
            selector,
            filters: FilterSeq::from_operand(filters)?,
            input: None,
        })
    }

    pub fn node() -> Self {
        Self::new(Selector::Node)
    }

    pub fn way() -> Self {
        Self::new(Selector::Way)
    }

    pub fn relation() -> Self {
        Self::new(Selector::Relation)
    }

    /// Statement over the selector named by `ranks` (see [`Selector::from_ranks`]).
    pub fn of(ranks: &[u8]) -> Result<Self> {
        Ok(Self::new(Selector::from_ranks(ranks)?))
    }

    /// Consuming form of [`QueryStatement::add_filter`].
    pub fn with_filter(mut self, filter: impl Into<FilterOperand>) -> Result<Self> {
        self.add_filter(filter)?;
        Ok(self)
    }

    /// Read from a named set instead of the default one.
    pub fn with_input(mut self, set: &str) -> Result<Self> {
        validate_set_name(set)?;
        self.input = Some(set.to_string());
        Ok(self)
    }

    pub fn add_filter(&mut self, filter: impl Into<FilterOperand>) -> Result<()> {
        self.filters.add(filter)
    }

    /// Replace the filter sequence wholesale. Only allowed while empty;
    /// call [`QueryStatement::clear_filters`] first otherwise.
    pub fn set_filters(&mut self, filters: FilterSeq) -> Result<()> {
        if !self.filters.is_empty() {
            return Err(Error::InvalidStateTransition(
                "Clear existing filters before assigning new ones".to_string(),
            ));
        }
        self.filters = filters;
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn filters(&self) -> &FilterSeq {
        &self.filters
    }

    pub fn selector(&self) -> Selector {
        self.selector
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    fn write_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if let Some(ref input) = self.input {
            write!(f, ".{}", input)?;
        }
        write!(f, "{}", self.filters)
    }
}

impl fmt::Display for QueryStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_body(f)?;
        write!(f, ";")
    }
}

/// Ordered union of terms. Members are never unions themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionSet {
    members: Vec<Term>,
}

impl UnionSet {
    pub fn members(&self) -> &[Term] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn push(&mut self, term: Term) {
        match term {
            Term::Union(union) => self.members.extend(union.members),
            other => self.members.push(other),
        }
    }
}

/// `minuend - subtrahend`
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceSet {
    minuend: Box<Term>,
    subtrahend: Box<Term>,
}

impl DifferenceSet {
    pub fn minuend(&self) -> &Term {
        &self.minuend
    }

    pub fn subtrahend(&self) -> &Term {
        &self.subtrahend
    }
}

/// Anything that can stand where a statement stands.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// A single statement
    Statement(QueryStatement),
    /// `(a;b;...);`
    Union(UnionSet),
    /// `(a; - b;);`
    Difference(DifferenceSet),
}

impl Term {
    /// Selector describing what the term yields.
    ///
    /// A union yields the merged selectors of its members; a difference
    /// yields whatever its minuend yields.
    pub fn output(&self) -> Selector {
        match self {
            Term::Statement(stmt) => stmt.selector(),
            Term::Union(union) => union
                .members
                .iter()
                .map(Term::output)
                .reduce(Selector::merge)
                .unwrap_or(Selector::NodeWayRelation),
            Term::Difference(diff) => diff.minuend.output(),
        }
    }

    /// See [`union_of`].
    pub fn union(self, other: impl Into<Term>) -> Term {
        union_of(self, other)
    }

    /// See [`difference_of`].
    pub fn difference(self, other: impl Into<Term>) -> Result<Term> {
        difference_of(self, other)
    }

    /// Names of every input set read anywhere in the term.
    pub fn inputs(&self) -> Vec<&str> {
        let mut inputs = Vec::new();
        self.collect_inputs(&mut inputs);
        inputs
    }

    fn collect_inputs<'a>(&'a self, inputs: &mut Vec<&'a str>) {
        match self {
            Term::Statement(stmt) => inputs.extend(stmt.input()),
            Term::Union(union) => {
                for member in &union.members {
                    member.collect_inputs(inputs);
                }
            }
            Term::Difference(diff) => {
                diff.minuend.collect_inputs(inputs);
                diff.subtrahend.collect_inputs(inputs);
            }
        }
    }

    /// Render without the terminating `;`.
    pub(crate) fn write_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Statement(stmt) => stmt.write_body(f),
            Term::Union(union) => {
                write!(f, "(")?;
                for member in &union.members {
                    write!(f, "{}", member)?;
                }
                write!(f, ")")
            }
            Term::Difference(diff) => {
                write!(f, "({} - {})", diff.minuend, diff.subtrahend)
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_body(f)?;
        write!(f, ";")
    }
}

impl From<QueryStatement> for Term {
    fn from(stmt: QueryStatement) -> Self {
        Term::Statement(stmt)
    }
}

impl From<UnionSet> for Term {
    fn from(union: UnionSet) -> Self {
        Term::Union(union)
    }
}

impl From<DifferenceSet> for Term {
    fn from(diff: DifferenceSet) -> Self {
        Term::Difference(diff)
    }
}

/// Union of `a` and `b`, flattening either side that is already a union.
pub fn union_of(a: impl Into<Term>, b: impl Into<Term>) -> Term {
    let mut union = UnionSet {
        members: Vec::new(),
    };
    union.push(a.into());
    union.push(b.into());
    trace!(members = union.len(), "union composed");
    Term::Union(union)
}

/// Union of every term in order. Fails on an empty input.
pub fn union_all<I, T>(terms: I) -> Result<Term>
where
    I: IntoIterator<Item = T>,
    T: Into<Term>,
{
    let mut union = UnionSet {
        members: Vec::new(),
    };
    for term in terms {
        union.push(term.into());
    }
    if union.is_empty() {
        return Err(Error::Composition(
            "Cannot build a union from no terms".to_string(),
        ));
    }
    Ok(Term::Union(union))
}

/// `a - b`. Neither operand may itself be a difference.
pub fn difference_of(a: impl Into<Term>, b: impl Into<Term>) -> Result<Term> {
    let (minuend, subtrahend) = (a.into(), b.into());
    if matches!(minuend, Term::Difference(_)) || matches!(subtrahend, Term::Difference(_)) {
        return Err(Error::Composition(
            "A difference cannot be an operand of another difference".to_string(),
        ));
    }
    trace!(minuend = %minuend.output(), subtrahend = %subtrahend.output(), "difference composed");
    Ok(Term::Difference(DifferenceSet {
        minuend: Box::new(minuend),
        subtrahend: Box::new(subtrahend),
    }))
}
