//! Statement register: the ordered body of a program.
//!
//! Entries render verbatim in insertion order. A named entry is stored
//! into that set (`node[amenity=cafe]->.cafes;`) and can be looked up
//! by name; the "current" entry is the last unnamed one.

use crate::element::Selector;
use crate::error::{Error, Result};
use crate::format::{OutputFormat, Verbosity};
use crate::statement::{validate_set_name, Term, DEFAULT_SET};
use std::fmt;
use tracing::debug;

/// Recurse down from ways and relations to their member nodes.
pub const DESCEND_CLAUSE: &str = "(._;>;);";

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    name: Option<String>,
    term: Term,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(ref name) => {
                self.term.write_body(f)?;
                write!(f, "->.{};", name)
            }
            None => write!(f, "{}", self.term),
        }
    }
}

/// Ordered ledger of terms submitted to a builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Register {
    entries: Vec<Entry>,
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unnamed entry; it becomes the current entry.
    pub fn append(&mut self, term: impl Into<Term>) -> Result<()> {
        self.push(None, term.into())
    }

    /// Append an entry stored into the set `name`.
    pub fn append_named(&mut self, name: &str, term: impl Into<Term>) -> Result<()> {
        validate_set_name(name)?;
        self.push(Some(name.to_string()), term.into())
    }

    fn push(&mut self, name: Option<String>, term: Term) -> Result<()> {
        for input in term.inputs() {
            if self.entries.is_empty() {
                return Err(Error::Composition(format!(
                    "First statement cannot read from input set '{}'",
                    input
                )));
            }
            if input != DEFAULT_SET && self.get(input).is_none() {
                return Err(Error::Composition(format!(
                    "Input set '{}' is not defined by an earlier statement",
                    input
                )));
            }
        }

        debug!(
            name = name.as_deref().unwrap_or(DEFAULT_SET),
            output = %term.output(),
            position = self.entries.len(),
            "statement registered"
        );
        self.entries.push(Entry { name, term });
        Ok(())
    }

    /// Latest entry stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.name.as_deref() == Some(name))
            .map(|entry| &entry.term)
    }

    /// Last entry appended without a name.
    pub fn current(&self) -> Option<&Term> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.name.is_none())
            .map(|entry| &entry.term)
    }

    /// Selector of the current entry.
    pub fn output(&self) -> Option<Selector> {
        self.current().map(Term::output)
    }

    /// Terms in insertion order with their names.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &Term)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_deref(), &entry.term))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether [`DESCEND_CLAUSE`] should follow the entries under `format`.
    ///
    /// True when the current output is not plain nodes, verbosity is
    /// `skel` or `body`, and no geometry is requested.
    pub fn needs_descent(&self, format: &OutputFormat) -> bool {
        let Some(output) = self.output() else {
            return false;
        };
        output != Selector::Node
            && matches!(format.verbosity(), Verbosity::Concise | Verbosity::Generic)
            && format.geometry().is_none()
    }

    /// Entries followed by the descend clause when enabled and needed.
    pub fn render(&self, format: &OutputFormat, auto_descend: bool) -> String {
        let mut out = self.to_string();
        if auto_descend && self.needs_descent(format) {
            out.push_str(DESCEND_CLAUSE);
        }
        out
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}
