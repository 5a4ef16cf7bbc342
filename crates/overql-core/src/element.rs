//! Element kinds and the selectors built from them.
//!
//! The three primitive kinds are ranked node < way < relation. A selector
//! names a non-empty subset of them; compound selectors render as the
//! initials of their kinds in rank order (`nw`, `nr`, `wr`, `nwr`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A primitive OSM element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Rank 1
    Node = 1,
    /// Rank 2
    Way = 2,
    /// Rank 3
    Relation = 3,
}

impl ElementKind {
    /// All kinds in rank order.
    pub const ALL: [ElementKind; 3] = [ElementKind::Node, ElementKind::Way, ElementKind::Relation];

    /// Rank used for ordering selectors.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Canonical one-word name.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }

    /// First letter of the canonical name.
    pub fn initial(self) -> char {
        match self {
            ElementKind::Node => 'n',
            ElementKind::Way => 'w',
            ElementKind::Relation => 'r',
        }
    }

    /// Look up a kind by rank.
    pub fn from_rank(rank: u8) -> Result<Self> {
        match rank {
            1 => Ok(ElementKind::Node),
            2 => Ok(ElementKind::Way),
            3 => Ok(ElementKind::Relation),
            _ => Err(Error::InvalidSelector(format!(
                "Element rank {} is outside 1..=3",
                rank
            ))),
        }
    }

    fn bit(self) -> u8 {
        1 << (self.rank() - 1)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The element kinds a statement queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    Node,
    Way,
    Relation,
    NodeWay,
    NodeRelation,
    WayRelation,
    NodeWayRelation,
}

/// Selector for each non-empty rank mask. Bit `r - 1` is set for rank `r`.
const SELECTOR_BY_MASK: [Selector; 7] = [
    Selector::Node,            // 0b001
    Selector::Way,             // 0b010
    Selector::NodeWay,         // 0b011
    Selector::Relation,        // 0b100
    Selector::NodeRelation,    // 0b101
    Selector::WayRelation,     // 0b110
    Selector::NodeWayRelation, // 0b111
];

impl Selector {
    /// Kinds covered by this selector, in rank order.
    pub fn kinds(self) -> &'static [ElementKind] {
        use ElementKind::*;
        match self {
            Selector::Node => &[Node],
            Selector::Way => &[Way],
            Selector::Relation => &[Relation],
            Selector::NodeWay => &[Node, Way],
            Selector::NodeRelation => &[Node, Relation],
            Selector::WayRelation => &[Way, Relation],
            Selector::NodeWayRelation => &[Node, Way, Relation],
        }
    }

    /// Resolve a set of 1-3 distinct ranks to its selector.
    ///
    /// Input order does not matter: `[3, 1]` resolves to `nr`.
    pub fn from_ranks(ranks: &[u8]) -> Result<Self> {
        if ranks.is_empty() || ranks.len() > 3 {
            return Err(Error::InvalidSelector(format!(
                "Expected 1 to 3 element ranks, got {}",
                ranks.len()
            )));
        }

        let mut mask = 0u8;
        for &rank in ranks {
            let bit = ElementKind::from_rank(rank)?.bit();
            if mask & bit != 0 {
                return Err(Error::InvalidSelector(format!(
                    "Element rank {} given more than once",
                    rank
                )));
            }
            mask |= bit;
        }

        Ok(Self::from_mask(mask))
    }

    /// Resolve any non-empty collection of kinds, ignoring duplicates.
    pub fn from_kinds<I>(kinds: I) -> Result<Self>
    where
        I: IntoIterator<Item = ElementKind>,
    {
        let mask = kinds.into_iter().fold(0u8, |mask, kind| mask | kind.bit());
        if mask == 0 {
            return Err(Error::InvalidSelector(
                "A selector needs at least one element kind".to_string(),
            ));
        }
        Ok(Self::from_mask(mask))
    }

    /// Sorted, de-duplicated union of two selectors.
    pub fn merge(self, other: Selector) -> Selector {
        Self::from_mask(self.mask() | other.mask())
    }

    pub fn contains(self, kind: ElementKind) -> bool {
        self.mask() & kind.bit() != 0
    }

    /// Statement keyword: the full name of a single kind, otherwise the
    /// kind initials in rank order (`nw`, `nr`, `wr`, `nwr`).
    pub fn name(self) -> &'static str {
        match self {
            Selector::Node => "node",
            Selector::Way => "way",
            Selector::Relation => "relation",
            Selector::NodeWay => "nw",
            Selector::NodeRelation => "nr",
            Selector::WayRelation => "wr",
            Selector::NodeWayRelation => "nwr",
        }
    }

    /// Whether the selector covers a single kind.
    pub fn is_primitive(self) -> bool {
        self.kinds().len() == 1
    }

    fn mask(self) -> u8 {
        self.kinds().iter().fold(0, |mask, kind| mask | kind.bit())
    }

    // mask is always in 1..=7 here
    fn from_mask(mask: u8) -> Self {
        SELECTOR_BY_MASK[usize::from(mask - 1)]
    }
}

impl From<ElementKind> for Selector {
    fn from(kind: ElementKind) -> Self {
        Self::from_mask(kind.bit())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ranks_and_names() {
        assert_eq!(ElementKind::Node.rank(), 1);
        assert_eq!(ElementKind::Way.rank(), 2);
        assert_eq!(ElementKind::Relation.rank(), 3);
        assert_eq!(ElementKind::Relation.to_string(), "relation");
        assert!(ElementKind::Node < ElementKind::Relation);
    }

    #[test]
    fn test_selector_names() {
        assert_eq!(Selector::Node.to_string(), "node");
        assert_eq!(Selector::Way.to_string(), "way");
        assert_eq!(Selector::Relation.to_string(), "relation");
        assert_eq!(Selector::NodeWay.to_string(), "nw");
        assert_eq!(Selector::NodeRelation.to_string(), "nr");
        assert_eq!(Selector::WayRelation.to_string(), "wr");
        assert_eq!(Selector::NodeWayRelation.to_string(), "nwr");
    }

    #[test]
    fn test_from_ranks_every_subset() {
        let subsets: [&[u8]; 7] = [&[1], &[2], &[3], &[1, 2], &[1, 3], &[2, 3], &[1, 2, 3]];
        for ranks in subsets {
            let selector = Selector::from_ranks(ranks).unwrap();
            let expected: String = if ranks.len() == 1 {
                ElementKind::from_rank(ranks[0]).unwrap().name().to_string()
            } else {
                ranks
                    .iter()
                    .map(|r| ElementKind::from_rank(*r).unwrap().initial())
                    .collect()
            };
            assert_eq!(selector.to_string(), expected);

            let mut reversed = ranks.to_vec();
            reversed.reverse();
            assert_eq!(Selector::from_ranks(&reversed).unwrap(), selector);
        }
    }

    #[test]
    fn test_from_ranks_rejects_bad_input() {
        assert!(matches!(Selector::from_ranks(&[]), Err(Error::InvalidSelector(_))));
        assert!(matches!(Selector::from_ranks(&[0]), Err(Error::InvalidSelector(_))));
        assert!(matches!(Selector::from_ranks(&[4]), Err(Error::InvalidSelector(_))));
        assert!(matches!(Selector::from_ranks(&[1, 1]), Err(Error::InvalidSelector(_))));
        assert!(matches!(
            Selector::from_ranks(&[1, 2, 3, 1]),
            Err(Error::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_merge_and_contains() {
        assert_eq!(Selector::Relation.merge(Selector::Node), Selector::NodeRelation);
        assert_eq!(Selector::Node.merge(Selector::Node), Selector::Node);
        assert_eq!(
            Selector::NodeWay.merge(Selector::WayRelation),
            Selector::NodeWayRelation
        );
        assert!(Selector::NodeRelation.contains(ElementKind::Relation));
        assert!(!Selector::NodeRelation.contains(ElementKind::Way));
        assert!(Selector::Way.is_primitive());
        assert!(!Selector::WayRelation.is_primitive());
    }

    #[test]
    fn test_from_kinds() {
        let selector = Selector::from_kinds([ElementKind::Way, ElementKind::Node, ElementKind::Way]);
        assert_eq!(selector.unwrap(), Selector::NodeWay);
        assert!(Selector::from_kinds(Vec::new()).is_err());
        assert_eq!(Selector::from(ElementKind::Way), Selector::Way);
    }
}
