//! Background knowledge: forbidden and required edges.
//!
//! Knowledge is expressed over ordered pairs of variable names. An ordered
//! pair `(a, b)` reads "a may (not) be a direct cause of b". Constraints come
//! from two sources:
//!
//! - explicit pairs added with [`Knowledge::forbid`] / [`Knowledge::require`];
//! - temporal tiers: a variable in a later tier can never cause one in an
//!   earlier tier, and a tier may additionally forbid all edges inside it.
//!
//! The search only reads knowledge. It never mutates it.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::search::errors::SearchError;
use crate::search::variable::{VarId, Variable, VariableIndex};

/// Forbidden/required edge constraints over variable names.
#[derive(Debug, Clone, Default)]
pub struct Knowledge {
    forbidden: BTreeSet<(String, String)>,
    required: BTreeSet<(String, String)>,
    tier_of: FxHashMap<String, usize>,
    forbidden_within: FxHashSet<usize>,
}

impl Knowledge {
    /// Knowledge with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no constraint of any kind has been added.
    pub fn is_empty(&self) -> bool {
        self.forbidden.is_empty()
            && self.required.is_empty()
            && self.tier_of.is_empty()
            && self.forbidden_within.is_empty()
    }

    /// Forbids `a -> b`.
    ///
    /// Fails if `a -> b` is already required.
    pub fn forbid(&mut self, a: &str, b: &str) -> Result<&mut Self, SearchError> {
        if self.is_required(a, b) {
            return Err(SearchError::KnowledgeConflict(format!(
                "cannot forbid {a} -> {b}: edge is required"
            )));
        }
        self.forbidden.insert((a.to_string(), b.to_string()));
        Ok(self)
    }

    /// Forbids the edge in both directions.
    pub fn forbid_edge(&mut self, a: &str, b: &str) -> Result<&mut Self, SearchError> {
        self.forbid(a, b)?;
        self.forbid(b, a)
    }

    /// Requires `a -> b`.
    ///
    /// Fails if `a -> b` is forbidden explicitly or by tiers.
    pub fn require(&mut self, a: &str, b: &str) -> Result<&mut Self, SearchError> {
        if self.is_forbidden(a, b) {
            return Err(SearchError::KnowledgeConflict(format!(
                "cannot require {a} -> {b}: edge is forbidden"
            )));
        }
        self.required.insert((a.to_string(), b.to_string()));
        Ok(self)
    }

    /// Requires the edge in both directions.
    pub fn require_edge(&mut self, a: &str, b: &str) -> Result<&mut Self, SearchError> {
        self.require(a, b)?;
        self.require(b, a)
    }

    /// Places `names` in temporal tier `tier`, moving any that were already
    /// tiered elsewhere.
    ///
    /// Fails, leaving the previous tiers in place, if the new placement would
    /// forbid an already-required edge.
    pub fn set_tier<I, S>(&mut self, tier: usize, names: I) -> Result<&mut Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let previous = self.tier_of.clone();
        for name in names {
            self.tier_of.insert(name.as_ref().to_string(), tier);
        }
        if let Err(e) = self.check_required_not_forbidden() {
            self.tier_of = previous;
            return Err(e);
        }
        Ok(self)
    }

    /// Forbids every edge between two variables of the same tier.
    pub fn forbid_within_tier(&mut self, tier: usize) -> Result<&mut Self, SearchError> {
        let inserted = self.forbidden_within.insert(tier);
        if let Err(e) = self.check_required_not_forbidden() {
            if inserted {
                self.forbidden_within.remove(&tier);
            }
            return Err(e);
        }
        Ok(self)
    }

    /// The tier of a variable, if it has one.
    pub fn tier(&self, name: &str) -> Option<usize> {
        self.tier_of.get(name).copied()
    }

    /// Is `a -> b` forbidden?
    pub fn is_forbidden(&self, a: &str, b: &str) -> bool {
        if self.forbidden.contains(&(a.to_string(), b.to_string())) {
            return true;
        }
        match (self.tier(a), self.tier(b)) {
            (Some(ta), Some(tb)) if ta > tb => true,
            (Some(ta), Some(tb)) if ta == tb => self.forbidden_within.contains(&ta),
            _ => false,
        }
    }

    /// Is `a -> b` required?
    pub fn is_required(&self, a: &str, b: &str) -> bool {
        self.required.contains(&(a.to_string(), b.to_string()))
    }

    /// True when the edge is required in neither direction, i.e. the search
    /// is allowed to remove it.
    pub fn no_edge_required(&self, a: &str, b: &str) -> bool {
        !(self.is_required(a, b) || self.is_required(b, a))
    }

    /// True when the edge is forbidden in both directions, i.e. no adjacency
    /// between `a` and `b` can exist.
    pub fn is_forbidden_both_ways(&self, a: &str, b: &str) -> bool {
        self.is_forbidden(a, b) && self.is_forbidden(b, a)
    }

    /// Explicitly forbidden ordered pairs, in name order.
    pub fn forbidden_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forbidden.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    /// Required ordered pairs, in name order.
    pub fn required_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.required.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    fn check_required_not_forbidden(&self) -> Result<(), SearchError> {
        for (a, b) in &self.required {
            if self.is_forbidden(a, b) {
                return Err(SearchError::KnowledgeConflict(format!(
                    "required edge {a} -> {b} would be forbidden by tiers"
                )));
            }
        }
        Ok(())
    }

    /// Translates the name-level constraints into id-level lookups for one
    /// search. Constraints naming variables outside `index` are dropped.
    pub(crate) fn resolve(&self, index: &VariableIndex) -> ResolvedKnowledge {
        let id = |name: &str| index.id(&Variable::new(name));
        let pairs = |set: &BTreeSet<(String, String)>| {
            set.iter()
                .filter_map(|(a, b)| Some((id(a)?, id(b)?)))
                .collect::<FxHashSet<_>>()
        };
        ResolvedKnowledge {
            forbidden: pairs(&self.forbidden),
            required: pairs(&self.required),
            tiers: index
                .variables()
                .iter()
                .map(|v| self.tier(v.name()))
                .collect(),
            forbidden_within: self.forbidden_within.clone(),
        }
    }
}

/// [`Knowledge`] keyed by [`VarId`], so the search loop never touches names.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolvedKnowledge {
    forbidden: FxHashSet<(VarId, VarId)>,
    required: FxHashSet<(VarId, VarId)>,
    tiers: Vec<Option<usize>>,
    forbidden_within: FxHashSet<usize>,
}

impl ResolvedKnowledge {
    pub(crate) fn is_forbidden(&self, a: VarId, b: VarId) -> bool {
        if self.forbidden.contains(&(a, b)) {
            return true;
        }
        match (self.tiers[a.index()], self.tiers[b.index()]) {
            (Some(ta), Some(tb)) if ta > tb => true,
            (Some(ta), Some(tb)) if ta == tb => self.forbidden_within.contains(&ta),
            _ => false,
        }
    }

    pub(crate) fn is_required(&self, a: VarId, b: VarId) -> bool {
        self.required.contains(&(a, b))
    }

    pub(crate) fn no_edge_required(&self, a: VarId, b: VarId) -> bool {
        !(self.is_required(a, b) || self.is_required(b, a))
    }

    pub(crate) fn is_forbidden_both_ways(&self, a: VarId, b: VarId) -> bool {
        self.is_forbidden(a, b) && self.is_forbidden(b, a)
    }

    /// May `z` enter a conditioning set for `x`? Only if `z -> x` is not
    /// forbidden and `x -> z` is not required.
    pub(crate) fn is_possible_parent(&self, z: VarId, x: VarId) -> bool {
        !self.is_forbidden(z, x) && !self.is_required(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_knowledge_constrains_nothing() {
        let k = Knowledge::new();
        assert!(k.is_empty());
        assert!(!k.is_forbidden("A", "B"));
        assert!(!k.is_required("A", "B"));
        assert!(k.no_edge_required("A", "B"));
    }

    #[test]
    fn explicit_pairs_are_directional() {
        let mut k = Knowledge::new();
        k.forbid("A", "B").unwrap().require("C", "D").unwrap();

        assert!(k.is_forbidden("A", "B"));
        assert!(!k.is_forbidden("B", "A"));
        assert!(!k.is_forbidden_both_ways("A", "B"));
        assert!(k.is_required("C", "D"));
        assert!(!k.no_edge_required("D", "C"));
        assert!(k.no_edge_required("A", "B"));
    }

    #[test]
    fn tiers_forbid_backwards_edges() {
        let mut k = Knowledge::new();
        k.set_tier(0, ["A", "B"]).unwrap();
        k.set_tier(1, ["C"]).unwrap();

        assert!(k.is_forbidden("C", "A"));
        assert!(!k.is_forbidden("A", "C"));
        assert!(!k.is_forbidden("A", "B"));

        k.forbid_within_tier(0).unwrap();
        assert!(k.is_forbidden_both_ways("A", "B"));
    }

    #[test]
    fn set_tier_moves_variables() {
        let mut k = Knowledge::new();
        k.set_tier(0, ["A"]).unwrap();
        k.set_tier(2, ["A"]).unwrap();
        assert_eq!(k.tier("A"), Some(2));
    }

    #[test]
    fn conflicting_constraints_are_rejected() {
        let mut k = Knowledge::new();
        k.require("A", "B").unwrap();
        assert!(matches!(
            k.forbid("A", "B"),
            Err(SearchError::KnowledgeConflict(_))
        ));

        k.set_tier(0, ["B"]).unwrap();
        let err = k.set_tier(1, ["A"]).unwrap_err();
        assert!(err.to_string().contains("A -> B"));
        // Rejected placement leaves tiers unchanged.
        assert_eq!(k.tier("A"), None);

        let mut k = Knowledge::new();
        k.forbid("X", "Y").unwrap();
        assert!(k.require("X", "Y").is_err());
        assert!(k.require("Y", "X").is_ok());
    }

    #[test]
    fn listings_are_sorted() {
        let mut k = Knowledge::new();
        k.forbid("B", "A").unwrap().forbid("A", "C").unwrap();
        let listed: Vec<_> = k.forbidden_edges().collect();
        assert_eq!(listed, vec![("A", "C"), ("B", "A")]);
    }

    #[test]
    fn resolved_knowledge_matches_names() {
        let vars = crate::search::variable::variables(["A", "B", "C"]);
        let index = VariableIndex::new(&vars).unwrap();
        let mut k = Knowledge::new();
        k.forbid("C", "A").unwrap();
        k.require("A", "B").unwrap();
        k.forbid("Q", "A").unwrap();
        k.set_tier(0, ["B"]).unwrap().set_tier(1, ["C"]).unwrap();

        let r = k.resolve(&index);
        let (a, b, c) = (VarId(0), VarId(1), VarId(2));
        assert!(r.is_forbidden(c, a));
        assert!(r.is_forbidden(c, b));
        assert!(!r.is_forbidden(b, c));
        assert!(!r.no_edge_required(b, a));
        // C is never a possible parent of A; B is not one either because
        // A -> B is required.
        assert!(!r.is_possible_parent(c, a));
        assert!(!r.is_possible_parent(b, a));
        assert!(r.is_possible_parent(a, c));
    }
}
