//! Separating-set record.
//!
//! For every unordered pair the search judged independent, [`SepsetMap`]
//! stores the conditioning set that justified removing the edge. Entries are
//! write-once: the first set recorded for a pair is kept, and a later,
//! different set for the same pair is reported as a conflict instead of
//! overwriting it.

use std::collections::BTreeMap;

use crate::search::variable::Variable;

/// Result of [`SepsetMap::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SepsetInsert {
    /// The pair had no entry; the set was recorded.
    Inserted,
    /// The pair already held this exact set.
    Unchanged,
    /// The pair already held a different set, which was kept.
    Conflict { existing: Vec<Variable> },
}

/// Conditioning sets keyed by unordered variable pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SepsetMap {
    entries: BTreeMap<(Variable, Variable), Vec<Variable>>,
}

fn key(x: &Variable, y: &Variable) -> (Variable, Variable) {
    if x <= y {
        (x.clone(), y.clone())
    } else {
        (y.clone(), x.clone())
    }
}

impl SepsetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `sepset` for `{x, y}` unless the pair already has an entry.
    pub fn insert(&mut self, x: &Variable, y: &Variable, sepset: Vec<Variable>) -> SepsetInsert {
        match self.entries.get(&key(x, y)) {
            None => {
                self.entries.insert(key(x, y), sepset);
                SepsetInsert::Inserted
            }
            Some(existing) if *existing == sepset => SepsetInsert::Unchanged,
            Some(existing) => SepsetInsert::Conflict {
                existing: existing.clone(),
            },
        }
    }

    /// The separating set for `{x, y}`, in either argument order.
    pub fn get(&self, x: &Variable, y: &Variable) -> Option<&[Variable]> {
        self.entries.get(&key(x, y)).map(Vec::as_slice)
    }

    pub fn contains(&self, x: &Variable, y: &Variable) -> bool {
        self.entries.contains_key(&key(x, y))
    }

    /// Is `z` in the separating set of `{x, y}`? `false` when the pair has
    /// no entry.
    pub fn separates_with(&self, x: &Variable, y: &Variable, z: &Variable) -> bool {
        self.get(x, y).map(|s| s.contains(z)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as `(x, y, sepset)` with `x < y` by name, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Variable, &[Variable])> {
        self.entries
            .iter()
            .map(|((x, y), s)| (x, y, s.as_slice()))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SepsetMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        #[derive(serde::Serialize)]
        struct Entry<'a> {
            x: &'a Variable,
            y: &'a Variable,
            sepset: &'a [Variable],
        }

        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (x, y, sepset) in self.iter() {
            seq.serialize_element(&Entry { x, y, sepset })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::variable::variables;

    #[test]
    fn lookup_is_order_insensitive() {
        let vs = variables(["A", "B", "C"]);
        let mut m = SepsetMap::new();
        assert_eq!(m.insert(&vs[1], &vs[0], vec![vs[2].clone()]), SepsetInsert::Inserted);
        assert_eq!(m.get(&vs[0], &vs[1]), Some(&vs[2..3]));
        assert_eq!(m.get(&vs[1], &vs[0]), Some(&vs[2..3]));
        assert!(m.separates_with(&vs[0], &vs[1], &vs[2]));
        assert!(!m.contains(&vs[0], &vs[2]));
    }

    #[test]
    fn first_entry_wins() {
        let vs = variables(["A", "B", "C", "D"]);
        let mut m = SepsetMap::new();
        m.insert(&vs[0], &vs[1], vec![vs[2].clone()]);
        assert_eq!(
            m.insert(&vs[0], &vs[1], vec![vs[2].clone()]),
            SepsetInsert::Unchanged
        );
        assert_eq!(
            m.insert(&vs[1], &vs[0], vec![vs[3].clone()]),
            SepsetInsert::Conflict {
                existing: vec![vs[2].clone()]
            }
        );
        assert_eq!(m.get(&vs[0], &vs[1]), Some(&vs[2..3]));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn empty_sepset_is_an_entry() {
        let vs = variables(["A", "B"]);
        let mut m = SepsetMap::new();
        m.insert(&vs[0], &vs[1], Vec::new());
        assert_eq!(m.get(&vs[0], &vs[1]), Some(&[][..]));
        assert!(!m.separates_with(&vs[0], &vs[1], &vs[0]));
    }

    #[test]
    fn iteration_is_name_ordered() {
        let vs = variables(["C", "B", "A"]);
        let mut m = SepsetMap::new();
        m.insert(&vs[0], &vs[1], Vec::new());
        m.insert(&vs[2], &vs[0], Vec::new());
        let pairs: Vec<_> = m.iter().map(|(x, y, _)| (x.name(), y.name())).collect();
        assert_eq!(pairs, vec![("A", "C"), ("B", "C")]);
    }
}
