//! Lexicographic k-subset enumeration.
//!
//! [`Combinations`] walks all size-`k` index tuples drawn from `0..n` in
//! lexicographic order without materializing them. Each tuple is strictly
//! ascending, so no tuple repeats and none contains a duplicate index.
//!
//! Edge cases:
//! - `k == 0` yields exactly one empty tuple.
//! - `k > n` yields nothing.

use smallvec::SmallVec;

/// Inline capacity for conditioning-set index tuples.
///
/// Conditioning sets deeper than this spill to the heap.
pub const INLINE_TUPLE_SIZE: usize = 8;

/// One index tuple produced by [`Combinations`].
pub type IndexTuple = SmallVec<[usize; INLINE_TUPLE_SIZE]>;

/// Lazy lexicographic enumeration of the size-`k` subsets of `0..n`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    k: usize,
    indices: IndexTuple,
    started: bool,
    done: bool,
}

impl Combinations {
    /// Starts a fresh enumeration of the `k`-subsets of `0..n`.
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: SmallVec::new(),
            started: false,
            done: false,
        }
    }

    /// Advances to the next tuple and returns a view of it.
    ///
    /// Avoids the per-tuple copy made by the `Iterator` impl.
    pub fn advance(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
            if self.k > self.n {
                self.done = true;
                return None;
            }
            self.indices.extend(0..self.k);
            if self.k == 0 {
                self.done = true;
            }
            return Some(&self.indices);
        }

        // Rightmost position that can still move right.
        let (n, k) = (self.n, self.k);
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] < n - k + i) else {
            self.done = true;
            return None;
        };

        self.indices[i] += 1;
        for j in (i + 1)..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(&self.indices)
    }
}

impl Iterator for Combinations {
    type Item = IndexTuple;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().map(SmallVec::from_slice)
    }
}

/// Starts a fresh enumeration of the `k`-subsets of `0..n`.
pub fn generate(n: usize, k: usize) -> Combinations {
    Combinations::new(n, k)
}

/// Binomial coefficient `C(n, k)`, saturating at `u64::MAX`.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
        if acc > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    acc as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn collect(n: usize, k: usize) -> Vec<Vec<usize>> {
        generate(n, k).map(|t| t.to_vec()).collect()
    }

    #[test]
    fn k_zero_yields_single_empty_tuple() {
        assert_eq!(collect(0, 0), vec![Vec::<usize>::new()]);
        assert_eq!(collect(5, 0), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn k_above_n_yields_nothing() {
        assert!(collect(2, 3).is_empty());
        assert!(collect(0, 1).is_empty());
    }

    #[test]
    fn enumerates_lexicographically() {
        assert_eq!(
            collect(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3],
            ]
        );
        assert_eq!(collect(3, 3), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn counts_match_binomial_up_to_twenty() {
        for n in 0usize..=20 {
            for k in [0, 1, 2, n / 2, n.saturating_sub(1), n] {
                let tuples = collect(n, k);
                assert_eq!(tuples.len() as u64, binomial(n, k), "n={n} k={k}");

                let distinct: HashSet<_> = tuples.iter().cloned().collect();
                assert_eq!(distinct.len(), tuples.len());
                for t in &tuples {
                    assert_eq!(t.len(), k);
                    assert!(t.windows(2).all(|w| w[0] < w[1]));
                    assert!(t.iter().all(|&i| i < n));
                }
                assert!(tuples.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn fresh_call_restarts() {
        let mut first = generate(3, 1);
        first.next();
        first.next();
        assert_eq!(generate(3, 1).next().map(|t| t.to_vec()), Some(vec![0]));
    }

    #[test]
    fn exhausted_generator_stays_exhausted() {
        let mut g = generate(2, 2);
        assert!(g.advance().is_some());
        assert!(g.advance().is_none());
        assert!(g.advance().is_none());
    }

    #[test]
    fn binomial_values() {
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(20, 10), 184_756);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(binomial(0, 0), 1);
    }

    proptest::proptest! {
        #[test]
        fn advance_and_iterator_agree(n in 0usize..12, k in 0usize..6) {
            let mut by_view = Vec::new();
            let mut g = Combinations::new(n, k);
            while let Some(t) = g.advance() {
                by_view.push(t.to_vec());
            }
            proptest::prop_assert_eq!(by_view, collect(n, k));
        }
    }
}
