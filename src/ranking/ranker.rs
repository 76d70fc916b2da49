//! Candidate ranking: pick the top-n candidates of an input by harmony.
//!
//! Selection is repeated extraction of the best unselected candidate.
//! Candidates within `tie_epsilon` of the current maximum are tied, and
//! ties go to the first candidate in [`CandidateId`] order, so the result
//! never depends on hash or insertion order.

use std::collections::BTreeMap;

use crate::error::{HgError, Result};
use crate::types::{CandidateId, Grammar};

use super::harmony::{at_least, harmony};

/// Default tolerance for treating two harmonies as equal.
pub const DEFAULT_TIE_EPSILON: f64 = 1e-9;

/// Selects winning candidates under a weight vector.
#[derive(Debug, Clone, Copy)]
pub struct CandidateRanker {
    tie_epsilon: f64,
}

impl Default for CandidateRanker {
    fn default() -> Self {
        Self::new(DEFAULT_TIE_EPSILON)
    }
}

impl CandidateRanker {
    pub fn new(tie_epsilon: f64) -> Self {
        Self { tie_epsilon }
    }

    pub fn tie_epsilon(&self) -> f64 {
        self.tie_epsilon
    }

    /// Harmony of every candidate of `input`, in candidate order.
    pub fn score_all(
        &self,
        grammar: &Grammar,
        weights: &[f64],
        input: &str,
    ) -> Result<Vec<(CandidateId, f64)>> {
        grammar
            .candidates(input)?
            .iter()
            .map(|(cand, v)| Ok((cand.clone(), harmony(v, weights)?)))
            .collect()
    }

    /// Top `n` candidates of `input`, mapped to their harmony.
    ///
    /// Returns exactly `n` distinct candidates. Asking for more winners
    /// than the pool holds is a [`HgError::MalformedInput`].
    pub fn optimize(
        &self,
        grammar: &Grammar,
        weights: &[f64],
        input: &str,
        n: usize,
    ) -> Result<BTreeMap<CandidateId, f64>> {
        let mut pool = self.score_all(grammar, weights, input)?;
        if n > pool.len() {
            return Err(HgError::malformed(
                format!("input {}", input),
                format!("{} winners requested from {} candidates", n, pool.len()),
            ));
        }

        let mut winners = BTreeMap::new();
        while winners.len() < n {
            let best = pool
                .iter()
                .map(|(_, h)| *h)
                .fold(f64::NEG_INFINITY, f64::max);
            // `pool` is in candidate order, so the first tied entry is the smallest id
            let idx = pool
                .iter()
                .position(|(_, h)| at_least(*h, best, self.tie_epsilon))
                .unwrap_or(0);
            let (cand, h) = pool.remove(idx);
            winners.insert(cand, h);
        }

        Ok(winners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        let mut g = Grammar::new(vec![1, 2]);
        g.insert_candidate("A", "1", vec![0.0, 1.0]).unwrap();
        g.insert_candidate("A", "2", vec![1.0, 0.0]).unwrap();
        g.insert_candidate("A", "3", vec![2.0, 2.0]).unwrap();
        g.insert_candidate("A", "10", vec![0.0, 0.0]).unwrap();
        g
    }

    fn keys(winners: &BTreeMap<CandidateId, f64>) -> Vec<&str> {
        winners.keys().map(CandidateId::as_str).collect()
    }

    #[test]
    fn test_optimize_single_winner() {
        let ranker = CandidateRanker::default();
        let winners = ranker.optimize(&grammar(), &[1.0, 1.0], "A", 1).unwrap();
        assert_eq!(keys(&winners), vec!["10"]);
        assert_eq!(winners[&CandidateId::from("10")], 0.0);
    }

    #[test]
    fn test_optimize_tie_goes_to_smallest_id() {
        // "1" and "2" both score -1 after "10"
        let ranker = CandidateRanker::default();
        let winners = ranker.optimize(&grammar(), &[1.0, 1.0], "A", 2).unwrap();
        assert_eq!(keys(&winners), vec!["1", "10"]);
    }

    #[test]
    fn test_optimize_near_tie_within_epsilon() {
        let mut g = Grammar::new(vec![1]);
        g.insert_candidate("A", "1", vec![1.0 + 1e-12]).unwrap();
        g.insert_candidate("A", "2", vec![1.0]).unwrap();

        let tolerant = CandidateRanker::new(1e-9);
        let winners = tolerant.optimize(&g, &[1.0], "A", 1).unwrap();
        assert_eq!(keys(&winners), vec!["1"]);

        let exact = CandidateRanker::new(0.0);
        let winners = exact.optimize(&g, &[1.0], "A", 1).unwrap();
        assert_eq!(keys(&winners), vec!["2"]);
    }

    #[test]
    fn test_optimize_returns_n_distinct() {
        let ranker = CandidateRanker::default();
        let g = grammar();
        for n in 0..=4 {
            let winners = ranker.optimize(&g, &[0.3, -0.7], "A", n).unwrap();
            assert_eq!(winners.len(), n);
        }
    }

    #[test]
    fn test_optimize_too_many_winners() {
        let ranker = CandidateRanker::default();
        assert!(ranker.optimize(&grammar(), &[1.0, 1.0], "A", 5).is_err());
    }

    #[test]
    fn test_optimize_unknown_input() {
        let ranker = CandidateRanker::default();
        let err = ranker.optimize(&grammar(), &[1.0, 1.0], "B", 1).unwrap_err();
        assert!(matches!(err, HgError::UnknownInput(_)));
    }
}
