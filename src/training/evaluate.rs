//! Whole-dataset accuracy under a fixed weight vector.
//!
//! A record is correct when its predicted winner set equals its target set
//! (order irrelevant). Correct records contribute their target count, and
//! the sum is divided by the total target count of the dataset.

use std::collections::HashSet;

use crate::error::Result;
use crate::ranking::{CandidateRanker, DEFAULT_TIE_EPSILON};
use crate::types::{CandidateId, Dataset, Datum, Grammar};

/// Scores weight vectors against a dataset.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    ranker: CandidateRanker,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_TIE_EPSILON)
    }
}

impl Evaluator {
    pub fn new(tie_epsilon: f64) -> Self {
        Self {
            ranker: CandidateRanker::new(tie_epsilon),
        }
    }

    /// True when the predicted winners of `datum` are exactly its targets.
    pub fn is_correct(&self, weights: &[f64], grammar: &Grammar, datum: &Datum) -> Result<bool> {
        let predicted =
            self.ranker
                .optimize(grammar, weights, &datum.input, datum.targets.len())?;
        let targets: HashSet<&CandidateId> = datum.targets.iter().collect();
        Ok(predicted.keys().all(|c| targets.contains(c)))
    }

    /// Accuracy in [0, 1]; 0.0 for a dataset without targets.
    pub fn accuracy(&self, weights: &[f64], grammar: &Grammar, dataset: &Dataset) -> Result<f64> {
        let total = dataset.total_targets();
        if total == 0 {
            return Ok(0.0);
        }

        let mut correct = 0usize;
        for datum in dataset {
            if self.is_correct(weights, grammar, datum)? {
                correct += datum.targets.len();
            }
        }

        Ok(correct as f64 / total as f64)
    }
}

/// Accuracy of `weights` on `dataset` with the default tie tolerance.
pub fn evaluate(weights: &[f64], grammar: &Grammar, dataset: &Dataset) -> Result<f64> {
    Evaluator::default().accuracy(weights, grammar, dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<CandidateId> {
        raw.iter().map(|s| CandidateId::from(*s)).collect()
    }

    fn grammar() -> Grammar {
        let mut g = Grammar::new(vec![1, 2]);
        g.insert_candidate("A", "1", vec![0.0, 2.0]).unwrap();
        g.insert_candidate("A", "2", vec![1.0, 0.0]).unwrap();
        g.insert_candidate("B", "1", vec![1.0, 1.0]).unwrap();
        g.insert_candidate("B", "2", vec![0.0, 3.0]).unwrap();
        g.insert_candidate("B", "3", vec![3.0, 0.0]).unwrap();
        g
    }

    #[test]
    fn test_perfect_accuracy() {
        let g = grammar();
        // w = [1, 1]: A -> 2 (-1 vs -2); B -> 1 (-2), then 2/3 tie at -3 -> 2
        let data = Dataset::new(vec![
            Datum::new("A", ids(&["2"])),
            Datum::new("B", ids(&["2", "1"])),
        ]);
        assert_eq!(evaluate(&[1.0, 1.0], &g, &data).unwrap(), 1.0);
    }

    #[test]
    fn test_partial_accuracy_weights_by_target_count() {
        let g = grammar();
        let data = Dataset::new(vec![
            Datum::new("A", ids(&["1"])),      // wrong: 1 target
            Datum::new("B", ids(&["1", "2"])), // right: 2 targets
        ]);
        let acc = evaluate(&[1.0, 1.0], &g, &data).unwrap();
        assert!((acc - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_accuracy() {
        let g = grammar();
        let data = Dataset::new(vec![Datum::new("A", ids(&["1"]))]);
        assert_eq!(evaluate(&[1.0, 1.0], &g, &data).unwrap(), 0.0);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let g = grammar();
        let data = Dataset::new(vec![
            Datum::new("A", ids(&["1"])),
            Datum::new("B", ids(&["3"])),
        ]);
        let w = [0.3, 0.9];
        let first = evaluate(&w, &g, &data).unwrap();
        for _ in 0..5 {
            assert_eq!(evaluate(&w, &g, &data).unwrap(), first);
        }
        assert!((0.0..=1.0).contains(&first));
    }

    #[test]
    fn test_empty_dataset() {
        assert_eq!(evaluate(&[1.0, 1.0], &grammar(), &Dataset::default()).unwrap(), 0.0);
    }
}
