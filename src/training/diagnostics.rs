//! Post-training failure diagnostics.
//!
//! For every target of every record, under the best weights of a run:
//! compute the harmony of the whole candidate pool, count the candidates
//! that rank above or tie with the target (rank = 1 + that count), and
//! report those competitors that are not themselves targets as failures.

use std::collections::HashSet;

use crate::error::{HgError, Result};
use crate::ranking::{CandidateRanker, DEFAULT_TIE_EPSILON, at_least};
use crate::types::{CandidateId, ConstraintId, Dataset, Grammar, TrainingResult};

/// Ranking of one target under the trained weights.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDiagnostic {
    pub input: String,
    pub target: CandidateId,
    pub harmony: f64,
    /// 1 + number of other candidates at or above the target
    pub rank: usize,
    /// Non-target competitors at or above the target, in candidate order
    pub failures: Vec<CandidateId>,
    /// Number of candidates for the input
    pub pool_size: usize,
}

impl TargetDiagnostic {
    pub fn is_failure(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Ranks every target against its whole candidate pool.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticReporter {
    ranker: CandidateRanker,
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new(DEFAULT_TIE_EPSILON)
    }
}

impl DiagnosticReporter {
    pub fn new(tie_epsilon: f64) -> Self {
        Self {
            ranker: CandidateRanker::new(tie_epsilon),
        }
    }

    /// One record per (record, target), in dataset order.
    pub fn find_failures(
        &self,
        grammar: &Grammar,
        dataset: &Dataset,
        weights: &[f64],
    ) -> Result<Vec<TargetDiagnostic>> {
        let epsilon = self.ranker.tie_epsilon();
        let mut records = Vec::with_capacity(dataset.total_targets());

        for datum in dataset {
            let scores = self.ranker.score_all(grammar, weights, &datum.input)?;
            let targets: HashSet<&CandidateId> = datum.targets.iter().collect();

            for target in &datum.targets {
                let h_t = scores
                    .iter()
                    .find(|(c, _)| c == target)
                    .map(|(_, h)| *h)
                    .ok_or_else(|| {
                        HgError::malformed(
                            format!("input {}", datum.input),
                            format!("target {} is not in the candidate pool", target),
                        )
                    })?;

                let above: Vec<&CandidateId> = scores
                    .iter()
                    .filter(|(c, h)| c != target && at_least(*h, h_t, epsilon))
                    .map(|(c, _)| c)
                    .collect();

                records.push(TargetDiagnostic {
                    input: datum.input.clone(),
                    target: target.clone(),
                    harmony: h_t,
                    rank: 1 + above.len(),
                    failures: above
                        .into_iter()
                        .filter(|c| !targets.contains(c))
                        .cloned()
                        .collect(),
                    pool_size: scores.len(),
                });
            }
        }

        Ok(records)
    }
}

/// Diagnose a finished run using its best weights and tie tolerance.
pub fn diagnose(
    grammar: &Grammar,
    dataset: &Dataset,
    constraints: &[ConstraintId],
    result: &TrainingResult,
) -> Result<Vec<TargetDiagnostic>> {
    if constraints.len() != result.weights_at_max.len() {
        return Err(HgError::DimensionMismatch {
            expected: constraints.len(),
            actual: result.weights_at_max.len(),
        });
    }
    DiagnosticReporter::new(result.tie_epsilon).find_failures(
        grammar,
        dataset,
        &result.weights_at_max,
    )
}
