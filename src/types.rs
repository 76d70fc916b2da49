//! Core data model: grammars, observed data, weights and run results.
//!
//! The grammar and dataset are built once by the loaders and are read-only
//! afterwards. All tables are `BTreeMap`s so iteration order (and with it
//! every tie-break) is fixed by [`CandidateId`]'s ordering rather than by a
//! hash seed.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{HgError, Result};

/// Identifier of a constraint as numbered in the constraints file (1-based).
pub type ConstraintId = u32;

/// Violation counts of one candidate, one entry per active constraint.
pub type ViolationVector = Vec<f64>;

/// Constraint weights, aligned with the active-constraint order.
pub type WeightVector = Vec<f64>;

/// Candidate table of one input, iterated in candidate order.
pub type CandidateTable = BTreeMap<CandidateId, ViolationVector>;

/// Identifier of a candidate output.
///
/// Ordering is "natural": ids that both parse as unsigned integers compare
/// numerically (`"2" < "10"`), numeric ids sort before non-numeric ones, and
/// everything else compares as plain strings. The raw string breaks any
/// remaining tie so the order stays consistent with equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for CandidateId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for CandidateId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CandidateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Violation table: input id -> candidate id -> violation vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grammar {
    constraints: Vec<ConstraintId>,
    inputs: BTreeMap<String, CandidateTable>,
}

impl Grammar {
    /// Create an empty grammar over the given active constraints.
    pub fn new(constraints: Vec<ConstraintId>) -> Self {
        Self {
            constraints,
            inputs: BTreeMap::new(),
        }
    }

    /// Active constraint ids, in column order.
    pub fn constraints(&self) -> &[ConstraintId] {
        &self.constraints
    }

    /// Length every violation vector must have.
    pub fn dimension(&self) -> usize {
        self.constraints.len()
    }

    /// Add one candidate row.
    ///
    /// Rejects vectors of the wrong length, negative or non-finite counts,
    /// and a second row for an existing candidate.
    pub fn insert_candidate(
        &mut self,
        input: impl Into<String>,
        candidate: impl Into<CandidateId>,
        violations: ViolationVector,
    ) -> Result<()> {
        let input = input.into();
        let candidate = candidate.into();

        if violations.len() != self.dimension() {
            return Err(HgError::malformed(
                format!("input {}, candidate {}", input, candidate),
                format!(
                    "{} violation counts for {} active constraints",
                    violations.len(),
                    self.dimension()
                ),
            ));
        }
        if let Some(bad) = violations.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(HgError::malformed(
                format!("input {}, candidate {}", input, candidate),
                format!("violation count {} is not a non-negative number", bad),
            ));
        }

        let table = self.inputs.entry(input.clone()).or_default();
        if table.contains_key(&candidate) {
            return Err(HgError::malformed(
                format!("input {}", input),
                format!("duplicate candidate {}", candidate),
            ));
        }
        table.insert(candidate, violations);
        Ok(())
    }

    /// Candidate table of an input.
    pub fn candidates(&self, input: &str) -> Result<&CandidateTable> {
        self.inputs
            .get(input)
            .ok_or_else(|| HgError::UnknownInput(input.to_string()))
    }

    /// Violation vector of one candidate.
    pub fn violations(&self, input: &str, candidate: &CandidateId) -> Result<&ViolationVector> {
        self.candidates(input)?.get(candidate).ok_or_else(|| {
            HgError::malformed(
                format!("input {}", input),
                format!("candidate {} is not in the candidate pool", candidate),
            )
        })
    }

    pub fn contains_input(&self, input: &str) -> bool {
        self.inputs.contains_key(input)
    }

    /// Input ids in sorted order.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Project onto a subset of the active constraints, in the given order.
    pub fn project(&self, constraints: &[ConstraintId]) -> Result<Grammar> {
        let columns = constraints
            .iter()
            .map(|id| {
                self.constraints
                    .iter()
                    .position(|c| c == id)
                    .ok_or_else(|| {
                        HgError::Configuration(format!("constraint {} is not active", id))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let inputs = self
            .inputs
            .iter()
            .map(|(input, table)| {
                let table = table
                    .iter()
                    .map(|(cand, v)| (cand.clone(), columns.iter().map(|&i| v[i]).collect()))
                    .collect();
                (input.clone(), table)
            })
            .collect();

        Ok(Grammar {
            constraints: constraints.to_vec(),
            inputs,
        })
    }

    /// Same grammar with one constraint column removed.
    pub fn without_constraint(&self, id: ConstraintId) -> Result<Grammar> {
        if !self.constraints.contains(&id) {
            return Err(HgError::Configuration(format!(
                "constraint {} is not active",
                id
            )));
        }
        let kept: Vec<_> = self.constraints.iter().copied().filter(|c| *c != id).collect();
        self.project(&kept)
    }
}

/// One observed record: an input, its acceptable outputs and a frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub input: String,
    /// Simultaneously acceptable outputs; the model must predict all of them.
    pub targets: Vec<CandidateId>,
    /// Relative frequency used by the sampler.
    pub frequency: u64,
}

impl Datum {
    /// Record whose frequency equals its number of targets.
    pub fn new(input: impl Into<String>, targets: Vec<CandidateId>) -> Self {
        let frequency = targets.len() as u64;
        Self {
            input: input.into(),
            targets,
            frequency,
        }
    }

    pub fn with_frequency(mut self, frequency: u64) -> Self {
        self.frequency = frequency;
        self
    }
}

/// Observed data for one speaker/participant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    data: Vec<Datum>,
}

impl Dataset {
    pub fn new(data: Vec<Datum>) -> Self {
        Self { data }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Datum> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[Datum] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sum of all frequencies (the sampler's draw range).
    pub fn total_frequency(&self) -> u64 {
        self.data.iter().map(|d| d.frequency).sum()
    }

    /// Sum of target counts (the evaluator's denominator).
    pub fn total_targets(&self) -> usize {
        self.data.iter().map(|d| d.targets.len()).sum()
    }

    /// Check every record against the grammar.
    ///
    /// Each input must exist, each target must be in its input's pool,
    /// targets must be non-empty and distinct, and frequencies positive.
    pub fn validate(&self, grammar: &Grammar) -> Result<()> {
        for (i, datum) in self.data.iter().enumerate() {
            let origin = format!("record {} (input {})", i + 1, datum.input);
            let pool = grammar
                .candidates(&datum.input)
                .map_err(|_| HgError::malformed(&origin, "input has no grammar entry"))?;

            if datum.targets.is_empty() {
                return Err(HgError::malformed(origin, "no target candidates"));
            }
            if datum.frequency == 0 {
                return Err(HgError::malformed(origin, "frequency must be at least 1"));
            }

            let mut seen = HashSet::new();
            for target in &datum.targets {
                if !pool.contains_key(target) {
                    return Err(HgError::malformed(
                        origin,
                        format!("target {} is not in the candidate pool", target),
                    ));
                }
                if !seen.insert(target) {
                    return Err(HgError::malformed(
                        origin,
                        format!("target {} listed twice", target),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<Datum>> for Dataset {
    fn from(data: Vec<Datum>) -> Self {
        Self::new(data)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Datum;
    type IntoIter = std::slice::Iter<'a, Datum>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// Why a training run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Best accuracy reached 1.0
    PerfectFit,
    /// Too many samples without improvement
    Plateau,
    /// Accepted-update budget used up
    IterationBudget,
    /// External cancellation observed
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StopReason::PerfectFit => "perfect fit",
            StopReason::Plateau => "plateau",
            StopReason::IterationBudget => "iteration budget",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Accuracy after one accepted update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    /// Accepted-update counter (1-based)
    pub iteration: usize,
    /// Index of the draw that produced the update (1-based)
    pub sample: usize,
    pub accuracy: f64,
    /// Best accuracy seen so far, including this point
    pub best_accuracy: f64,
}

/// Outcome of one training run. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingResult {
    pub max_accuracy: f64,
    /// Accepted update that first reached `max_accuracy` (0 = initial weights)
    pub iteration_of_max: usize,
    pub weights_at_max: WeightVector,
    pub initial_weights: WeightVector,
    /// Draw that first reached `max_accuracy` (0 = initial weights)
    pub samples_to_max: usize,
    /// Draws made over the whole run
    pub total_samples: usize,
    pub random_seed: u64,
    /// Tie tolerance the run ranked candidates with
    pub tie_epsilon: f64,
    pub accepted_updates: usize,
    pub stop_reason: StopReason,
    pub trace: Vec<TracePoint>,
}

impl TrainingResult {
    pub fn is_perfect(&self) -> bool {
        self.max_accuracy >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<CandidateId> {
        raw.iter().map(|s| CandidateId::from(*s)).collect()
    }

    fn small_grammar() -> Grammar {
        let mut g = Grammar::new(vec![1, 2, 3]);
        g.insert_candidate("A", "1", vec![0.0, 1.0, 2.0]).unwrap();
        g.insert_candidate("A", "2", vec![1.0, 0.0, 0.0]).unwrap();
        g.insert_candidate("B", "1", vec![3.0, 0.0, 1.0]).unwrap();
        g
    }

    #[test]
    fn test_candidate_order_is_natural() {
        let mut sorted = ids(&["10", "b", "2", "a", "1"]);
        sorted.sort();
        assert_eq!(sorted, ids(&["1", "2", "10", "a", "b"]));
    }

    #[test]
    fn test_candidate_order_consistent_with_eq() {
        let a = CandidateId::from("01");
        let b = CandidateId::from("1");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_insert_rejects_wrong_dimension() {
        let mut g = Grammar::new(vec![1, 2]);
        let err = g.insert_candidate("A", "1", vec![0.0]).unwrap_err();
        assert!(matches!(err, HgError::MalformedInput { .. }));
    }

    #[test]
    fn test_insert_rejects_negative_and_duplicate() {
        let mut g = Grammar::new(vec![1]);
        assert!(g.insert_candidate("A", "1", vec![-1.0]).is_err());
        g.insert_candidate("A", "1", vec![1.0]).unwrap();
        assert!(g.insert_candidate("A", "1", vec![2.0]).is_err());
    }

    #[test]
    fn test_without_constraint_drops_column() {
        let g = small_grammar();
        let reduced = g.without_constraint(2).unwrap();
        assert_eq!(reduced.constraints(), &[1, 3]);
        let v = reduced.violations("A", &CandidateId::from("1")).unwrap();
        assert_eq!(v, &vec![0.0, 2.0]);
        assert!(g.without_constraint(9).is_err());
    }

    #[test]
    fn test_unknown_input() {
        let g = small_grammar();
        assert!(matches!(g.candidates("Z"), Err(HgError::UnknownInput(_))));
    }

    #[test]
    fn test_dataset_validate() {
        let g = small_grammar();

        let ok = Dataset::new(vec![Datum::new("A", ids(&["1", "2"])), Datum::new("B", ids(&["1"]))]);
        assert!(ok.validate(&g).is_ok());
        assert_eq!(ok.total_frequency(), 3);
        assert_eq!(ok.total_targets(), 3);

        let missing_target = Dataset::new(vec![Datum::new("A", ids(&["7"]))]);
        assert!(missing_target.validate(&g).is_err());

        let missing_input = Dataset::new(vec![Datum::new("Q", ids(&["1"]))]);
        assert!(missing_input.validate(&g).is_err());

        let duplicate = Dataset::new(vec![Datum::new("A", ids(&["1", "1"]))]);
        assert!(duplicate.validate(&g).is_err());

        let zero = Dataset::new(vec![Datum::new("A", ids(&["1"])).with_frequency(0)]);
        assert!(zero.validate(&g).is_err());
    }
}
