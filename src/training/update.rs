//! Error-driven weight update for one sampled record.
//!
//! 1. Rank the input's candidates, asking for as many winners as targets.
//! 2. Predicted set equals target set: nothing to learn.
//! 3. Otherwise collect failure pairs (predicted non-target `c`, target `t`)
//!    with `h(c) >= h(t)`. Ties count: the grammar must strictly prefer `t`.
//! 4. No pairs (a pure tie-break artifact): nothing to learn.
//! 5. Otherwise pick one pair uniformly and add
//!    `rate * (violations(c) - violations(t))` to the weights.
//!
//! Step 5 raises the weight of constraints the target violates less than
//! the competitor, pushing the target's harmony above the competitor's.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::TrainingOptions;
use crate::error::Result;
use crate::ranking::{CandidateRanker, at_least, harmony};
use crate::types::{CandidateId, Datum, Grammar};

/// A competitor that ranks at or above a target.
#[derive(Debug, Clone, PartialEq)]
pub struct FailurePair {
    pub competitor: CandidateId,
    pub target: CandidateId,
}

/// Change applied for one failure pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub pair: FailurePair,
    pub delta: Vec<f64>,
    /// False when the delta was zero or fully absorbed by clamping
    pub changed: bool,
}

/// What one update step did.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Predicted winners already match the targets
    Correct,
    /// Mismatch, but no competitor actually reaches a target's harmony
    NoFailures,
    Adjusted(Adjustment),
}

impl UpdateOutcome {
    /// True when at least one weight moved.
    pub fn changed_weights(&self) -> bool {
        matches!(self, UpdateOutcome::Adjusted(a) if a.changed)
    }
}

/// Decides whether and how to nudge the weights from one record.
#[derive(Debug, Clone, Copy)]
pub struct UpdateRule {
    rate: f64,
    allow_negative: bool,
    change_precision: Option<u32>,
    ranker: CandidateRanker,
}

impl UpdateRule {
    pub fn new(rate: f64, allow_negative: bool, tie_epsilon: f64) -> Self {
        Self {
            rate,
            allow_negative,
            change_precision: None,
            ranker: CandidateRanker::new(tie_epsilon),
        }
    }

    pub fn from_options(options: &TrainingOptions) -> Self {
        Self::new(
            options.learning_rate,
            options.allow_negative_weights,
            options.tie_epsilon,
        )
        .with_change_precision(options.change_precision)
    }

    pub fn with_change_precision(mut self, precision: Option<u32>) -> Self {
        self.change_precision = precision;
        self
    }

    /// Failure pairs for a record under the current weights.
    ///
    /// Pairs come out in (competitor, target) candidate order; an empty list
    /// means either the prediction is correct or the mismatch is only a
    /// tie-break artifact.
    pub fn failure_pairs(
        &self,
        grammar: &Grammar,
        datum: &Datum,
        weights: &[f64],
    ) -> Result<Vec<FailurePair>> {
        Ok(self.mismatch(grammar, datum, weights)?.unwrap_or_default())
    }

    /// `None` when the predicted winners equal the targets, otherwise the
    /// (possibly empty) failure pairs.
    fn mismatch(
        &self,
        grammar: &Grammar,
        datum: &Datum,
        weights: &[f64],
    ) -> Result<Option<Vec<FailurePair>>> {
        let predicted =
            self.ranker
                .optimize(grammar, weights, &datum.input, datum.targets.len())?;

        let targets: HashSet<&CandidateId> = datum.targets.iter().collect();
        if predicted.keys().all(|c| targets.contains(c)) {
            return Ok(None);
        }

        let target_harmony = datum
            .targets
            .iter()
            .map(|t| {
                let v = grammar.violations(&datum.input, t)?;
                Ok((t, harmony(v, weights)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut pairs = Vec::new();
        for (competitor, &h_c) in predicted.iter().filter(|(c, _)| !targets.contains(c)) {
            for (target, h_t) in &target_harmony {
                if at_least(h_c, *h_t, self.ranker.tie_epsilon()) {
                    pairs.push(FailurePair {
                        competitor: competitor.clone(),
                        target: (*target).clone(),
                    });
                }
            }
        }
        Ok(Some(pairs))
    }

    /// Apply one update step in place.
    pub fn update<R: Rng>(
        &self,
        grammar: &Grammar,
        datum: &Datum,
        weights: &mut [f64],
        rng: &mut R,
    ) -> Result<UpdateOutcome> {
        let Some(pairs) = self.mismatch(grammar, datum, weights)? else {
            return Ok(UpdateOutcome::Correct);
        };

        let Some(pair) = pairs.choose(rng).cloned() else {
            debug!(input = %datum.input, "set mismatch without failing pair, no update");
            return Ok(UpdateOutcome::NoFailures);
        };

        let competitor = grammar.violations(&datum.input, &pair.competitor)?;
        let target = grammar.violations(&datum.input, &pair.target)?;
        let delta = self.change_vector(competitor, target);

        let mut changed = false;
        for (w, d) in weights.iter_mut().zip(&delta) {
            let mut next = *w + d;
            if !self.allow_negative {
                next = next.max(0.0);
            }
            if next != *w {
                changed = true;
            }
            *w = next;
        }

        debug!(
            input = %datum.input,
            competitor = %pair.competitor,
            target = %pair.target,
            changed,
            "weights adjusted"
        );

        Ok(UpdateOutcome::Adjusted(Adjustment {
            pair,
            delta,
            changed,
        }))
    }

    /// `rate * (competitor - target)`, optionally rounded.
    pub fn change_vector(&self, competitor: &[f64], target: &[f64]) -> Vec<f64> {
        competitor
            .iter()
            .zip(target)
            .map(|(c, t)| {
                let d = self.rate * (c - t);
                match self.change_precision {
                    Some(p) => round_to(d, p),
                    None => d,
                }
            })
            .collect()
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
