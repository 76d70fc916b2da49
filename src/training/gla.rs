//! The Gradual Learning Algorithm training loop.
//!
//! One run is a sequential sample → update → evaluate cycle:
//!
//! ```text
//! seed ─▶ StdRng ─▶ initial weights
//!                    │
//!         ┌──────────▼──────────┐
//!         │ draw record (freq)  │◀──────────────┐
//!         │ update rule         │               │
//!         │ changed? evaluate   │── continue ───┘
//!         └──────────┬──────────┘
//!                    ▼
//!    perfect fit | plateau | iteration budget | cancelled
//! ```
//!
//! Every random choice (initial weights, record draws, failure-pair picks)
//! comes from the run's own `StdRng`, so a `TrainingResult` is reproducible
//! from its `random_seed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::TrainingOptions;
use crate::error::{HgError, Result};
use crate::types::{
    ConstraintId, Dataset, Grammar, StopReason, TracePoint, TrainingResult, WeightVector,
};

use super::evaluate::Evaluator;
use super::sampler::SampleSelector;
use super::update::UpdateRule;

/// External stop signal, checked once per sample step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Best weights seen so far.
#[derive(Debug, Clone)]
struct BestSeen {
    accuracy: f64,
    weights: WeightVector,
    iteration: usize,
    sample: usize,
}

/// Drives repeated sample + update cycles for one dataset.
pub struct TrainingLoop<'a> {
    grammar: &'a Grammar,
    dataset: &'a Dataset,
    options: TrainingOptions,
    cancel: Option<CancelToken>,
}

impl<'a> TrainingLoop<'a> {
    /// Validate inputs and options; nothing is sampled yet.
    pub fn new(
        grammar: &'a Grammar,
        dataset: &'a Dataset,
        constraints: &[ConstraintId],
        options: TrainingOptions,
    ) -> Result<Self> {
        options.validate()?;

        if constraints.is_empty() {
            return Err(HgError::malformed("constraints", "no active constraints"));
        }
        if constraints != grammar.constraints() {
            return Err(HgError::malformed(
                "constraints",
                format!(
                    "grammar was built for constraints {:?}, run requested {:?}",
                    grammar.constraints(),
                    constraints
                ),
            ));
        }
        if dataset.is_empty() {
            return Err(HgError::malformed("dataset", "no records"));
        }
        dataset.validate(grammar)?;

        Ok(Self {
            grammar,
            dataset,
            options,
            cancel: None,
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Run to completion. Always returns a result, converged or not.
    pub fn run(&self) -> Result<TrainingResult> {
        let opts = &self.options;
        let seed = opts
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(1..=1000));
        let mut rng = StdRng::seed_from_u64(seed);

        let selector = SampleSelector::new(self.dataset)?;
        let rule = UpdateRule::from_options(opts);
        let evaluator = Evaluator::new(opts.tie_epsilon);

        let initial_weights = opts
            .weight_init
            .initialize(self.grammar.dimension(), &mut rng);
        let mut weights = initial_weights.clone();

        let initial_accuracy = evaluator.accuracy(&weights, self.grammar, self.dataset)?;
        let mut best = BestSeen {
            accuracy: initial_accuracy,
            weights: weights.clone(),
            iteration: 0,
            sample: 0,
        };

        info!(
            seed,
            records = self.dataset.len(),
            constraints = self.grammar.dimension(),
            initial_accuracy,
            "starting training run"
        );

        let mut trace = Vec::new();
        // accepted updates so far / index of the next draw
        let mut accepted = 0usize;
        let mut sample = 1usize;

        let stop_reason = loop {
            if best.accuracy >= 1.0 {
                break StopReason::PerfectFit;
            }
            let bound = opts
                .plateau
                .bound(self.dataset.len(), opts.iterations, best.sample);
            if sample >= bound {
                break StopReason::Plateau;
            }
            if accepted >= opts.iterations {
                break StopReason::IterationBudget;
            }
            if self.cancelled() {
                break StopReason::Cancelled;
            }

            let datum = selector.next_datum(&mut rng);
            let outcome = rule.update(self.grammar, datum, &mut weights, &mut rng)?;

            if outcome.changed_weights() {
                accepted += 1;
                let accuracy = evaluator.accuracy(&weights, self.grammar, self.dataset)?;
                if accuracy > best.accuracy {
                    best = BestSeen {
                        accuracy,
                        weights: weights.clone(),
                        iteration: accepted,
                        sample,
                    };
                }
                trace.push(TracePoint {
                    iteration: accepted,
                    sample,
                    accuracy,
                    best_accuracy: best.accuracy,
                });
                debug!(iteration = accepted, sample, accuracy, "accepted update");
            }
            sample += 1;
        };

        let total_samples = sample - 1;
        match stop_reason {
            StopReason::PerfectFit => info!(
                iteration = best.iteration,
                total_samples, "reached an accuracy of 1"
            ),
            StopReason::Plateau => info!(
                total_samples,
                since_best = total_samples.saturating_sub(best.sample),
                max_accuracy = best.accuracy,
                "no improvement, stopping"
            ),
            StopReason::IterationBudget => info!(
                iterations = accepted,
                max_accuracy = best.accuracy,
                "iteration budget used up"
            ),
            StopReason::Cancelled => info!(total_samples, "training cancelled"),
        }

        Ok(TrainingResult {
            max_accuracy: best.accuracy,
            iteration_of_max: best.iteration,
            weights_at_max: best.weights,
            initial_weights,
            samples_to_max: best.sample,
            total_samples,
            random_seed: seed,
            tie_epsilon: opts.tie_epsilon,
            accepted_updates: accepted,
            stop_reason,
            trace,
        })
    }
}

/// Train weights for one dataset.
///
/// Validates the options and data, then runs the GLA to a stop condition.
pub fn run(
    grammar: &Grammar,
    dataset: &Dataset,
    constraints: &[ConstraintId],
    options: &TrainingOptions,
) -> Result<TrainingResult> {
    TrainingLoop::new(grammar, dataset, constraints, options.clone())?.run()
}

/// [`run`] with an external cancellation signal.
pub fn run_with_cancel(
    grammar: &Grammar,
    dataset: &Dataset,
    constraints: &[ConstraintId],
    options: &TrainingOptions,
    cancel: CancelToken,
) -> Result<TrainingResult> {
    TrainingLoop::new(grammar, dataset, constraints, options.clone())?
        .with_cancel(cancel)
        .run()
}
