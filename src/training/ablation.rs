//! Constraint ablation: which constraints does the data actually need?
//!
//! A baseline run uses every active constraint. Then, for each constraint,
//! the grammar is projected without that column and retrained. The drop in
//! maximum accuracy is the constraint's importance:
//!
//! - importance ~ 0: the data can be fit without it
//! - importance > 0: load-bearing, removing it costs accuracy
//!
//! Runs are independent and share only the (immutable) grammar, so they
//! may execute in parallel; see [`SweepOptions`].

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::info;

use crate::config::TrainingOptions;
use crate::error::{HgError, Result};
use crate::types::{ConstraintId, Dataset, Grammar, TrainingResult};

use super::diagnostics::{TargetDiagnostic, diagnose};
use super::gla::run;

/// How a sweep of independent runs is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOptions {
    /// Run on the rayon pool instead of sequentially
    pub parallel: bool,
    /// Run `k` of the sweep uses seed `base_seed + k`; fresh seeds when absent
    pub base_seed: Option<u64>,
}

impl SweepOptions {
    /// Training options for run `k` of the sweep.
    pub(crate) fn options_for(&self, base: &TrainingOptions, k: usize) -> TrainingOptions {
        let mut options = base.clone();
        if let Some(seed) = self.base_seed {
            options.seed = Some(seed.wrapping_add(k as u64));
        }
        options
    }
}

/// Training outcome with one constraint removed.
#[derive(Debug, Clone)]
pub struct AblationEntry {
    pub removed: ConstraintId,
    /// Constraints the run was trained with
    pub constraints: Vec<ConstraintId>,
    pub result: TrainingResult,
    pub diagnostics: Vec<TargetDiagnostic>,
    /// baseline max accuracy - this run's max accuracy, clamped at 0
    pub importance: f64,
}

impl AblationEntry {
    /// Inputs with at least one failing target, each once, sorted.
    pub fn failed_inputs(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.is_failure())
            .map(|d| d.input.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Baseline plus one entry per removed constraint.
#[derive(Debug, Clone)]
pub struct AblationReport {
    pub constraints: Vec<ConstraintId>,
    pub baseline: TrainingResult,
    pub baseline_diagnostics: Vec<TargetDiagnostic>,
    /// Ordered by constraint id
    pub entries: Vec<AblationEntry>,
}

impl AblationReport {
    /// Entries sorted by importance, most load-bearing first.
    pub fn by_importance(&self) -> Vec<&AblationEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.removed.cmp(&b.removed))
        });
        sorted
    }
}

/// Train once with all constraints, then once without each constraint.
pub fn ablation_study(
    grammar: &Grammar,
    dataset: &Dataset,
    constraints: &[ConstraintId],
    options: &TrainingOptions,
    sweep: &SweepOptions,
) -> Result<AblationReport> {
    options.validate()?;
    if constraints.len() < 2 {
        return Err(HgError::malformed(
            "constraints",
            "ablation needs at least two active constraints",
        ));
    }

    let baseline = run(grammar, dataset, constraints, &sweep.options_for(options, 0))?;
    let baseline_diagnostics = diagnose(grammar, dataset, constraints, &baseline)?;
    info!(
        max_accuracy = baseline.max_accuracy,
        constraints = constraints.len(),
        "ablation baseline trained"
    );

    let mut removed: Vec<ConstraintId> = constraints.to_vec();
    removed.sort_unstable();

    let ablate = |(k, id): (usize, &ConstraintId)| -> Result<AblationEntry> {
        let reduced = grammar.without_constraint(*id)?;
        let kept = reduced.constraints().to_vec();
        let result = run(&reduced, dataset, &kept, &sweep.options_for(options, k + 1))?;
        let diagnostics = diagnose(&reduced, dataset, &kept, &result)?;
        info!(
            removed = id,
            max_accuracy = result.max_accuracy,
            "ablation run finished"
        );
        Ok(AblationEntry {
            removed: *id,
            importance: (baseline.max_accuracy - result.max_accuracy).max(0.0),
            constraints: kept,
            result,
            diagnostics,
        })
    };

    let entries = if sweep.parallel {
        removed
            .par_iter()
            .enumerate()
            .map(ablate)
            .collect::<Result<Vec<_>>>()?
    } else {
        removed
            .iter()
            .enumerate()
            .map(ablate)
            .collect::<Result<Vec<_>>>()?
    };

    Ok(AblationReport {
        constraints: constraints.to_vec(),
        baseline,
        baseline_diagnostics,
        entries,
    })
}
