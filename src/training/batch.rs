//! One training run per participant over a shared grammar.

use rayon::prelude::*;
use tracing::info;

use crate::config::TrainingOptions;
use crate::error::Result;
use crate::types::{ConstraintId, Dataset, Grammar, TrainingResult};

use super::ablation::SweepOptions;
use super::diagnostics::{TargetDiagnostic, diagnose};
use super::gla::run;

/// A participant's response data, labelled by its participant code.
#[derive(Debug, Clone)]
pub struct Participant {
    pub code: String,
    pub dataset: Dataset,
}

impl Participant {
    pub fn new(code: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            code: code.into(),
            dataset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticipantRun {
    pub code: String,
    pub result: TrainingResult,
    pub diagnostics: Vec<TargetDiagnostic>,
}

/// Train every participant independently. Output keeps input order.
pub fn run_participants(
    grammar: &Grammar,
    participants: &[Participant],
    constraints: &[ConstraintId],
    options: &TrainingOptions,
    sweep: &SweepOptions,
) -> Result<Vec<ParticipantRun>> {
    options.validate()?;

    let train = |(k, p): (usize, &Participant)| -> Result<ParticipantRun> {
        let result = run(grammar, &p.dataset, constraints, &sweep.options_for(options, k))?;
        let diagnostics = diagnose(grammar, &p.dataset, constraints, &result)?;
        info!(
            participant = %p.code,
            max_accuracy = result.max_accuracy,
            total_samples = result.total_samples,
            "participant trained"
        );
        Ok(ParticipantRun {
            code: p.code.clone(),
            result,
            diagnostics,
        })
    };

    if sweep.parallel {
        participants.par_iter().enumerate().map(train).collect()
    } else {
        participants.iter().enumerate().map(train).collect()
    }
}
