//! Weight learning for Harmonic Grammar.
//!
//! The Gradual Learning Algorithm nudges constraint weights one observation
//! at a time:
//! 1. Draw a record, proportional to its frequency
//! 2. Predict winners under the current weights
//! 3. On a mismatch, move weights by `rate * (v_competitor - v_target)`
//! 4. Re-score the whole dataset after every accepted update, keep the best
//!
//! ## Stop Conditions
//!
//! | Reason            | When                                                    |
//! |-------------------|---------------------------------------------------------|
//! | `PerfectFit`      | best accuracy reaches 1                                 |
//! | `Plateau`         | too many samples since the last improvement             |
//! | `IterationBudget` | `iterations` updates accepted                           |
//! | `Cancelled`       | a [`CancelToken`] fired                                 |
//!
//! ## Sweeps
//!
//! [`ablation_study`] retrains with each constraint removed and
//! [`run_participants`] trains one grammar against many datasets. Both can
//! fan out across the rayon pool.

pub mod ablation;
pub mod batch;
pub mod diagnostics;
pub mod evaluate;
pub mod gla;
pub mod sampler;
pub mod update;

pub use ablation::{AblationEntry, AblationReport, SweepOptions, ablation_study};
pub use batch::{Participant, ParticipantRun, run_participants};
pub use diagnostics::{DiagnosticReporter, TargetDiagnostic, diagnose};
pub use evaluate::{Evaluator, evaluate};
pub use gla::{CancelToken, TrainingLoop, run, run_with_cancel};
pub use sampler::SampleSelector;
pub use update::{Adjustment, FailurePair, UpdateOutcome, UpdateRule};
