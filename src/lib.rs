//! hglearn - Gradual Learning Algorithm for Harmonic Grammar
//!
//! Learns constraint weights (signed, or clamped at zero) from observed
//! input/output data. Candidates are scored by harmony, the negated
//! weighted sum of their violations, and the learner nudges weights on
//! each mispredicted observation until the data fits or progress stalls.
//!
//! # Architecture
//!
//! ```text
//! Discovery → Extraction → Training loop ─────────────→ Rendering
//!     ↓           ↓        sample → update → evaluate       ↓
//!  Eval-*.txt  Grammar        ↓        ↓        ↓        summary
//!  trg*.txt    Dataset    frequency  ranking  accuracy   diagnostics
//!                         weighted   + ties              sweep tables
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use hglearn::{TrainingOptions, diagnose, load_active_constraints, load_dataset, load_grammar, run};
//!
//! # fn main() -> hglearn::Result<()> {
//! let constraints = load_active_constraints(Path::new("AllConst.txt"))?;
//! let grammar = load_grammar(Path::new("evals"), &constraints)?;
//! let data = load_dataset(Path::new("trg_ABC_1.txt"))?;
//!
//! let result = run(&grammar, &data, &constraints, &TrainingOptions::default())?;
//! let failures = diagnose(&grammar, &data, &constraints, &result)?;
//! println!("accuracy {} with {} diagnostics", result.max_accuracy, failures.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod extraction;
pub mod ranking;
pub mod rendering;
pub mod training;
pub mod types;

// Re-export core types
pub use types::{
    CandidateId, CandidateTable, ConstraintId, Dataset, Datum, Grammar, StopReason, TracePoint,
    TrainingResult, ViolationVector, WeightVector,
};

pub use config::{Config, PlateauPolicy, TrainingOptions, WeightInit};
pub use error::{HgError, Result};

// Re-export the learning API
pub use ranking::{CandidateRanker, harmony};
pub use training::{
    AblationReport, CancelToken, DiagnosticReporter, Evaluator, Participant, ParticipantRun,
    SampleSelector, SweepOptions, TargetDiagnostic, TrainingLoop, UpdateRule, ablation_study,
    diagnose, evaluate, run, run_participants, run_with_cancel,
};

// Re-export loaders
pub use discovery::{find_eval_files, find_participant_files};
pub use extraction::{load_active_constraints, load_dataset, load_grammar};
