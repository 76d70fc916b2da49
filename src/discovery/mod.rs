//! Data file discovery.
//!
//! Uses the `ignore` crate's walker with standard filters off, one level
//! deep, and glob patterns for the file families.

mod files;

pub use files::{
    EvalFile, ParticipantFile, find_eval_files, find_participant_files, input_id_from_eval_name,
    participant_code,
};
