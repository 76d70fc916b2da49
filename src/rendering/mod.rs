//! Output rendering - from training results to text reports.
//!
//! - Run summary with an accuracy sparkline
//! - Per-target diagnostic table and failure list
//! - Ablation and participant sweep tables

mod report;

pub use report::{
    DIAGNOSTIC_HEADER, accuracy_sparkline, format_ablation, format_diagnostics, format_failures,
    format_participants, format_summary,
};
