//! Plain-text reports for training runs and sweeps.
//!
//! Tables are tab-separated so they paste cleanly into a spreadsheet. No
//! colour codes are emitted here; the CLI decorates around them.

use std::fmt::Write as _;

use crate::training::{AblationReport, ParticipantRun, TargetDiagnostic};
use crate::types::{ConstraintId, TracePoint, TrainingResult};

/// Header of the per-target diagnostic table.
pub const DIAGNOSTIC_HEADER: &str = "Input\tTarget\tHarmony\tRank\tPool\tFailures";

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Accuracy over accepted updates, on a fixed 0..1 scale.
///
/// Longer traces are sampled down to `width`; shorter ones are padded.
pub fn accuracy_sparkline(trace: &[TracePoint], width: usize) -> String {
    let mut line = String::with_capacity(width * 3);
    for i in 0..width {
        let idx = if trace.len() <= width {
            (i < trace.len()).then_some(i)
        } else {
            Some(i * trace.len() / width)
        };
        match idx {
            Some(idx) => {
                let level = (trace[idx].accuracy.clamp(0.0, 1.0) * 7.0).round() as usize;
                line.push(SPARK[level.min(7)]);
            }
            None => line.push(' '),
        }
    }
    line
}

fn format_weights(constraints: &[ConstraintId], weights: &[f64]) -> String {
    constraints
        .iter()
        .zip(weights)
        .map(|(c, w)| format!("C{}={:.3}", c, w))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Headline numbers of one run.
pub fn format_summary(result: &TrainingResult, constraints: &[ConstraintId]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Max accuracy:     {:.4}", result.max_accuracy);
    let _ = writeln!(
        out,
        "Reached at:       iteration {} (sample {})",
        result.iteration_of_max, result.samples_to_max
    );
    let _ = writeln!(
        out,
        "Samples drawn:    {} ({} accepted updates)",
        result.total_samples, result.accepted_updates
    );
    let _ = writeln!(out, "Stopped by:       {}", result.stop_reason);
    let _ = writeln!(out, "Random seed:      {}", result.random_seed);
    let _ = writeln!(
        out,
        "Initial weights:  {}",
        format_weights(constraints, &result.initial_weights)
    );
    let _ = writeln!(
        out,
        "Best weights:     {}",
        format_weights(constraints, &result.weights_at_max)
    );
    if !result.trace.is_empty() {
        let _ = writeln!(out, "Accuracy:         {}", accuracy_sparkline(&result.trace, 40));
    }
    out
}

/// The per-target table: one tab-separated row per target.
pub fn format_diagnostics(diagnostics: &[TargetDiagnostic]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", DIAGNOSTIC_HEADER);
    for d in diagnostics {
        let failures: Vec<&str> = d.failures.iter().map(|c| c.as_str()).collect();
        let _ = writeln!(
            out,
            "{}\t{}\t{:.3}\t{}\t{}\t{}",
            d.input,
            d.target,
            d.harmony,
            d.rank,
            d.pool_size,
            failures.join("\t")
        );
    }
    out
}

/// Targets that did not rank strictly highest, or a success line.
pub fn format_failures(diagnostics: &[TargetDiagnostic]) -> String {
    let failed: Vec<&TargetDiagnostic> = diagnostics.iter().filter(|d| d.is_failure()).collect();
    if failed.is_empty() {
        return "All targets rank highest.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} targets did not rank highest:", failed.len());
    for d in failed {
        let above: Vec<&str> = d.failures.iter().map(|c| c.as_str()).collect();
        let _ = writeln!(
            out,
            "Input: {}\tTarget: {}\tRanked at or above the target:\t{}",
            d.input,
            d.target,
            above.join("\t")
        );
    }
    out
}

/// Ablation summary, one row per removed constraint in id order.
pub fn format_ablation(report: &AblationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Baseline (all {} constraints): max accuracy {:.4}, iteration {}, {} samples",
        report.constraints.len(),
        report.baseline.max_accuracy,
        report.baseline.iteration_of_max,
        report.baseline.total_samples
    );
    let _ = writeln!(
        out,
        "Constraint\tMax Accuracy\tImportance\tIterations\tTotal Samples\tFailed Inputs"
    );
    for entry in &report.entries {
        let _ = writeln!(
            out,
            "{}\t{:.4}\t{:.4}\t{}\t{}\t{}",
            entry.removed,
            entry.result.max_accuracy,
            entry.importance,
            entry.result.iteration_of_max,
            entry.result.total_samples,
            entry.failed_inputs().join(" ")
        );
    }
    out
}

/// One row per participant, in batch order.
pub fn format_participants(runs: &[ParticipantRun]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Participant\tMax Accuracy\tIteration for Max\tTotal Samples\tSeed"
    );
    for run in runs {
        let _ = writeln!(
            out,
            "{}\t{:.4}\t{}\t{}\t{}",
            run.code,
            run.result.max_accuracy,
            run.result.iteration_of_max,
            run.result.total_samples,
            run.result.random_seed
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CandidateId, StopReason};

    fn result() -> TrainingResult {
        TrainingResult {
            max_accuracy: 0.75,
            iteration_of_max: 4,
            weights_at_max: vec![2.5, 0.125],
            initial_weights: vec![1.0, 1.0],
            samples_to_max: 9,
            total_samples: 260,
            random_seed: 17,
            tie_epsilon: 1e-9,
            accepted_updates: 12,
            stop_reason: StopReason::Plateau,
            trace: vec![
                TracePoint {
                    iteration: 1,
                    sample: 2,
                    accuracy: 0.0,
                    best_accuracy: 0.0,
                },
                TracePoint {
                    iteration: 2,
                    sample: 9,
                    accuracy: 1.0,
                    best_accuracy: 1.0,
                },
            ],
        }
    }

    fn diagnostic(failures: &[&str]) -> TargetDiagnostic {
        TargetDiagnostic {
            input: "A".to_string(),
            target: CandidateId::from("2"),
            harmony: -1.5,
            rank: 1 + failures.len(),
            failures: failures.iter().map(|c| CandidateId::from(*c)).collect(),
            pool_size: 5,
        }
    }

    #[test]
    fn test_summary_lists_weights_by_constraint() {
        let text = format_summary(&result(), &[3, 7]);
        assert!(text.contains("Max accuracy:     0.7500"));
        assert!(text.contains("iteration 4 (sample 9)"));
        assert!(text.contains("Random seed:      17"));
        assert!(text.contains("C3=2.500  C7=0.125"));
        assert!(text.contains("plateau"));
    }

    #[test]
    fn test_diagnostic_rows() {
        let text = format_diagnostics(&[diagnostic(&["1", "4"])]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], DIAGNOSTIC_HEADER);
        assert_eq!(lines[1], "A\t2\t-1.500\t3\t5\t1\t4");
    }

    #[test]
    fn test_failure_list() {
        assert_eq!(format_failures(&[diagnostic(&[])]), "All targets rank highest.\n");
        let text = format_failures(&[diagnostic(&[]), diagnostic(&["3"])]);
        assert!(text.starts_with("1 targets did not rank highest"));
        assert!(text.contains("Target: 2"));
    }

    #[test]
    fn test_sparkline_scale_and_width() {
        let trace = result().trace;
        let line = accuracy_sparkline(&trace, 4);
        assert_eq!(line.chars().count(), 4);
        assert!(line.starts_with("▁█"));
        assert!(accuracy_sparkline(&[], 3).chars().all(|c| c == ' '));
    }
}
