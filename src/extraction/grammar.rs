//! Eval-file parsing: candidate violation profiles per input.
//!
//! # File Layout
//!
//! ```text
//! <label> <label> <declared candidate count> ...   header
//! ...                                              three skipped lines
//! ...
//! ...
//! <code> <ignored> <candidate> v1 v2 v3 ...        one row per candidate
//! ```
//!
//! Violation columns are 1-based constraint ids; only the active ones are
//! kept, in the order the active list gives them.

use std::path::Path;

use tracing::{debug, warn};

use crate::discovery::{EvalFile, find_eval_files};
use crate::error::{HgError, Result};
use crate::types::{CandidateId, ConstraintId, Grammar, ViolationVector};

use super::read_file;

const HEADER_LINES: usize = 4;

/// One candidate row from an Eval file, projected onto the active columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub candidate: CandidateId,
    pub violations: ViolationVector,
}

/// Parsed Eval file contents.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalTable {
    /// Candidate count announced in the header
    pub declared: usize,
    pub rows: Vec<CandidateRow>,
}

/// Parse the text of one Eval file.
///
/// `origin` names the file in error messages.
pub fn parse_eval_table(origin: &str, content: &str, active: &[ConstraintId]) -> Result<EvalTable> {
    let mut lines = content.lines();

    let header = lines
        .next()
        .ok_or_else(|| HgError::malformed(origin, "empty file"))?;
    let declared = header
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| HgError::malformed(origin, "header has no candidate count"))?;
    let declared: usize = declared.parse().map_err(|_| {
        HgError::malformed(origin, format!("candidate count '{}' is not a count", declared))
    })?;

    let mut rows = Vec::with_capacity(declared);
    for (idx, line) in lines.enumerate().skip(HEADER_LINES - 1) {
        let line_no = idx + 2;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            return Err(HgError::malformed(
                format!("{}:{}", origin, line_no),
                "row has no candidate number",
            ));
        }

        let counts = &fields[3..];
        let mut violations = Vec::with_capacity(active.len());
        for &c in active {
            let column = (c as usize)
                .checked_sub(1)
                .and_then(|i| counts.get(i))
                .ok_or_else(|| {
                    HgError::malformed(
                        format!("{}:{}", origin, line_no),
                        format!("no violation column for constraint {}", c),
                    )
                })?;
            let value: f64 = column.parse().map_err(|_| {
                HgError::malformed(
                    format!("{}:{}", origin, line_no),
                    format!("violation count '{}' is not a number", column),
                )
            })?;
            if !value.is_finite() || value < 0.0 {
                return Err(HgError::malformed(
                    format!("{}:{}", origin, line_no),
                    format!("violation count {} is negative", value),
                ));
            }
            violations.push(value);
        }

        rows.push(CandidateRow {
            candidate: CandidateId::from(fields[2]),
            violations,
        });
    }

    Ok(EvalTable { declared, rows })
}

fn load_eval_file(grammar: &mut Grammar, file: &EvalFile, active: &[ConstraintId]) -> Result<()> {
    let content = read_file(&file.path)?;
    let origin = file.path.display().to_string();
    let table = parse_eval_table(&origin, &content, active)?;

    if table.rows.len() != table.declared {
        warn!(
            file = %origin,
            declared = table.declared,
            found = table.rows.len(),
            "candidate count differs from header"
        );
    }

    for row in table.rows {
        grammar.insert_candidate(file.input.as_str(), row.candidate, row.violations)?;
    }
    Ok(())
}

/// Build a grammar from every Eval file in `directory`.
pub fn load_grammar(directory: &Path, active: &[ConstraintId]) -> Result<Grammar> {
    if active.is_empty() {
        return Err(HgError::malformed("constraints", "no active constraints"));
    }

    let files = find_eval_files(directory)?;
    if files.is_empty() {
        return Err(HgError::malformed(
            directory.display().to_string(),
            "no Eval-*.txt files",
        ));
    }

    let mut grammar = Grammar::new(active.to_vec());
    for file in &files {
        if grammar.contains_input(&file.input) {
            return Err(HgError::malformed(
                file.path.display().to_string(),
                format!("input {} is described by more than one Eval file", file.input),
            ));
        }
        load_eval_file(&mut grammar, file, active)?;
    }

    debug!(
        inputs = grammar.len(),
        constraints = active.len(),
        "grammar loaded"
    );
    Ok(grammar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const EVAL_A: &str = "\
Eval A 3 candidates
c1 c2 c3 c4
---
---
X1 _ 1 0 2 0 1
X1 _ 2 1 0 0 0
X1 _ 10 0 0 3 1
";

    #[test]
    fn test_parse_selects_active_columns() {
        let table = parse_eval_table("Eval-A-uc.txt", EVAL_A, &[4, 2]).unwrap();
        assert_eq!(table.declared, 3);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].candidate.as_str(), "1");
        assert_eq!(table.rows[0].violations, vec![1.0, 2.0]);
        assert_eq!(table.rows[2].candidate.as_str(), "10");
        assert_eq!(table.rows[2].violations, vec![1.0, 0.0]);
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let err = parse_eval_table("f", EVAL_A, &[5]).unwrap_err();
        assert!(matches!(err, HgError::MalformedInput { .. }));
        assert!(err.to_string().contains("constraint 5"));
    }

    #[test]
    fn test_bad_counts_are_malformed() {
        let negative = EVAL_A.replace("X1 _ 2 1 0 0 0", "X1 _ 2 -1 0 0 0");
        assert!(parse_eval_table("f", &negative, &[1]).is_err());

        let text = EVAL_A.replace("X1 _ 2 1 0 0 0", "X1 _ 2 x 0 0 0");
        assert!(parse_eval_table("f", &text, &[1]).is_err());

        let header = EVAL_A.replace("Eval A 3", "Eval A three");
        assert!(parse_eval_table("f", &header, &[1]).is_err());

        assert!(parse_eval_table("f", "", &[1]).is_err());
    }

    #[test]
    fn test_load_grammar_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Eval-A-uc.txt"), EVAL_A).unwrap();
        fs::write(
            dir.path().join("Eval-B-uc.txt"),
            "Eval B 2\n-\n-\n-\nX2 _ 1 1 1 1 1\nX2 _ 2 0 0 0 0\n",
        )
        .unwrap();
        fs::write(dir.path().join("readme.txt"), "not an eval file").unwrap();

        let grammar = load_grammar(dir.path(), &[1, 3]).unwrap();
        assert_eq!(grammar.len(), 2);
        assert_eq!(grammar.constraints(), &[1, 3]);
        let b = grammar.candidates("B").unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(
            grammar.violations("A", &CandidateId::from("10")).unwrap(),
            &vec![0.0, 3.0]
        );
    }

    #[test]
    fn test_declared_count_mismatch_still_loads() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Eval-A-uc.txt"),
            EVAL_A.replace("Eval A 3", "Eval A 7"),
        )
        .unwrap();
        let grammar = load_grammar(dir.path(), &[1]).unwrap();
        assert_eq!(grammar.candidates("A").unwrap().len(), 3);
    }

    #[test]
    fn test_duplicate_candidate_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Eval-A-uc.txt"),
            format!("{}X1 _ 1 0 0 0 0\n", EVAL_A),
        )
        .unwrap();
        assert!(matches!(
            load_grammar(dir.path(), &[1]),
            Err(HgError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(load_grammar(dir.path(), &[1]).is_err());
    }
}
