//! Parsing the plain-text input files.
//!
//! - Eval files → [`Grammar`](crate::types::Grammar)
//! - Targets file → [`Dataset`](crate::types::Dataset)
//! - Constraints file → active constraint ids
//!
//! Every parser reports problems as `MalformedInput` tagged with
//! `file:line`, and none of them prompt or retry.

mod constraints;
mod grammar;
mod targets;

use std::path::{Path, PathBuf};

use crate::error::{HgError, Result};

pub use constraints::{load_active_constraints, parse_constraints};
pub use grammar::{CandidateRow, EvalTable, load_grammar, parse_eval_table};
pub use targets::{load_dataset, parse_targets};

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| HgError::io(path, e))
}

/// `name` → `name.txt`; paths that already end in `.txt` are unchanged.
fn with_txt_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == "txt" => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".txt");
            PathBuf::from(name)
        }
    }
}
