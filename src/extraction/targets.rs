//! Targets files: the observed winners for each input.
//!
//! One record per non-blank line:
//!
//! ```text
//! <prefix>-<input> <target> [<target> ...]
//! ```
//!
//! A record's frequency is its number of targets.

use std::path::Path;

use tracing::debug;

use crate::error::{HgError, Result};
use crate::types::{CandidateId, Dataset, Datum};

use super::{read_file, with_txt_extension};

/// Parse the text of a targets file.
pub fn parse_targets(origin: &str, content: &str) -> Result<Dataset> {
    let mut data = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        let at = || format!("{}:{}", origin, idx + 1);

        let input = label
            .split('-')
            .nth(1)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                HgError::malformed(at(), format!("label '{}' has no input after '-'", label))
            })?;
        let targets: Vec<CandidateId> = fields.map(CandidateId::from).collect();
        if targets.is_empty() {
            return Err(HgError::malformed(at(), format!("no targets for {}", input)));
        }

        data.push(Datum::new(input, targets));
    }

    Ok(Dataset::new(data))
}

/// Load a targets file, appending `.txt` when the name has no extension.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let path = with_txt_extension(path);
    let content = read_file(&path)?;
    let dataset = parse_targets(&path.display().to_string(), &content)?;
    debug!(
        records = dataset.len(),
        targets = dataset.total_targets(),
        file = %path.display(),
        "targets loaded"
    );
    Ok(dataset)
}
