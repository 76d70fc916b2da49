//! Constraints files: which violation columns take part in learning.
//!
//! Rows are `<id> <flag>`; flag `1` marks the constraint active. Active ids
//! keep their order of appearance, which fixes the weight vector layout.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{HgError, Result};
use crate::types::ConstraintId;

use super::{read_file, with_txt_extension};

/// Parse the text of a constraints file.
pub fn parse_constraints(origin: &str, content: &str) -> Result<Vec<ConstraintId>> {
    let mut active = Vec::new();
    let mut seen = HashSet::new();

    for (idx, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let at = || format!("{}:{}", origin, idx + 1);

        let [id, flag, ..] = fields.as_slice() else {
            return Err(HgError::malformed(at(), "expected '<id> <flag>'"));
        };
        let id: ConstraintId = id
            .parse()
            .map_err(|_| HgError::malformed(at(), format!("constraint id '{}' is not a number", id)))?;
        if id == 0 {
            return Err(HgError::malformed(at(), "constraint ids start at 1"));
        }
        if !seen.insert(id) {
            return Err(HgError::malformed(at(), format!("constraint {} listed twice", id)));
        }

        if *flag == "1" {
            active.push(id);
        }
    }

    Ok(active)
}

/// Load the active constraint ids, appending `.txt` when the name has no extension.
pub fn load_active_constraints(path: &Path) -> Result<Vec<ConstraintId>> {
    let path = with_txt_extension(path);
    let content = read_file(&path)?;
    parse_constraints(&path.display().to_string(), &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_active_in_file_order() {
        let active = parse_constraints("c", "3 1\n1 0\n2 1\n\n7 1 comment\n").unwrap();
        assert_eq!(active, vec![3, 2, 7]);
    }

    #[test]
    fn test_rejects_bad_rows() {
        assert!(parse_constraints("c", "1\n").is_err());
        assert!(parse_constraints("c", "x 1\n").is_err());
        assert!(parse_constraints("c", "0 1\n").is_err());
        assert!(parse_constraints("c", "2 1\n2 0\n").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("AllConst.txt"), "1 1\n2 0\n3 1\n").unwrap();
        assert_eq!(
            load_active_constraints(&dir.path().join("AllConst")).unwrap(),
            vec![1, 3]
        );
    }
}
