//! Locating grammar and participant files on disk.
//!
//! Both lookups scan a single directory level (no recursion) and return
//! sorted results so that grammar construction and participant batches are
//! reproducible across platforms.
//!
//! | Kind        | Pattern      | Keyed by                                 |
//! |-------------|--------------|------------------------------------------|
//! | Eval files  | `Eval-*.txt` | input id, second-to-last `-` token       |
//! | Participant | `trg*.txt`   | three capital letters followed by `_`    |

use std::path::{Path, PathBuf};

use glob_match::glob_match;
use ignore::WalkBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{HgError, Result};

const EVAL_PATTERN: &str = "Eval-*.txt";
const PARTICIPANT_PATTERN: &str = "trg*.txt";

/// Participant code: exactly three capitals terminated by an underscore.
static PARTICIPANT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{3}_").expect("Invalid participant code regex"));

/// Output of earlier ablation runs ("noC3.txt", "NOxyz.txt", ...).
static ABLATION_OUTPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[nN][oO][a-zA-Z0-9]{1,6}\.").expect("Invalid ablation output regex")
});

/// One Eval file and the input id it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalFile {
    pub input: String,
    pub path: PathBuf,
}

/// One participant's targets file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantFile {
    pub code: String,
    pub path: PathBuf,
}

/// File names directly inside `directory` matching `pattern`, sorted.
fn list_matching(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(HgError::io(
            directory,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    // Data directories are not source trees: no ignore files, no hidden-skip.
    let walker = WalkBuilder::new(directory)
        .standard_filters(false)
        .max_depth(Some(1))
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if glob_match(pattern, name) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Input id of an Eval file name: `Eval-A-uc.txt` → `A`.
pub fn input_id_from_eval_name(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(".txt").unwrap_or(name);
    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    let id = parts[parts.len() - 2];
    (!id.is_empty()).then_some(id)
}

/// All `Eval-*.txt` files in `directory`, sorted by path.
pub fn find_eval_files(directory: &Path) -> Result<Vec<EvalFile>> {
    let mut found = Vec::new();
    for path in list_matching(directory, EVAL_PATTERN)? {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let input = input_id_from_eval_name(name).ok_or_else(|| {
            HgError::malformed(
                path.display().to_string(),
                "Eval file name has no input id (expected Eval-<input>-<suffix>.txt)",
            )
        })?;
        found.push(EvalFile {
            input: input.to_string(),
            path,
        });
    }
    debug!(count = found.len(), dir = %directory.display(), "found Eval files");
    Ok(found)
}

/// Participant code carried by a targets file name, if it is one.
pub fn participant_code(name: &str) -> Option<&str> {
    if ABLATION_OUTPUT.is_match(name) {
        return None;
    }
    PARTICIPANT_CODE
        .find(name)
        .map(|m| &name[m.start()..m.end() - 1])
}

/// All participant `trg*.txt` files in `directory`, sorted by code.
///
/// A later file with the same code replaces an earlier one.
pub fn find_participant_files(directory: &Path) -> Result<Vec<ParticipantFile>> {
    let mut by_code = std::collections::BTreeMap::new();
    for path in list_matching(directory, PARTICIPANT_PATTERN)? {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if let Some(code) = participant_code(name) {
            by_code.insert(code.to_string(), path);
        }
    }

    Ok(by_code
        .into_iter()
        .map(|(code, path)| ParticipantFile { code, path })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn test_input_id_from_eval_name() {
        assert_eq!(input_id_from_eval_name("Eval-A-uc.txt"), Some("A"));
        assert_eq!(input_id_from_eval_name("Eval-x-y-lc.txt"), Some("y"));
        assert_eq!(input_id_from_eval_name("Eval-A.txt"), None);
    }

    #[test]
    fn test_find_eval_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Eval-B-uc.txt");
        touch(dir.path(), "Eval-A-uc.txt");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "Eval-C-uc.csv");
        fs::create_dir(dir.path().join("Eval-D-uc.txt")).unwrap();

        let found = find_eval_files(dir.path()).unwrap();
        let inputs: Vec<&str> = found.iter().map(|f| f.input.as_str()).collect();
        assert_eq!(inputs, vec!["A", "B"]);
    }

    #[test]
    fn test_find_eval_files_does_not_recurse() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "Eval-A-uc.txt");
        assert!(find_eval_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(find_eval_files(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_participant_code() {
        assert_eq!(participant_code("trg_ABC_s1.txt"), Some("ABC"));
        assert_eq!(participant_code("trgXYZ_.txt"), Some("XYZ"));
        assert_eq!(participant_code("trg_ab_.txt"), None);
        assert_eq!(participant_code("trg_ABC_noC3.txt"), None);
    }

    #[test]
    fn test_find_participant_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "trg_XYZ_1.txt");
        touch(dir.path(), "trg_ABC_1.txt");
        touch(dir.path(), "trg_DEF_NOc12.txt");
        touch(dir.path(), "other_GHI_1.txt");

        let found = find_participant_files(dir.path()).unwrap();
        let codes: Vec<&str> = found.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["ABC", "XYZ"]);
        assert!(found[0].path.ends_with("trg_ABC_1.txt"));
    }
}
