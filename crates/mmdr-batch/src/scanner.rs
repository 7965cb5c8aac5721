//! Diagram-source discovery.
//!
//! Lists a single directory (no recursion) and keeps regular files whose name
//! ends with [`SOURCE_EXTENSION`]. Entries are returned in directory-listing
//! order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::BatchError;

/// File name suffix of diagram-source files.
pub const SOURCE_EXTENSION: &str = ".mmd";

/// A diagram-source file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Absolute path of the containing directory.
    pub dir: PathBuf,
    /// File name, e.g. `flow.mmd`.
    pub name: String,
}

impl InputFile {
    /// File name with [`SOURCE_EXTENSION`] removed.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.name
            .strip_suffix(SOURCE_EXTENSION)
            .unwrap_or(&self.name)
    }
}

/// List the diagram-source files in `dir`.
///
/// Matching is case-sensitive and looks at the file name only. Directories are
/// skipped even if their name matches; symlinks are followed. Names that are
/// not valid UTF-8 are skipped with a warning.
///
/// # Errors
///
/// Returns [`BatchError::ReadDir`] if the directory or any of its entries
/// cannot be read.
pub fn enumerate(dir: &Path) -> Result<Vec<InputFile>, BatchError> {
    let read_err = |source| BatchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let dir = std::path::absolute(dir).map_err(read_err)?;
    let entries = fs::read_dir(&dir).map_err(read_err)?;

    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(read_err)?;
        let file_name = entry.file_name();

        let Some(name) = file_name.to_str() else {
            tracing::warn!(name = ?file_name, "skipping file with non UTF-8 name");
            continue;
        };
        if !name.ends_with(SOURCE_EXTENSION) {
            continue;
        }

        let path = entry.path();
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }

        inputs.push(InputFile {
            name: name.to_owned(),
            dir: dir.clone(),
            path,
        });
    }

    tracing::debug!(dir = %dir.display(), count = inputs.len(), "enumerated diagram sources");
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn names(inputs: &[InputFile]) -> Vec<String> {
        let mut names: Vec<String> = inputs.iter().map(|i| i.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_enumerate_filters_by_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.mmd"), "graph TD; A-->B").unwrap();
        fs::write(tmp.path().join("b.mmd"), "graph TD; B-->C").unwrap();
        fs::write(tmp.path().join("notes.txt"), "not a diagram").unwrap();
        fs::write(tmp.path().join("a.png"), "old output").unwrap();

        let inputs = enumerate(tmp.path()).unwrap();

        assert_eq!(names(&inputs), vec!["a.mmd", "b.mmd"]);
    }

    #[test]
    fn test_enumerate_is_case_sensitive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("upper.MMD"), "").unwrap();
        fs::write(tmp.path().join("mixed.Mmd"), "").unwrap();

        assert!(enumerate(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_enumerate_skips_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("nested.mmd")).unwrap();
        fs::write(tmp.path().join("nested.mmd/inner.mmd"), "").unwrap();

        assert!(enumerate(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_enumerate_fills_paths() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("flow.mmd"), "").unwrap();

        let inputs = enumerate(tmp.path()).unwrap();
        let dir = std::path::absolute(tmp.path()).unwrap();

        assert_eq!(
            inputs,
            vec![InputFile {
                path: dir.join("flow.mmd"),
                dir,
                name: "flow.mmd".to_owned(),
            }]
        );
        assert!(inputs[0].path.is_absolute());
    }

    #[test]
    fn test_enumerate_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(enumerate(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_enumerate_missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");

        let err = enumerate(&missing).unwrap_err();

        assert!(matches!(err, BatchError::ReadDir { .. }), "got {err:?}");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_stem() {
        let input = InputFile {
            path: PathBuf::from("/f/sequence.v2.mmd"),
            dir: PathBuf::from("/f"),
            name: "sequence.v2.mmd".to_owned(),
        };
        assert_eq!(input.stem(), "sequence.v2");
    }
}
