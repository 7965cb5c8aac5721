//! Output path planning.
//!
//! Each input gets exactly one output path: its stem plus [`IMAGE_EXTENSION`],
//! inside the output directory. Planning fails if two inputs would land on the
//! same output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{BatchError, InputFile};

/// File name suffix of rendered images.
pub const IMAGE_EXTENSION: &str = ".png";

/// One unit of work: render `input` to `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTask {
    pub input: InputFile,
    pub output: PathBuf,
}

/// Output path for `input` inside `output_dir`.
///
/// Only the trailing source extension is replaced, so `a.mmd.mmd` becomes
/// `a.mmd.png`.
#[must_use]
pub fn output_path(input: &InputFile, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}{IMAGE_EXTENSION}", input.stem()))
}

/// Pair every input with its output path.
///
/// # Errors
///
/// Returns [`BatchError::OutputCollision`] for the first output path claimed
/// by two inputs.
pub fn plan(inputs: &[InputFile], output_dir: &Path) -> Result<Vec<RenderTask>, BatchError> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::with_capacity(inputs.len());
    let mut tasks = Vec::with_capacity(inputs.len());

    for input in inputs {
        let output = output_path(input, output_dir);
        if let Some(first) = claimed.insert(output.clone(), input.path.as_path()) {
            return Err(BatchError::OutputCollision {
                output,
                first: first.to_path_buf(),
                second: input.path.clone(),
            });
        }
        tasks.push(RenderTask {
            input: input.clone(),
            output,
        });
    }

    Ok(tasks)
}
