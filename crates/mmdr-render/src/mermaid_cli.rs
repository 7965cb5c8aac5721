//! mermaid-cli (`mmdc`) backend.
//!
//! Each render call spawns one `mmdc` process. The browser settings are passed
//! through a puppeteer config file that lives until the process exits.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::SystemTime;

use tokio::process::Command;

use crate::{RenderError, RenderOptions, Renderer, puppeteer_json};

/// Renders diagrams by running the mermaid-cli executable.
#[derive(Debug, Clone)]
pub struct MermaidCli {
    program: String,
    leading_args: Vec<String>,
}

impl MermaidCli {
    /// Create a backend from a program and its leading arguments.
    ///
    /// `command` is e.g. `["mmdc"]` or `["npx", "--yes", "@mermaid-js/mermaid-cli"]`.
    /// An empty command falls back to `mmdc`.
    #[must_use]
    pub fn new(command: &[String]) -> Self {
        match command.split_first() {
            Some((program, rest)) => Self {
                program: program.clone(),
                leading_args: rest.to_vec(),
            },
            None => Self {
                program: "mmdc".to_owned(),
                leading_args: Vec::new(),
            },
        }
    }

    /// Program that will be spawned.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one invocation, leading arguments included.
    fn args(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
        puppeteer_config: &Path,
    ) -> Vec<OsString> {
        let flags: [(&str, OsString); 7] = [
            ("-i", input.into()),
            ("-o", output.into()),
            ("-b", options.background.as_str().into()),
            ("-w", options.width.to_string().into()),
            ("-H", options.height.to_string().into()),
            ("-s", options.scale.to_string().into()),
            ("-p", puppeteer_config.into()),
        ];

        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        for (flag, value) in flags {
            args.push(flag.into());
            args.push(value);
        }
        args.push("-q".into());
        args
    }
}

/// Write the puppeteer config to a temporary file.
///
/// The file is removed when the returned handle is dropped.
fn write_puppeteer_config() -> Result<tempfile::NamedTempFile, RenderError> {
    let json = puppeteer_json().map_err(|e| RenderError::Io(e.into()))?;
    let mut file = tempfile::Builder::new()
        .prefix("mmdr-puppeteer-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Modification time of `path`, or `None` if it does not exist.
async fn modified_time(path: &Path) -> Option<SystemTime> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    metadata.modified().ok()
}

/// Whether mmdc produced `output`: it must exist and differ from what was
/// there before the process started.
fn output_written(before: Option<SystemTime>, after: Option<SystemTime>) -> bool {
    match (before, after) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(before), Some(after)) => after != before,
    }
}

/// Pick the most useful text from the process output.
fn failure_message(stderr: &[u8], stdout: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::from_utf8_lossy(stdout).trim().to_owned()
    } else {
        stderr.to_owned()
    }
}

impl Renderer for MermaidCli {
    async fn render(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        let puppeteer_config = write_puppeteer_config()?;
        let previous = modified_time(output).await;
        let args = self.args(input, output, options, puppeteer_config.path());

        tracing::debug!(program = %self.program, ?args, "spawning mermaid-cli");

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(RenderError::Exit {
                program: self.program.clone(),
                status: result.status,
                message: failure_message(&result.stderr, &result.stdout),
            });
        }

        if !output_written(previous, modified_time(output).await) {
            return Err(RenderError::MissingOutput(output.to_path_buf()));
        }

        Ok(())
    }
}
