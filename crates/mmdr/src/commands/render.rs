//! `mmdr render` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use mmdr_batch::{BatchEvent, BatchRenderer, Reporter};
use mmdr_config::{BackendKind, CliSettings, Config, RendererConfig};
use mmdr_render::{Backend, Kroki, MermaidCli};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to configuration file (default: auto-discover mmdr.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing .mmd files (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Directory to write .png files to (default: the source directory).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Render through a Kroki server instead of mermaid-cli.
    #[arg(long, conflicts_with = "mmdc")]
    kroki_url: Option<String>,

    /// mermaid-cli program to run (overrides config).
    #[arg(long)]
    mmdc: Option<String>,

    /// Enable verbose output (show renderer commands and timing logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// Per-file failures are printed but do not make the command fail.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the source directory cannot
    /// be listed, or output paths collide.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            kroki_url: self.kroki_url,
            mmdc: self.mmdc,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let backend = create_backend(&config.renderer)?;
        let figures = &config.figures_resolved;
        tracing::info!(
            backend = backend.name(),
            source_dir = %figures.source_dir.display(),
            output_dir = %figures.output_dir().display(),
            "starting batch"
        );

        let batch = BatchRenderer::new(backend);
        let reporter: Arc<dyn Reporter> = Arc::new(TerminalReporter::new());
        batch
            .run(&figures.source_dir, figures.output_dir(), reporter)
            .await?;

        Ok(())
    }
}

/// Build the renderer selected by the configuration.
fn create_backend(renderer: &RendererConfig) -> Result<Backend, CliError> {
    match renderer.backend {
        BackendKind::MermaidCli => Ok(Backend::MermaidCli(MermaidCli::new(&renderer.command))),
        BackendKind::Kroki => {
            let Some(url) = renderer.kroki_url.as_deref() else {
                return Err(CliError::Validation(
                    "kroki backend selected but no kroki_url configured".to_owned(),
                ));
            };
            Ok(Backend::Kroki(Kroki::new(url)))
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind {
    Info,
    Success,
    Error,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Terminal line for a batch event.
fn format_event(event: &BatchEvent) -> (LineKind, String) {
    match event {
        BatchEvent::Discovered { count } => (
            LineKind::Info,
            format!("Found {count} Mermaid files to render"),
        ),
        BatchEvent::Started { input, output } => (
            LineKind::Info,
            format!("Rendering: {} → {}", file_name(input), file_name(output)),
        ),
        BatchEvent::Succeeded { output, .. } => {
            (LineKind::Success, format!("✓ {}", file_name(output)))
        }
        BatchEvent::Failed { input, message } => (
            LineKind::Error,
            format!("✗ Failed: {} {message}", file_name(input)),
        ),
    }
}

/// Prints batch events as they arrive.
struct TerminalReporter {
    output: Output,
}

impl TerminalReporter {
    fn new() -> Self {
        Self {
            output: Output::new(),
        }
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, event: &BatchEvent) {
        let (kind, line) = format_event(event);
        match kind {
            LineKind::Info => self.output.info(&line),
            LineKind::Success => self.output.success(&line),
            LineKind::Error => self.output.error(&line),
        }
    }
}
