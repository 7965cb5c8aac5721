//! Mermaid rendering backends for mmdr.
//!
//! This crate hides the external rendering capability behind one narrow trait:
//! - [`Renderer`]: render one diagram-source file to one image file
//! - [`RenderOptions`]: layout settings passed to every call
//!
//! # Backends
//!
//! - [`MermaidCli`]: spawns mermaid-cli (`mmdc`), which drives a headless browser
//! - [`Kroki`]: posts the source to a Kroki server
//! - [`MockRenderer`]: records calls and writes stub images (behind `mock` feature)
//!
//! [`Backend`] wraps the real backends so callers can pick one at runtime.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use mmdr_render::{MermaidCli, RenderOptions, Renderer};
//!
//! let renderer = MermaidCli::new(&["mmdc".to_owned()]);
//! renderer
//!     .render(Path::new("flow.mmd"), Path::new("flow.png"), &RenderOptions::default())
//!     .await?;
//! ```

mod error;
mod kroki;
mod mermaid_cli;
#[cfg(feature = "mock")]
mod mock;
mod options;

use std::future::Future;
use std::path::Path;

pub use error::RenderError;
pub use kroki::{DEFAULT_TIMEOUT, Kroki};
pub use mermaid_cli::MermaidCli;
#[cfg(feature = "mock")]
pub use mock::{MOCK_PNG, MockRenderer, RenderCall};
pub use options::{
    BROWSER_ARGS, DEFAULT_BACKGROUND, DEFAULT_HEIGHT, DEFAULT_SCALE, DEFAULT_WIDTH,
    HEADLESS_MODE, RenderOptions, puppeteer_json,
};

/// Renders a single diagram-source file to an image file.
///
/// Implementations must leave `output` untouched when they fail, as far as the
/// underlying tool allows. The returned future must be `Send` so callers can
/// spawn it onto a runtime.
pub trait Renderer: Send + Sync + 'static {
    /// Render `input` to `output` using `options`.
    fn render(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> impl Future<Output = Result<(), RenderError>> + Send;
}

/// A renderer chosen at runtime.
#[derive(Debug, Clone)]
pub enum Backend {
    MermaidCli(MermaidCli),
    Kroki(Kroki),
}

impl Backend {
    /// Short name for log output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::MermaidCli(_) => "mermaid-cli",
            Self::Kroki(_) => "kroki",
        }
    }
}

impl Renderer for Backend {
    async fn render(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        match self {
            Self::MermaidCli(cli) => cli.render(input, output, options).await,
            Self::Kroki(kroki) => kroki.render(input, output, options).await,
        }
    }
}
