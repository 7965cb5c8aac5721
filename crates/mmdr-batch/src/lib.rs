//! Mermaid file discovery and batch rendering for mmdr.
//!
//! A batch runs in three phases:
//! 1. [`enumerate`] lists `.mmd` files in the source directory
//! 2. [`plan`] pairs each file with its `.png` output and rejects collisions
//! 3. [`BatchRenderer::run`] renders every pair concurrently and joins them
//!
//! Progress is delivered to a [`Reporter`] as [`BatchEvent`]s. Rendering is
//! delegated to any [`mmdr_render::Renderer`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mmdr_batch::{BatchRenderer, NullReporter};
//! use mmdr_render::MermaidCli;
//!
//! let batch = BatchRenderer::new(MermaidCli::new(&["mmdc".to_owned()]));
//! let report = batch
//!     .run(Path::new("figures"), Path::new("figures"), Arc::new(NullReporter))
//!     .await?;
//! ```

mod driver;
mod error;
mod event;
mod plan;
mod scanner;

pub use driver::{BatchRenderer, BatchReport, FailedRender, RenderedFile};
pub use error::BatchError;
pub use event::{BatchEvent, NullReporter, RecordingReporter, Reporter};
pub use plan::{IMAGE_EXTENSION, RenderTask, output_path, plan};
pub use scanner::{InputFile, SOURCE_EXTENSION, enumerate};
