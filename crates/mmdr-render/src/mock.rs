//! Mock renderer for testing.
//!
//! Provides [`MockRenderer`] for exercising batch logic without mermaid-cli or
//! a Kroki server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::{RenderError, RenderOptions, Renderer};

/// Bytes written for every successful mock render.
pub const MOCK_PNG: &[u8] = b"\x89PNG\r\n\x1a\nmock";

/// One recorded render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: RenderOptions,
}

/// Renderer that records calls and writes stub images.
///
/// Inputs are matched by file name. Use the builder methods to make specific
/// files fail or take longer.
///
/// # Example
///
/// ```ignore
/// use mmdr_render::MockRenderer;
///
/// let renderer = MockRenderer::new().with_failure("broken.mmd", "Parse error on line 2");
/// ```
#[derive(Debug, Default)]
pub struct MockRenderer {
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<RenderCall>>,
}

impl MockRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail renders of `file_name` with a [`RenderError::Diagram`] carrying `message`.
    #[must_use]
    pub fn with_failure(mut self, file_name: &str, message: &str) -> Self {
        self.failures
            .insert(file_name.to_owned(), message.to_owned());
        self
    }

    /// Sleep for `delay` before finishing renders of `file_name`.
    #[must_use]
    pub fn with_delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.to_owned(), delay);
        self
    }

    /// Calls recorded so far, in the order they started.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Renderer for MockRenderer {
    async fn render(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        self.calls.lock().unwrap().push(RenderCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            options: options.clone(),
        });

        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(delay) = self.delays.get(&name) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(message) = self.failures.get(&name) {
            return Err(RenderError::Diagram(message.clone()));
        }

        tokio::fs::write(output, MOCK_PNG).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_and_writes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let renderer = MockRenderer::new();
        let input = tmp.path().join("a.mmd");
        let output = tmp.path().join("a.png");

        renderer
            .render(&input, &output, &RenderOptions::default())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), MOCK_PNG);
        assert_eq!(
            renderer.calls(),
            vec![RenderCall {
                input,
                output,
                options: RenderOptions::default(),
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_failure_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let renderer = MockRenderer::new().with_failure("bad.mmd", "Parse error");
        let output = tmp.path().join("bad.png");

        let err = renderer
            .render(&tmp.path().join("bad.mmd"), &output, &RenderOptions::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Parse error"));
        assert!(!output.exists());
        assert_eq!(renderer.calls().len(), 1);
    }
}
