//! Kroki backend.
//!
//! Sends the diagram source to `{server}/mermaid/png` and writes the response
//! body to the output path. Requests run on tokio's blocking pool because the
//! HTTP agent is synchronous.
//!
//! Kroki renders Mermaid with its own browser settings, so the layout fields
//! of [`RenderOptions`] are not forwarded.

use std::path::Path;
use std::time::Duration;

use ureq::Agent;

use crate::{RenderError, RenderOptions, Renderer};

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Renders diagrams through a Kroki server.
#[derive(Debug, Clone)]
pub struct Kroki {
    agent: Agent,
    server_url: String,
}

impl Kroki {
    /// Create a backend for `server_url` with the default timeout.
    #[must_use]
    pub fn new(server_url: &str) -> Self {
        Self::with_timeout(server_url, DEFAULT_TIMEOUT)
    }

    /// Create a backend with an explicit request timeout.
    #[must_use]
    pub fn with_timeout(server_url: &str, timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
            server_url: server_url.trim_end_matches('/').to_owned(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/mermaid/png", self.server_url)
    }
}

fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Extract width and height from PNG image data.
///
/// PNG format: 8-byte signature, then IHDR chunk with width/height at bytes 16-24.
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 || &data[0..8] != PNG_SIGNATURE {
        return None;
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}

/// POST the source and return the response body.
///
/// Client errors (4xx) mean Kroki could not parse the diagram.
fn send_diagram_request(agent: &Agent, url: &str, source: &str) -> Result<Vec<u8>, RenderError> {
    let response = agent
        .post(url)
        .header("Content-Type", "text/plain")
        .send(source.as_bytes())
        .map_err(|e| RenderError::Http(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        let message = format!("HTTP {status}: {}", error_body.trim());
        return Err(if status < 500 {
            RenderError::Diagram(message)
        } else {
            RenderError::Http(message)
        });
    }

    body.read_to_vec()
        .map_err(|e| RenderError::Http(e.to_string()))
}

impl Renderer for Kroki {
    async fn render(
        &self,
        input: &Path,
        output: &Path,
        _options: &RenderOptions,
    ) -> Result<(), RenderError> {
        let source = tokio::fs::read_to_string(input).await?;
        let agent = self.agent.clone();
        let url = self.endpoint();

        let data = tokio::task::spawn_blocking(move || send_diagram_request(&agent, &url, &source))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))??;

        let (width, height) = png_dimensions(&data).ok_or(RenderError::InvalidPng)?;
        tracing::debug!(output = %output.display(), width, height, "kroki rendered diagram");

        tokio::fs::write(output, &data).await?;
        Ok(())
    }
}
