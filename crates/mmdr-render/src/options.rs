//! Render options shared by every backend.
//!
//! The values are fixed for a batch run; [`RenderOptions::default`] is the only
//! configuration the CLI ever passes.

use serde::Serialize;

/// Default background color.
pub const DEFAULT_BACKGROUND: &str = "white";

/// Default output width in CSS pixels.
pub const DEFAULT_WIDTH: u32 = 1920;

/// Default output height in CSS pixels.
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Default device scale factor (2 = supersampled output).
pub const DEFAULT_SCALE: u32 = 2;

/// Puppeteer headless mode (the modern headless implementation).
pub const HEADLESS_MODE: &str = "new";

/// Chromium flags passed to the headless browser. The sandbox is disabled so
/// rendering works inside containers.
pub const BROWSER_ARGS: [&str; 2] = ["--no-sandbox", "--disable-setuid-sandbox"];

/// Layout settings for one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// CSS background color, e.g. `white` or `transparent`.
    pub background: String,
    /// Page width in pixels.
    pub width: u32,
    /// Page height in pixels.
    pub height: u32,
    /// Device scale factor.
    pub scale: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND.to_owned(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scale: DEFAULT_SCALE,
        }
    }
}

#[derive(Serialize)]
struct PuppeteerConfig {
    headless: &'static str,
    args: [&'static str; 2],
}

/// Puppeteer launch configuration for the headless browser.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn puppeteer_json() -> serde_json::Result<String> {
    serde_json::to_string(&PuppeteerConfig {
        headless: HEADLESS_MODE,
        args: BROWSER_ARGS,
    })
}
