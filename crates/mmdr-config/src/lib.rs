//! Configuration management for mmdr.
//!
//! Parses `mmdr.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `renderer.command` entries and `renderer.kroki_url` support
//! `${VAR}` and `${VAR:-default}`.

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the directory scanned for `.mmd` files.
    pub source_dir: Option<PathBuf>,
    /// Override the directory rendered images are written to.
    pub output_dir: Option<PathBuf>,
    /// Render through Kroki at this URL.
    pub kroki_url: Option<String>,
    /// Render through mermaid-cli using this program.
    pub mmdc: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mmdr.toml";

/// Default source directory, relative to the config directory.
const DEFAULT_SOURCE_DIR: &str = "figures";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Figure directories (paths are relative strings from TOML).
    figures: FiguresConfigRaw,
    /// Renderer backend selection.
    pub renderer: RendererConfig,

    /// Resolved figure directories (set after loading).
    #[serde(skip)]
    pub figures_resolved: FiguresConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FiguresConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
}

/// Resolved figure directories with absolute paths.
#[derive(Debug, Default)]
pub struct FiguresConfig {
    /// Directory scanned for `.mmd` files.
    pub source_dir: PathBuf,
    /// Explicit output directory, if configured.
    pub output_dir: Option<PathBuf>,
}

impl FiguresConfig {
    /// Directory rendered images are written to.
    ///
    /// Falls back to the source directory so images land next to their sources.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.source_dir)
    }
}

/// Which rendering backend to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Local mermaid-cli (`mmdc`) driving a headless browser.
    #[default]
    MermaidCli,
    /// Remote Kroki service.
    Kroki,
}

/// Renderer configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Backend selection.
    pub backend: BackendKind,
    /// mermaid-cli program followed by any leading arguments.
    pub command: Vec<String>,
    /// Kroki server URL.
    pub kroki_url: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::MermaidCli,
            command: vec!["mmdc".to_owned()],
            kroki_url: None,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`renderer.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mmdr.toml` in current directory and parents,
    /// falling back to defaults relative to the current directory.
    ///
    /// CLI settings are applied after path resolution and the result is
    /// validated as a whole.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else {
            Self::load_discovered(&std::env::current_dir()?)?
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.figures_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.figures_resolved.output_dir = Some(output_dir.clone());
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.renderer.kroki_url = Some(kroki_url.clone());
            self.renderer.backend = BackendKind::Kroki;
        }
        if let Some(mmdc) = &settings.mmdc {
            self.renderer.command = vec![mmdc.clone()];
            self.renderer.backend = BackendKind::MermaidCli;
        }
    }

    /// Load the config file found from `start`, or defaults relative to `start`.
    fn load_discovered(start: &Path) -> Result<Self, ConfigError> {
        match Self::discover_config(start) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default_with_base(start)),
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            figures: FiguresConfigRaw::default(),
            renderer: RendererConfig::default(),
            figures_resolved: FiguresConfig {
                source_dir: base.join(DEFAULT_SOURCE_DIR),
                output_dir: None,
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let renderer = &self.renderer;

        let Some(program) = renderer.command.first() else {
            return Err(ConfigError::Validation(
                "renderer.command cannot be empty".to_owned(),
            ));
        };
        require_non_empty(program, "renderer.command")?;

        if let Some(kroki_url) = &renderer.kroki_url {
            require_non_empty(kroki_url, "renderer.kroki_url")?;
            require_http_url(kroki_url, "renderer.kroki_url")?;
        }

        if renderer.backend == BackendKind::Kroki && renderer.kroki_url.is_none() {
            return Err(ConfigError::Validation(
                "renderer.backend = \"kroki\" requires renderer.kroki_url to be set".to_owned(),
            ));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        for (i, arg) in self.renderer.command.iter_mut().enumerate() {
            *arg = expand::expand_env(arg, &format!("renderer.command[{i}]"))?;
        }
        if let Some(url) = &self.renderer.kroki_url {
            self.renderer.kroki_url = Some(expand::expand_env(url, "renderer.kroki_url")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let source_dir = self
            .figures
            .source_dir
            .as_deref()
            .unwrap_or(DEFAULT_SOURCE_DIR);
        self.figures_resolved = FiguresConfig {
            source_dir: config_dir.join(source_dir),
            output_dir: self.figures.output_dir.as_deref().map(|d| config_dir.join(d)),
        };
    }
}
