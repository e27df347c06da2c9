//! Site configuration module.
//!
//! Handles loading, validating, and merging `atelier.toml`. Stock defaults are
//! the base layer; the user file is merged on top key by key, so a config file
//! only needs the values it changes. Two environment variables are applied
//! last:
//!
//! - `PREVIEW_SECRET` replaces `preview.secret`
//! - `ATELIER_MODE` replaces `mode`
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! mode = "production"           # "development" shows error detail to visitors
//! site_title = "Artist Studio"
//!
//! [content]
//! root = "src/content"          # blog/ and portfolio/ live under here
//! blog_dir = "blog"
//! portfolio_dir = "portfolio"
//! extension = "mdx"
//!
//! [server]
//! interface = "127.0.0.1"
//! port = 3000
//!
//! [preview]
//! # secret = "change-me"        # unset = preview cannot be enabled
//! cookie_name = "__atelier_preview"
//! max_age_secs = 3600
//!
//! [log]
//! enabled = true
//! level = "info"                # error | warn | info | debug
//! show_stack = false
//! show_timestamp = true
//!
//! [build]
//! output = "dist"
//! public_dir = "public"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "atelier.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Whether the site runs for its author or for the public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    pub fn is_development(self) -> bool {
        self == Mode::Development
    }
}

/// Site configuration loaded from `atelier.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Development mode exposes error details in responses.
    pub mode: Mode,
    /// Shown in the header and page titles.
    pub site_title: String,
    pub content: ContentConfig,
    pub server: ServerConfig,
    pub preview: PreviewConfig,
    pub log: LogConfig,
    pub build: BuildConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            site_title: "Artist Studio".to_string(),
            content: ContentConfig::default(),
            server: ServerConfig::default(),
            preview: PreviewConfig::default(),
            log: LogConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be non-zero".into()));
        }
        if self.server.interface.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.interface is not an IP address: {}",
                self.server.interface
            )));
        }
        let ext = &self.content.extension;
        if ext.is_empty() || ext.contains('.') {
            return Err(ConfigError::Validation(
                "content.extension must be non-empty and without a leading dot".into(),
            ));
        }
        if self.content.blog_dir.is_empty() || self.content.portfolio_dir.is_empty() {
            return Err(ConfigError::Validation(
                "content.blog_dir and content.portfolio_dir must not be empty".into(),
            ));
        }
        if self.preview.cookie_name.is_empty()
            || !self
                .preview
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Validation(
                "preview.cookie_name must be non-empty and use only [A-Za-z0-9_-]".into(),
            ));
        }
        if self.preview.max_age_secs == 0 {
            return Err(ConfigError::Validation(
                "preview.max_age_secs must be greater than zero".into(),
            ));
        }
        if self.preview.secret.as_deref() == Some("") {
            return Err(ConfigError::Validation(
                "preview.secret must not be empty; omit it to disable preview".into(),
            ));
        }
        Ok(())
    }

    /// Directory holding blog posts.
    pub fn blog_dir(&self) -> PathBuf {
        self.content.root.join(&self.content.blog_dir)
    }

    /// Directory holding portfolio pieces.
    pub fn portfolio_dir(&self) -> PathBuf {
        self.content.root.join(&self.content.portfolio_dir)
    }
}

/// Where content lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Parent directory of the blog and portfolio directories.
    pub root: PathBuf,
    pub blog_dir: String,
    pub portfolio_dir: String,
    /// Content file extension, without the dot.
    pub extension: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("src/content"),
            blog_dir: "blog".to_string(),
            portfolio_dir: "portfolio".to_string(),
            extension: "mdx".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub interface: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            interface: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Draft preview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Shared secret a preview link must carry. `None` disables preview.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    pub cookie_name: String,
    /// Lifetime of a preview session.
    pub max_age_secs: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            secret: None,
            cookie_name: "__atelier_preview".to_string(),
            max_age_secs: 3600,
        }
    }
}

/// Log verbosity, most severe first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Logging settings, fixed for the life of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub enabled: bool,
    pub level: LogLevel,
    /// Attach the error source chain to error events.
    pub show_stack: bool,
    pub show_timestamp: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Info,
            show_stack: false,
            show_timestamp: true,
        }
    }
}

/// Static export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub output: PathBuf,
    /// Files served verbatim (images, favicon). Copied into the export.
    pub public_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("dist"),
            public_dir: PathBuf::from("public"),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Environment overrides applied after the file layer.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub preview_secret: Option<String>,
    pub mode: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            preview_secret: std::env::var("PREVIEW_SECRET").ok().filter(|s| !s.is_empty()),
            mode: std::env::var("ATELIER_MODE").ok().filter(|s| !s.is_empty()),
        }
    }

    fn apply(&self, config: &mut SiteConfig) -> Result<(), ConfigError> {
        if let Some(secret) = &self.preview_secret {
            config.preview.secret = Some(secret.clone());
        }
        if let Some(mode) = &self.mode {
            config.mode = match mode.to_ascii_lowercase().as_str() {
                "development" | "dev" => Mode::Development,
                "production" | "prod" => Mode::Production,
                other => {
                    return Err(ConfigError::Validation(format!(
                        "ATELIER_MODE must be development or production, got {other}"
                    )));
                }
            };
        }
        Ok(())
    }
}

/// Merge an optional overlay onto the stock defaults, apply environment
/// overrides, then deserialize and validate.
pub fn resolve_config(
    overlay: Option<toml::Value>,
    env: &EnvOverrides,
) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: SiteConfig = merged.try_into()?;
    env.apply(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(path)?, &EnvOverrides::from_env())
}

/// Returns a fully-commented stock `atelier.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Atelier Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# "development" includes error messages and source chains in error
# responses. Can be overridden with ATELIER_MODE.
mode = "production"

# Shown in the header and in page titles.
site_title = "Artist Studio"

# ---------------------------------------------------------------------------
# Content
# ---------------------------------------------------------------------------
[content]
# Parent directory of the blog and portfolio directories.
root = "src/content"
blog_dir = "blog"
portfolio_dir = "portfolio"
# File extension of content files, without the dot.
extension = "mdx"

# ---------------------------------------------------------------------------
# HTTP server (atelier serve)
# ---------------------------------------------------------------------------
[server]
interface = "127.0.0.1"
port = 3000

# ---------------------------------------------------------------------------
# Draft preview
# ---------------------------------------------------------------------------
[preview]
# Shared secret required by /api/preview. Leave unset to disable preview.
# PREVIEW_SECRET in the environment takes precedence.
# secret = "change-me"
cookie_name = "__atelier_preview"
# How long a preview session lasts.
max_age_secs = 3600

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[log]
enabled = true
# error | warn | info | debug. RUST_LOG takes precedence when set.
level = "info"
# Attach the chain of underlying errors to error log lines.
show_stack = false
show_timestamp = true

# ---------------------------------------------------------------------------
# Static export (atelier build)
# ---------------------------------------------------------------------------
[build]
output = "dist"
# Copied verbatim into the export and served as-is by atelier serve.
public_dir = "public"
"##
}
