//! Site configuration module.
//!
//! Handles loading and validating the site configuration file. The format is
//! picked from the extension: `.yml`/`.yaml` files are YAML, `.toml` files
//! are TOML. Both describe the same structure.
//!
//! ## Configuration Options
//!
//! ```yaml
//! # Paths are relative to the directory holding this file.
//! output_dir: site              # Where the generated site goes
//! content_dir: content          # Markdown sources
//! templates_dir: templates      # base.html, page.html, post.html, index.html
//! plugins_dir: plugins          # One directory per plugin
//! static_dir: static            # Copied verbatim to the output root
//! base_url: /                   # Prefix for generated URLs
//!
//! plugins:                      # Enabled plugins, in injection order
//!   - example
//!
//! images:
//!   source_dir: static/images   # Optional, missing directory = no-op
//!   mobile_width: 480           # Max width of the -mobile variant
//!   desktop_width: 1200         # Max width of the -desktop variant
//!   quality: 90                 # JPEG quality (1-100)
//!
//! processing:
//!   max_processes: 4            # Worker threads (default: all cores)
//!
//! # Any other top-level key is site metadata, available to templates
//! # as {{ key }}.
//! site_title: My Blog
//! author: Jo
//! ```
//!
//! ## Base URL Override
//!
//! The configured `base_url` can be replaced at build time. Precedence is
//! `--base-url` flag, then the `MDBLOG_BASE_URL` environment variable, then
//! the file value. See [`resolve_base_url`].

use crate::types::Metadata;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides `base_url`.
pub const BASE_URL_ENV: &str = "MDBLOG_BASE_URL";

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML parse error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("unsupported config format: {0} (expected .yml, .yaml or .toml)")]
    UnsupportedFormat(PathBuf),
    #[error("invalid plugin name {0:?}: only letters, digits, '-' and '_' are allowed")]
    UnsafePluginName(String),
    #[error("plugin {0:?} is enabled more than once")]
    DuplicatePlugin(String),
    #[error("plugin {name:?} is enabled but {dir} does not exist")]
    UnknownPlugin { name: String, dir: PathBuf },
    #[error("cannot read plugin {name:?}: {source}")]
    PluginIo {
        name: String,
        source: std::io::Error,
    },
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Site configuration, immutable once loaded.
///
/// Every field has a default; a config file only needs the values it wants
/// to change. Unknown top-level keys become [`site`](Self::site) metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub output_dir: PathBuf,
    pub content_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub plugins_dir: PathBuf,
    pub static_dir: PathBuf,
    /// URL prefix, always normalized to end with `/`.
    pub base_url: String,
    /// Enabled plugin names, in injection order.
    pub plugins: Vec<String>,
    pub images: ImagesConfig,
    pub processing: ProcessingConfig,
    /// Free-form site metadata exposed to templates.
    #[serde(flatten)]
    pub site: Metadata,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("site"),
            content_dir: PathBuf::from("content"),
            templates_dir: PathBuf::from("templates"),
            plugins_dir: PathBuf::from("plugins"),
            static_dir: PathBuf::from("static"),
            base_url: "/".to_string(),
            plugins: Vec::new(),
            images: ImagesConfig::default(),
            processing: ProcessingConfig::default(),
            site: Metadata::new(),
        }
    }
}

impl SiteConfig {
    /// Validate names and ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for name in &self.plugins {
            if !is_safe_plugin_name(name) {
                return Err(ConfigError::UnsafePluginName(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicatePlugin(name.clone()));
            }
        }
        if self.images.mobile_width == 0 || self.images.desktop_width == 0 {
            return Err(ConfigError::Validation(
                "images.mobile_width and images.desktop_width must be non-zero".into(),
            ));
        }
        if self.images.mobile_width >= self.images.desktop_width {
            return Err(ConfigError::Validation(
                "images.mobile_width must be smaller than images.desktop_width".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }

    /// Resolve every relative path against `root` (the config file's directory).
    fn rebase(&mut self, root: &Path) {
        for dir in [
            &mut self.output_dir,
            &mut self.content_dir,
            &mut self.templates_dir,
            &mut self.plugins_dir,
            &mut self.static_dir,
            &mut self.images.source_dir,
        ] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
    }

    /// Return a copy with `base_url` replaced (and normalized).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }
}

/// Responsive image settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Source images directory. A missing directory disables the pipeline.
    pub source_dir: PathBuf,
    /// Maximum width of the `-mobile` variant.
    pub mobile_width: u32,
    /// Maximum width of the `-desktop` variant.
    pub desktop_width: u32,
    /// Encoding quality for lossy formats (1-100).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("static/images"),
            mobile_width: 480,
            desktop_width: 1200,
            quality: 90,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads for pages and images.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never less than one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Plugin names become path segments, so only a conservative charset is allowed.
pub fn is_safe_plugin_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Ensure the base URL ends with exactly one `/`, so `{{ base_url }}page.html` works.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    format!("{trimmed}/")
}

/// Pick the effective base URL: flag, then environment, then file value.
///
/// Empty strings count as unset.
pub fn resolve_base_url(flag: Option<&str>, env: Option<&str>, file: &str) -> String {
    let chosen = [flag, env]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .unwrap_or(file);
    normalize_base_url(chosen)
}

/// Parse config text in the format implied by `path`'s extension.
pub fn parse_config(path: &Path, text: &str) -> Result<SiteConfig, ConfigError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let config: SiteConfig = match ext.as_str() {
        "yml" | "yaml" => {
            // An empty YAML document deserializes to unit, not a mapping.
            if text.trim().is_empty() {
                SiteConfig::default()
            } else {
                serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
        }
        "toml" => toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };
    Ok(config)
}

/// Load, validate and rebase the config file at `path`.
///
/// Unlike most settings, the file itself is mandatory: a missing config is
/// an error, not an empty site.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse_config(path, &text)?;
    config.validate()?;
    config.base_url = normalize_base_url(&config.base_url);
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    config.rebase(root);
    Ok(config)
}

/// Documented stock config, printed by `mdblog gen-config`.
pub fn stock_config_yaml() -> &'static str {
    r#"# mdblog site configuration.
# All paths are relative to this file.

# Where the generated site is written. Existing files are overwritten,
# files from removed pages are left in place.
output_dir: site

# Markdown sources. Files under posts/ are blog posts (listed on the index),
# files under pages/ are rendered at the site root.
content_dir: content

# Page templates. Missing files fall back to built-in defaults;
# run `mdblog gen-templates` to write those out for editing.
templates_dir: templates

# Plugin directories: <plugins_dir>/<name>/{head.html,body.html,static/}
plugins_dir: plugins

# Copied as-is to the output root (the images source dir is skipped).
static_dir: static

# Prefix for generated links. Overridden by MDBLOG_BASE_URL or --base-url.
base_url: /

# Enabled plugins, in injection order.
plugins: []

images:
  # Source images. If the directory does not exist, no images are processed.
  source_dir: static/images
  # Maximum widths of the responsive variants (<stem>-mobile.<ext>,
  # <stem>-desktop.<ext>). Images are never upscaled.
  mobile_width: 480
  desktop_width: 1200
  # Lossy encoding quality, 1-100.
  quality: 90

# Worker threads. Defaults to the number of CPU cores.
processing: {}
#   max_processes: 4

# Every other key is site metadata, available in templates as {{ key }}.
site_title: My Blog
lang: en
"#
}
