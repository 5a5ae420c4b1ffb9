//! Plugins: HTML fragments and static assets spliced into every page.
//!
//! A plugin is a directory under `plugins_dir`:
//!
//! ```text
//! plugins/cookieconsent/
//! ├── head.html        # inserted before </head>  (optional)
//! ├── body.html        # inserted before </body>  (optional)
//! └── static/          # copied to <output>/plugins/cookieconsent/ (optional)
//! ```
//!
//! Fragments see the same variables as the page they are injected into, so
//! `{{ base_url }}plugins/cookieconsent/cc.css` resolves per site. Plugins
//! are applied in the order they are enabled in the config; with `[a, b]`
//! the output reads `…a…b</body>`.

use crate::config::{ConfigError, SiteConfig};
use crate::template::{Origin, Scope, TemplateError, substitute};
use crate::writer::{OutputWriter, WriteError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const HEAD_FRAGMENT: &str = "head.html";
pub const BODY_FRAGMENT: &str = "body.html";
pub const STATIC_DIR: &str = "static";

/// Output directory for plugin assets.
pub const PLUGINS_OUTPUT_DIR: &str = "plugins";

/// A loaded plugin. Data only: fragments are raw template text.
#[derive(Debug, Clone, PartialEq)]
pub struct Plugin {
    pub name: String,
    pub head_fragment: Option<String>,
    pub body_fragment: Option<String>,
    pub static_dir: Option<PathBuf>,
}

fn read_fragment(name: &str, path: &Path) -> Result<Option<String>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| ConfigError::PluginIo {
            name: name.to_string(),
            source,
        })
}

/// Load every enabled plugin, in config order.
///
/// An enabled name without a directory under `plugins_dir` is a config error,
/// so typos fail the build before anything is written.
pub fn load_plugins(config: &SiteConfig) -> Result<Vec<Plugin>, ConfigError> {
    config
        .plugins
        .iter()
        .map(|name| {
            let dir = config.plugins_dir.join(name);
            if !dir.is_dir() {
                return Err(ConfigError::UnknownPlugin {
                    name: name.clone(),
                    dir,
                });
            }
            let static_dir = dir.join(STATIC_DIR);
            let plugin = Plugin {
                name: name.clone(),
                head_fragment: read_fragment(name, &dir.join(HEAD_FRAGMENT))?,
                body_fragment: read_fragment(name, &dir.join(BODY_FRAGMENT))?,
                static_dir: static_dir.is_dir().then_some(static_dir),
            };
            debug!(
                plugin = %plugin.name,
                head = plugin.head_fragment.is_some(),
                body = plugin.body_fragment.is_some(),
                assets = plugin.static_dir.is_some(),
                "loaded plugin"
            );
            Ok(plugin)
        })
        .collect()
}

/// Splices plugin fragments into rendered pages.
pub struct PluginInjector<'a> {
    plugins: &'a [Plugin],
}

impl<'a> PluginInjector<'a> {
    pub fn new(plugins: &'a [Plugin]) -> Self {
        Self { plugins }
    }

    /// Join the substituted fragments of every plugin, each on its own line.
    fn collect(
        &self,
        pick: impl Fn(&Plugin) -> Option<&String>,
        scope: &Scope,
        page_name: &str,
        file: &str,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        for plugin in self.plugins {
            let Some(fragment) = pick(plugin) else {
                continue;
            };
            let source = format!("plugin {}/{file}", plugin.name);
            let text = substitute(
                fragment,
                scope,
                Origin {
                    page: page_name,
                    source: &source,
                },
            )?;
            out.push_str(text.trim_end());
            out.push('\n');
        }
        Ok(out)
    }

    /// Insert head fragments before `</head>` and body fragments before `</body>`.
    ///
    /// The first `</head>` and the last `</body>` are used (case-insensitive),
    /// so markup inside the page content cannot capture fragments. A page
    /// without a closing tag gets the fragments appended.
    pub fn inject(&self, html: &str, scope: &Scope, page_name: &str) -> Result<String, TemplateError> {
        if self.plugins.is_empty() {
            return Ok(html.to_string());
        }
        let head = self.collect(|p| p.head_fragment.as_ref(), scope, page_name, HEAD_FRAGMENT)?;
        let body = self.collect(|p| p.body_fragment.as_ref(), scope, page_name, BODY_FRAGMENT)?;

        let html = insert_before(html, "</head>", &head, false);
        Ok(insert_before(&html, "</body>", &body, true))
    }

    /// Copy every plugin's `static/` tree to `plugins/<name>/`.
    pub fn copy_static(&self, writer: &OutputWriter) -> Result<Vec<PathBuf>, WriteError> {
        let mut copied = Vec::new();
        for plugin in self.plugins {
            if let Some(dir) = &plugin.static_dir {
                let dest = Path::new(PLUGINS_OUTPUT_DIR).join(&plugin.name);
                copied.extend(writer.copy_tree(dir, &dest, None)?);
            }
        }
        Ok(copied)
    }
}

/// Insert `fragment` before `marker`, or append it when the marker is absent.
fn insert_before(html: &str, marker: &str, fragment: &str, last: bool) -> String {
    if fragment.is_empty() {
        return html.to_string();
    }
    // ASCII lowercasing keeps byte offsets aligned with the original.
    let lower = html.to_ascii_lowercase();
    let found = if last {
        lower.rfind(marker)
    } else {
        lower.find(marker)
    };
    match found {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + fragment.len());
            out.push_str(&html[..at]);
            out.push_str(fragment);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{html}{fragment}"),
    }
}
