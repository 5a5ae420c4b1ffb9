//! Shared types used across the pipeline stages.
//!
//! Scanning produces [`ContentPage`]s, rendering turns them into
//! [`RenderedPage`]s, and the writer flushes those to disk. Metadata maps are
//! shared by the site config and by page front matter.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A scalar metadata value (string, number or boolean), kept in string form.
///
/// Config files and front matter may write `year: 2024` or `draft: true`;
/// templates only ever see text, so the value is stringified on load.
/// Nested mappings and sequences are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MetaValue(String);

impl MetaValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for MetaValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = MetaValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, number, boolean or null")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<MetaValue, E> {
                Ok(MetaValue::new(value))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<MetaValue, E> {
                Ok(MetaValue(value))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<MetaValue, E> {
                Ok(MetaValue(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<MetaValue, E> {
                Ok(MetaValue(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<MetaValue, E> {
                Ok(MetaValue(value.to_string()))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<MetaValue, E> {
                Ok(MetaValue(value.to_string()))
            }

            // `summary:` with no value
            fn visit_unit<E: de::Error>(self) -> Result<MetaValue, E> {
                Ok(MetaValue(String::new()))
            }

            fn visit_none<E: de::Error>(self) -> Result<MetaValue, E> {
                Ok(MetaValue(String::new()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// String-keyed metadata, ordered so iteration (and output) is deterministic.
pub type Metadata = BTreeMap<String, MetaValue>;

/// Whether a source file is a standalone page or a dated blog post.
///
/// Posts live under `content/posts/` and are listed on the index page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Page,
    Post,
}

impl PageKind {
    /// Name of the kind-specific template (`page.html` / `post.html`).
    pub fn template_name(self) -> &'static str {
        match self {
            PageKind::Page => "page.html",
            PageKind::Post => "post.html",
        }
    }
}

/// A Markdown source file, as found by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentPage {
    /// Absolute (or config-relative) path of the `.md` file.
    pub source_path: PathBuf,
    /// Path relative to the content root, e.g. `posts/2024-01-05-hello.md`.
    pub rel_path: PathBuf,
    /// URL slug: filename stem with any date prefix stripped.
    pub slug: String,
    pub kind: PageKind,
    /// Front matter title, first `# ` heading, or slug with dashes → spaces.
    pub title: String,
    /// Publication date (posts only): front matter `date`, then filename prefix.
    pub date: Option<chrono::NaiveDate>,
    /// Front matter. Empty when the file has none.
    pub metadata: Metadata,
    pub body_markdown: String,
}

impl ContentPage {
    /// Output path relative to the output directory.
    ///
    /// Mirrors the content tree with an `.html` extension, except that the
    /// top-level `pages/` directory is flattened into the site root.
    pub fn output_rel_path(&self) -> PathBuf {
        let rel = self
            .rel_path
            .strip_prefix("pages")
            .unwrap_or(&self.rel_path);
        let parent = rel.parent().map(PathBuf::from).unwrap_or_default();
        parent.join(format!("{}.html", self.slug))
    }

    /// Site-relative URL with forward slashes, e.g. `posts/hello.html`.
    pub fn url_path(&self) -> String {
        self.output_rel_path()
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// A fully rendered HTML document, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Path relative to the output directory.
    pub output_path: PathBuf,
    pub html: String,
}
