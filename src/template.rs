//! Textual `{{ name }}` substitution.
//!
//! This is deliberately not a template language: the only construct is a
//! direct variable lookup. Whitespace inside the braces is ignored, names
//! may contain ASCII letters, digits, `_`, `.` and `-`, and anything else
//! between `{{` and `}}` is an error.
//!
//! Substitution is single-pass: values are inserted verbatim (no HTML
//! escaping) and never rescanned, so a value containing `{{` is harmless.
//!
//! ## Scope
//!
//! A [`Scope`] is built from layers, later layers overriding earlier ones.
//! The renderer uses: site metadata, then built-ins (`title`, `url`, ...),
//! then page front matter.

use crate::types::Metadata;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("{page}: unresolved variable '{key}' in {origin}")]
    Unresolved {
        page: String,
        origin: String,
        key: String,
    },
    #[error(
        "{page}: unsupported expression '{expr}' in {origin} (only plain variable names are allowed)"
    )]
    Unsupported {
        page: String,
        origin: String,
        expr: String,
    },
    #[error("{page}: unterminated '{{{{' in {origin}")]
    Unterminated { page: String, origin: String },
    #[error("cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TemplateError {
    /// The page the error was raised for, if it is page-specific.
    pub fn page(&self) -> Option<&str> {
        match self {
            TemplateError::Unresolved { page, .. }
            | TemplateError::Unsupported { page, .. }
            | TemplateError::Unterminated { page, .. } => Some(page),
            TemplateError::Read { .. } => None,
        }
    }
}

/// Where a piece of text being substituted comes from, for error messages.
#[derive(Debug, Clone, Copy)]
pub struct Origin<'a> {
    /// The page being rendered, e.g. `posts/hello.md`.
    pub page: &'a str,
    /// Which text: `"page body"`, `"template base.html"`, ...
    pub source: &'a str,
}

/// Variable bindings for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: BTreeMap<String, String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every entry of `metadata`, overriding existing keys.
    pub fn extend_from(&mut self, metadata: &Metadata) {
        for (key, value) in metadata {
            self.vars.insert(key.clone(), value.as_str().to_string());
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// A copy of this scope with one extra binding.
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Scope {
        let mut scope = self.clone();
        scope.insert(key, value);
        scope
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}

fn is_variable_name(expr: &str) -> bool {
    !expr.is_empty()
        && expr
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Replace every `{{ name }}` in `text` with its value from `scope`.
pub fn substitute(text: &str, scope: &Scope, origin: Origin<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| TemplateError::Unterminated {
            page: origin.page.to_string(),
            origin: origin.source.to_string(),
        })?;

        let expr = after[..end].trim();
        if !is_variable_name(expr) {
            return Err(TemplateError::Unsupported {
                page: origin.page.to_string(),
                origin: origin.source.to_string(),
                expr: expr.to_string(),
            });
        }
        let value = scope.get(expr).ok_or_else(|| TemplateError::Unresolved {
            page: origin.page.to_string(),
            origin: origin.source.to_string(),
            key: expr.to_string(),
        })?;
        out.push_str(value);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
