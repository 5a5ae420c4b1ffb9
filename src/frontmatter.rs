//! Front matter extraction.
//!
//! A Markdown file may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! name: World
//! ---
//! # Hi {{ name }}
//! ```
//!
//! The block must be a flat mapping of scalars. A file without an opening
//! fence, or with an opening fence that is never closed, has no front
//! matter: the whole text is the body.

use crate::types::Metadata;

/// Split `text` into `(front_matter_yaml, body)`.
///
/// Returns `None` when the file has no front matter block.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "---" || trimmed == "..." {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse the text of a Markdown file into `(metadata, body)`.
pub fn parse(text: &str) -> Result<(Metadata, &str), serde_yaml::Error> {
    match split(text) {
        Some((yaml, body)) if yaml.trim().is_empty() => Ok((Metadata::new(), body)),
        Some((yaml, body)) => Ok((serde_yaml::from_str(yaml)?, body)),
        None => Ok((Metadata::new(), text)),
    }
}
