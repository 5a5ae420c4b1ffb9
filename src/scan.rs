//! Content directory scanning.
//!
//! Stage 1 of the build pipeline. Walks the content root recursively and
//! yields one [`ContentPage`] per Markdown file.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                          # Content root
//! ├── pages/                        # Rendered at the site root
//! │   └── about.md                  # → about.html
//! ├── posts/                        # Blog posts, listed on the index
//! │   ├── 2024-01-05-hello.md       # → posts/hello.html, dated 2024-01-05
//! │   └── notes.md                  # → posts/notes.html, dated by front matter
//! ├── hello.md                      # → hello.html
//! └── guides/setup.md               # → guides/setup.html
//! ```
//!
//! Hidden files and directories (leading `.`) are skipped. Only `.md` files
//! are content; everything else is ignored here.
//!
//! ## Ordering
//!
//! Pages are yielded in filesystem order, which is platform dependent.
//! Callers that need a stable order sort the results themselves.
//!
//! ## Errors
//!
//! The scanner only fails when a directory or file cannot be read, or when
//! a front matter block is not a mapping of scalars. A file without front
//! matter is fine and gets empty metadata.

use crate::frontmatter;
use crate::naming::{self, parse_entry_name};
use crate::types::{ContentPage, PageKind};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("content directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid front matter in {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Name of the content subdirectory whose files are posts.
pub const POSTS_DIR: &str = "posts";

type EntryFilter = fn(&DirEntry) -> bool;

/// Lazy iterator over the Markdown files of a content tree.
pub struct ContentScanner {
    root: PathBuf,
    walker: walkdir::FilterEntry<walkdir::IntoIter, EntryFilter>,
}

impl Iterator for ContentScanner {
    type Item = Result<ContentPage, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(ScanError::Walk(e))),
            };
            if entry.file_type().is_file() && is_markdown(entry.path()) {
                return Some(read_page(&self.root, entry.path()));
            }
        }
    }
}

/// Start scanning `root`. Fails immediately if the root is not a directory.
pub fn scan(root: &Path) -> Result<ContentScanner, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(is_visible as EntryFilter);
    Ok(ContentScanner {
        root: root.to_path_buf(),
        walker,
    })
}

/// Scan everything up front, stopping at the first error.
pub fn scan_all(root: &Path) -> Result<Vec<ContentPage>, ScanError> {
    scan(root)?.collect()
}

fn is_visible(entry: &DirEntry) -> bool {
    // The root itself may well be a hidden temp directory.
    entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Read a single Markdown file into a [`ContentPage`].
pub fn read_page(root: &Path, path: &Path) -> Result<ContentPage, ScanError> {
    let text = fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (metadata, body) =
        frontmatter::parse(&text).map_err(|source| ScanError::FrontMatter {
            path: path.to_path_buf(),
            source,
        })?;

    let rel_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let kind = if rel_path
        .components()
        .next()
        .is_some_and(|c| c.as_os_str() == POSTS_DIR)
        && rel_path.components().count() > 1
    {
        PageKind::Post
    } else {
        PageKind::Page
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let parsed = parse_entry_name(&stem);

    let title = metadata
        .get("title")
        .map(|t| t.as_str().to_string())
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| parsed.display_title.clone());

    let date = metadata
        .get("date")
        .and_then(|d| naming::parse_date(d.as_str()))
        .or(parsed.date);

    Ok(ContentPage {
        source_path: path.to_path_buf(),
        rel_path,
        slug: parsed.slug,
        kind,
        title,
        date,
        metadata,
        body_markdown: body.to_string(),
    })
}

/// Text of the first level-one heading, if any. Code blocks are skipped.
fn first_heading(markdown: &str) -> Option<String> {
    let mut heading: Option<String> = None;
    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => heading = Some(String::new()),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                let text = heading.take().unwrap_or_default();
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = heading.as_mut() {
                    heading.push_str(&text);
                }
            }
            _ => {}
        }
    }
    None
}
