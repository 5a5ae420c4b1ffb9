//! Writes pages and copies asset trees into the output directory.
//!
//! Everything is create-if-missing and overwrite-in-place. Files left over
//! from earlier builds are not removed.

use crate::types::RenderedPage;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot walk {0}")]
    Walk(#[from] walkdir::Error),
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> WriteError + '_ {
    move |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Output directory handle.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `page` at its output path, creating parent directories.
    pub fn write_page(&self, page: &RenderedPage) -> Result<PathBuf, WriteError> {
        let path = self.root.join(&page.output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_at(parent))?;
        }
        fs::write(&path, &page.html).map_err(io_at(&path))?;
        Ok(path)
    }

    /// Recursively copy `src` to `<root>/<dest_rel>`.
    ///
    /// Hidden entries and the `skip` subtree are left out. A missing `src`
    /// copies nothing. Returns the written file paths, in walk order.
    pub fn copy_tree(
        &self,
        src: &Path,
        dest_rel: &Path,
        skip: Option<&Path>,
    ) -> Result<Vec<PathBuf>, WriteError> {
        if !src.is_dir() {
            return Ok(Vec::new());
        }
        let dest = self.root.join(dest_rel);
        let mut copied = Vec::new();

        let walker = WalkDir::new(src)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
                let skipped = skip.is_some_and(|s| e.path() == s);
                !hidden && !skipped
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
            let target = dest.join(rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(io_at(parent))?;
            }
            fs::copy(entry.path(), &target).map_err(io_at(&target))?;
            copied.push(target);
        }
        Ok(copied)
    }
}
