//! Responsive image pipeline.
//!
//! Every supported file under `images.source_dir` yields three renditions in
//! `<output_dir>/images/`, mirroring the source tree:
//!
//! ```text
//! static/images/trips/beach.jpg  (2400x1600)
//!   → site/images/trips/beach.jpg          2400x1600  copied
//!   → site/images/trips/beach-mobile.jpg    480x320   resized
//!   → site/images/trips/beach-desktop.jpg  1200x800   resized
//! ```
//!
//! Work is split in two phases. [`plan`] decodes every source and records
//! its dimensions, so the renderer only adds `srcset` attributes for images
//! that can actually be produced. [`process`] then writes the files in
//! parallel. A broken image never fails the build: it is recorded as an
//! [`ImageError`] and skipped, and renditions already written for it are
//! removed again.

use crate::config::SiteConfig;
use crate::imaging::{
    BackendError, Breakpoints, Dimensions, ImageBackend, PlannedVariant, Quality, execute_variant,
    is_supported_image, plan_variants,
};
use crate::naming::{Variant, is_variant_stem};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Directory under the output root that receives all renditions.
pub const IMAGES_OUTPUT_DIR: &str = "images";

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("cannot read image {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: BackendError,
    },
    #[error("cannot write {variant} variant of {path}: {source}")]
    Processing {
        path: PathBuf,
        variant: &'static str,
        source: BackendError,
    },
    #[error("cannot walk image directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ImageError {
    /// Source file the failure refers to, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageError::Unreadable { path, .. } | ImageError::Processing { path, .. } => {
                Some(path)
            }
            ImageError::Walk(e) => e.path(),
        }
    }
}

/// A source image and its planned renditions.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub source_path: PathBuf,
    /// Path relative to the images source directory.
    pub rel_path: PathBuf,
    pub dimensions: Dimensions,
    /// Original, mobile and desktop, in that order.
    pub variants: Vec<PlannedVariant>,
}

impl ImageAsset {
    pub fn variant(&self, variant: Variant) -> Option<&PlannedVariant> {
        self.variants.iter().find(|v| v.variant == variant)
    }

    /// Site URL of a rendition, e.g. `/blog/images/trips/beach-mobile.jpg`.
    pub fn url(&self, planned: &PlannedVariant, base_url: &str) -> String {
        format!("{base_url}{IMAGES_OUTPUT_DIR}/{}", slash_path(&planned.rel_output))
    }

    /// Lookup key: the source-relative path with forward slashes.
    pub fn key(&self) -> String {
        slash_path(&self.rel_path)
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Outcome of the identify phase.
#[derive(Debug, Default)]
pub struct ImagePlan {
    pub assets: Vec<ImageAsset>,
    /// Images that could not be identified; they get no renditions.
    pub failures: Vec<ImageError>,
}

/// Outcome of the write phase.
#[derive(Debug, Default)]
pub struct ImageReport {
    /// Images whose three renditions were all written.
    pub processed: Vec<ImageAsset>,
    pub failures: Vec<ImageError>,
}

/// Collect candidate source files, sorted for stable output.
fn source_files(source_dir: &Path) -> (Vec<PathBuf>, Vec<ImageError>) {
    let mut files = Vec::new();
    let mut failures = Vec::new();

    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures.push(ImageError::Walk(e));
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_supported_image(path) {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if is_variant_stem(&stem) {
            debug!(path = %path.display(), "skipping generated variant");
            continue;
        }
        files.push(path.to_path_buf());
    }
    (files, failures)
}

/// Find source images, decode them and read their dimensions.
///
/// A missing source directory is not an error: the site simply has no images.
pub fn plan(backend: &impl ImageBackend, config: &SiteConfig) -> ImagePlan {
    let source_dir = &config.images.source_dir;
    if !source_dir.is_dir() {
        debug!(dir = %source_dir.display(), "no image source directory");
        return ImagePlan::default();
    }

    let breakpoints = Breakpoints {
        mobile: config.images.mobile_width,
        desktop: config.images.desktop_width,
    };
    let (files, mut failures) = source_files(source_dir);

    let identified: Vec<Result<ImageAsset, ImageError>> = files
        .par_iter()
        .map(|path| {
            let dimensions = backend
                .identify(path)
                .map_err(|source| ImageError::Unreadable {
                    path: path.clone(),
                    source,
                })?;
            let rel_path = path.strip_prefix(source_dir).unwrap_or(path).to_path_buf();
            let variants = plan_variants(
                &rel_path,
                (dimensions.width, dimensions.height),
                breakpoints,
            );
            Ok(ImageAsset {
                source_path: path.clone(),
                rel_path,
                dimensions,
                variants,
            })
        })
        .collect();

    let mut assets = Vec::new();
    for result in identified {
        match result {
            Ok(asset) => assets.push(asset),
            Err(e) => {
                warn!("skipping image: {e}");
                failures.push(e);
            }
        }
    }
    info!(images = assets.len(), failed = failures.len(), "planned images");
    ImagePlan { assets, failures }
}

/// Write every planned rendition under `<output_dir>/images/`.
///
/// Images are independent: one that fails is reported and the rest carry on.
pub fn process(
    backend: &impl ImageBackend,
    assets: &[ImageAsset],
    output_dir: &Path,
    quality: Quality,
) -> ImageReport {
    let images_root = output_dir.join(IMAGES_OUTPUT_DIR);

    let results: Vec<Result<ImageAsset, ImageError>> = assets
        .par_iter()
        .map(|asset| {
            let mut written = Vec::with_capacity(asset.variants.len());
            for planned in &asset.variants {
                match execute_variant(backend, &asset.source_path, &images_root, planned, quality)
                {
                    Ok(path) => {
                        debug!(
                            output = %path.display(),
                            width = planned.width,
                            height = planned.height,
                            "wrote image variant"
                        );
                        written.push(path);
                    }
                    Err(source) => {
                        written.push(images_root.join(&planned.rel_output));
                        discard(&written);
                        return Err(ImageError::Processing {
                            path: asset.source_path.clone(),
                            variant: planned.variant.label(),
                            source,
                        });
                    }
                }
            }
            Ok(asset.clone())
        })
        .collect();

    let mut report = ImageReport::default();
    for result in results {
        match result {
            Ok(asset) => report.processed.push(asset),
            Err(e) => {
                warn!("image failed: {e}");
                report.failures.push(e);
            }
        }
    }
    report
}

/// Remove the renditions of an image that failed part way through.
fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), "cannot remove partial rendition: {e}");
        }
    }
}

/// Planned images keyed for `<img src>` lookups.
#[derive(Debug, Default)]
pub struct ResponsiveIndex {
    assets: BTreeMap<String, ImageAsset>,
}

impl ResponsiveIndex {
    pub fn new(assets: &[ImageAsset]) -> Self {
        Self {
            assets: assets.iter().map(|a| (a.key(), a.clone())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Resolve an `<img src>` value to a planned image.
    ///
    /// Accepts site URLs (`/blog/images/a.jpg` with base URL `/blog/`),
    /// root-relative (`/images/a.jpg`) and relative (`images/a.jpg`) forms.
    /// External URLs never match.
    pub fn lookup(&self, src: &str, base_url: &str) -> Option<&ImageAsset> {
        if src.contains("://") || src.starts_with("//") {
            return None;
        }
        let path = src.split(['?', '#']).next().unwrap_or(src);
        let path = path.strip_prefix(base_url).unwrap_or(path);
        let path = path.trim_start_matches('/');
        let key = path
            .strip_prefix(IMAGES_OUTPUT_DIR)
            .and_then(|rest| rest.strip_prefix('/'))?;
        self.assets.get(key)
    }
}
