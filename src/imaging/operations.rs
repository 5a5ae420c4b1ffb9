//! High-level image operations.
//!
//! These functions combine calculations with backend execution: plan the
//! three renditions of one source image, then carry each plan out with
//! either a plain file copy or a backend resize.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{BreakpointSize, fit_to_width};
use super::params::{Quality, ResizeParams};
use crate::naming::{Variant, variant_file_name};
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Maximum widths of the two scaled renditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoints {
    pub mobile: u32,
    pub desktop: u32,
}

impl Breakpoints {
    fn width_for(self, variant: Variant) -> Option<u32> {
        match variant {
            Variant::Original => None,
            Variant::Mobile => Some(self.mobile),
            Variant::Desktop => Some(self.desktop),
        }
    }
}

/// How a planned rendition is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantAction {
    /// Byte-for-byte copy of the source.
    Copy,
    /// Decode, scale and re-encode.
    Resize,
}

/// One rendition of a source image, decided but not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedVariant {
    pub variant: Variant,
    /// Path relative to the images output directory, e.g. `trips/photo-mobile.jpg`.
    pub rel_output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub action: VariantAction,
}

/// Plan the original, mobile and desktop renditions of one image.
///
/// `rel_source` is the image path relative to the images source directory;
/// the renditions keep its directory and extension. Breakpoints wider than
/// the source become copies, so every variant file always exists.
pub fn plan_variants(
    rel_source: &Path,
    original_dims: (u32, u32),
    breakpoints: Breakpoints,
) -> Vec<PlannedVariant> {
    let file_name = rel_source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let parent = rel_source.parent().unwrap_or(Path::new(""));

    Variant::ALL
        .iter()
        .map(|&variant| {
            let rel_output = parent.join(variant_file_name(&file_name, variant));
            let size = match breakpoints.width_for(variant) {
                Some(max_width) => fit_to_width(original_dims, max_width),
                None => BreakpointSize {
                    width: original_dims.0,
                    height: original_dims.1,
                    resized: false,
                },
            };
            PlannedVariant {
                variant,
                rel_output,
                width: size.width,
                height: size.height,
                action: if size.resized {
                    VariantAction::Resize
                } else {
                    VariantAction::Copy
                },
            }
        })
        .collect()
}

/// Produce one planned rendition under `output_root`.
///
/// Parent directories are created as needed and existing files are
/// overwritten.
pub fn execute_variant(
    backend: &impl ImageBackend,
    source: &Path,
    output_root: &Path,
    planned: &PlannedVariant,
    quality: Quality,
) -> Result<PathBuf> {
    let output = output_root.join(&planned.rel_output);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    match planned.action {
        VariantAction::Copy => {
            fs::copy(source, &output)?;
        }
        VariantAction::Resize => backend.resize(&ResizeParams {
            source: source.to_path_buf(),
            output: output.clone(),
            width: planned.width,
            height: planned.height,
            quality,
        })?,
    }
    Ok(output)
}
