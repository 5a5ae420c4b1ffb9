//! CLI output formatting for build and check results.
//!
//! # Information-First Display
//!
//! The primary display for every entity (page, image) is its semantic
//! identity, title or source name, with paths and sizes as indented context
//! lines. Diagnostics go through `tracing`; this module only formats results.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 About → about.html
//! 002 Hello → posts/hello.html
//! 003 Home → index.html
//!
//! Plugins
//!     example
//!     cookieconsent
//!
//! Images
//! 001 photo.jpg (2000x1500)
//!     mobile: photo-mobile.jpg 480x360
//!     desktop: photo-desktop.jpg 1200x900
//!
//! Failed images
//!     broken.jpg: cannot read image ...
//!
//! Built 3 pages, 1 image, 2 plugin assets, 4 static files → site
//! ```
//!
//! ## Check
//!
//! Same `Pages`, `Plugins` and failure sections, then a one-line verdict.
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::images::{ImageAsset, ImageError};
use crate::imaging::VariantAction;
use crate::naming::Variant;
use crate::pipeline::{BuildReport, CheckReport, PageSummary};
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn page_lines(pages: &[PageSummary]) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in pages.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            page.title,
            slash(&page.output_path)
        ));
    }
    lines
}

fn plugin_lines(plugins: &[String]) -> Vec<String> {
    if plugins.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Plugins".to_string()];
    lines.extend(plugins.iter().map(|p| format!("{}{}", indent(1), p)));
    lines
}

/// Image header plus one line per scaled variant.
///
/// ```text
/// 001 trips/beach.jpg (2400x1600)
///     mobile: trips/beach-mobile.jpg 480x320
///     desktop: trips/beach-desktop.jpg 1200x800 (copy)
/// ```
fn image_lines(index: usize, asset: &ImageAsset) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({}x{})",
        format_index(index),
        slash(&asset.rel_path),
        asset.dimensions.width,
        asset.dimensions.height
    )];
    for planned in asset.variants.iter().filter(|v| v.variant != Variant::Original) {
        let copy = match planned.action {
            VariantAction::Copy => " (copy)",
            VariantAction::Resize => "",
        };
        lines.push(format!(
            "{}{}: {} {}x{}{}",
            indent(1),
            planned.variant.label(),
            slash(&planned.rel_output),
            planned.width,
            planned.height,
            copy
        ));
    }
    lines
}

fn failure_lines(failures: &[ImageError]) -> Vec<String> {
    if failures.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Failed images".to_string()];
    lines.extend(failures.iter().map(|e| format!("{}{}", indent(1), e)));
    lines
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = page_lines(&report.pages);
    lines.extend(plugin_lines(&report.plugins));

    if !report.images.is_empty() {
        lines.push(String::new());
        lines.push("Images".to_string());
        for (i, asset) in report.images.iter().enumerate() {
            lines.extend(image_lines(i + 1, asset));
        }
    }
    lines.extend(failure_lines(&report.image_failures));

    lines.push(String::new());
    let mut summary = format!(
        "Built {}, {}, {}, {}",
        plural(report.pages.len(), "page"),
        plural(report.images.len(), "image"),
        plural(report.plugin_assets.len(), "plugin asset"),
        plural(report.static_assets.len(), "static file"),
    );
    if !report.image_failures.is_empty() {
        summary.push_str(&format!(" ({} failed)", report.image_failures.len()));
    }
    summary.push_str(&format!(" → {}", report.output_dir.display()));
    lines.push(summary);
    lines
}

pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = page_lines(&report.pages);
    lines.extend(plugin_lines(&report.plugins));
    lines.extend(failure_lines(&report.image_failures));
    lines.push(String::new());
    lines.push(format!(
        "{} and {} are valid",
        plural(report.pages.len(), "page"),
        plural(report.images.len(), "image")
    ));
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{BackendError, Breakpoints, Dimensions, plan_variants};
    use crate::types::PageKind;
    use std::path::PathBuf;

    fn summary(title: &str, out: &str) -> PageSummary {
        PageSummary {
            title: title.to_string(),
            output_path: PathBuf::from(out),
            kind: Some(PageKind::Page),
        }
    }

    fn asset(rel: &str, dims: (u32, u32)) -> ImageAsset {
        ImageAsset {
            source_path: PathBuf::from("/static/images").join(rel),
            rel_path: PathBuf::from(rel),
            dimensions: Dimensions {
                width: dims.0,
                height: dims.1,
            },
            variants: plan_variants(Path::new(rel), dims, Breakpoints {
                mobile: 480,
                desktop: 1200,
            }),
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page"), "1 page");
        assert_eq!(plural(0, "page"), "0 pages");
        assert_eq!(plural(3, "static file"), "3 static files");
    }

    #[test]
    fn image_lines_show_variants() {
        let lines = image_lines(1, &asset("trips/beach.jpg", (2400, 1600)));
        assert_eq!(
            lines,
            vec![
                "001 trips/beach.jpg (2400x1600)",
                "    mobile: trips/beach-mobile.jpg 480x320",
                "    desktop: trips/beach-desktop.jpg 1200x800",
            ]
        );
    }

    #[test]
    fn image_lines_mark_copies() {
        let lines = image_lines(2, &asset("icon.png", (64, 64)));
        assert_eq!(lines[1], "    mobile: icon-mobile.png 64x64 (copy)");
    }

    #[test]
    fn build_report_full() {
        let report = BuildReport {
            output_dir: PathBuf::from("site"),
            pages: vec![summary("About", "about.html"), summary("Home", "index.html")],
            plugins: vec!["example".into()],
            plugin_assets: vec![PathBuf::from("site/plugins/example/example.css")],
            static_assets: Vec::new(),
            images: vec![asset("photo.jpg", (2000, 1500))],
            image_failures: vec![ImageError::Unreadable {
                path: PathBuf::from("static/images/broken.jpg"),
                source: BackendError::ProcessingFailed("bad header".into()),
            }],
        };

        let lines = format_build_report(&report);
        assert_eq!(lines[0], "Pages");
        assert_eq!(lines[1], "001 About → about.html");
        assert_eq!(lines[2], "002 Home → index.html");
        assert!(lines.contains(&"Plugins".to_string()));
        assert!(lines.contains(&"    example".to_string()));
        assert!(lines.contains(&"001 photo.jpg (2000x1500)".to_string()));
        assert!(lines.iter().any(|l| l.contains("broken.jpg") && l.contains("bad header")));
        assert_eq!(
            lines.last().unwrap(),
            "Built 2 pages, 1 image, 1 plugin asset, 0 static files (1 failed) → site"
        );
    }

    #[test]
    fn build_report_omits_empty_sections() {
        let report = BuildReport {
            output_dir: PathBuf::from("out"),
            pages: vec![summary("Home", "index.html")],
            ..Default::default()
        };
        let lines = format_build_report(&report);
        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 Home → index.html",
                "",
                "Built 1 page, 0 images, 0 plugin assets, 0 static files → out",
            ]
        );
    }

    #[test]
    fn check_report_verdict() {
        let report = CheckReport {
            pages: vec![summary("A", "a.html"), summary("Home", "index.html")],
            plugins: Vec::new(),
            images: vec![asset("a.jpg", (100, 100))],
            image_failures: Vec::new(),
        };
        let lines = format_check_report(&report);
        assert_eq!(lines.last().unwrap(), "2 pages and 1 image are valid");
    }

    #[test]
    fn nested_output_paths_use_forward_slashes() {
        let lines = page_lines(&[summary("Hello", "posts/hello.html")]);
        assert_eq!(lines[1], "001 Hello → posts/hello.html");
    }
}
