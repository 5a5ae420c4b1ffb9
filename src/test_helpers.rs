//! Shared test utilities for the mdblog test suite.
//!
//! [`SiteFixture`] builds a throwaway site directory in a temp dir, with a
//! [`SiteConfig`] pointing into it:
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let site = SiteFixture::new()
//!     .page("posts/2024-01-05-hello.md", "# Hello\n")
//!     .plugin("example", Some("<meta>"), None, &[("example.css", "")])
//!     .jpeg("static/images/photo.jpg", 2000, 1500);
//! let report = pipeline::build(&site.config(), &RustBackend::new()).unwrap();
//! ```

use crate::config::SiteConfig;
use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Site fixtures
// =========================================================================

/// A site directory laid out like `mdblog` expects, under a temp dir.
pub struct SiteFixture {
    tmp: TempDir,
}

impl SiteFixture {
    /// An empty site with an existing (empty) `content/` directory.
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("content")).unwrap();
        Self { tmp }
    }

    /// Write any file relative to the site root.
    pub fn file(self, rel: &str, contents: &[u8]) -> Self {
        let path = self.tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    /// Write a Markdown file relative to `content/`.
    pub fn page(self, rel: &str, text: &str) -> Self {
        self.file(&format!("content/{rel}"), text.as_bytes())
    }

    /// Write a template into `templates/`.
    pub fn template(self, name: &str, text: &str) -> Self {
        self.file(&format!("templates/{name}"), text.as_bytes())
    }

    /// Create `plugins/<name>/` with optional fragments and static files.
    pub fn plugin(
        self,
        name: &str,
        head: Option<&str>,
        body: Option<&str>,
        assets: &[(&str, &str)],
    ) -> Self {
        let dir = self.tmp.path().join("plugins").join(name);
        fs::create_dir_all(&dir).unwrap();
        if let Some(head) = head {
            fs::write(dir.join("head.html"), head).unwrap();
        }
        if let Some(body) = body {
            fs::write(dir.join("body.html"), body).unwrap();
        }
        for (rel, text) in assets {
            let path = dir.join("static").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        self
    }

    /// Write a synthetic JPEG relative to the site root.
    pub fn jpeg(self, rel: &str, width: u32, height: u32) -> Self {
        let path = self.tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        write_test_jpeg(&path, width, height);
        self
    }

    /// Default config with every directory rooted in the fixture.
    pub fn config(&self) -> SiteConfig {
        let root = self.tmp.path();
        let mut config = SiteConfig::default();
        config.output_dir = root.join("site");
        config.content_dir = root.join("content");
        config.templates_dir = root.join("templates");
        config.plugins_dir = root.join("plugins");
        config.static_dir = root.join("static");
        config.images.source_dir = root.join("static/images");
        config
    }

    /// Path of a file in the build output.
    pub fn output(&self, rel: &str) -> PathBuf {
        self.tmp.path().join("site").join(rel)
    }
}

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a gradient JPEG of the given size.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = fs::File::create(path).unwrap();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 90);
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a half-transparent PNG of the given size.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        Rgba([255, 0, 0, if x % 2 == 0 { 255 } else { 0 }])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}
