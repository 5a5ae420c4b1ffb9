//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader` full decode, so truncated pixel data fails here |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image::ImageReader` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` with configured quality |
//! | Encode PNG, GIF, TIFF, WebP | `DynamicImage::save_with_format` (lossless) |
//!
//! Variants keep the source format: `photo.png` produces `photo-mobile.png`.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions we can both decode and re-encode in the same format.
const FORMAT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    FORMAT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that have working codecs compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has a supported image extension (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| supported_input_extensions().contains(&ext.as_str()))
}

fn format_for(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    FORMAT_CANDIDATES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
}

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Save a DynamicImage to the given path, in the format of its extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = format_for(path).ok_or_else(|| {
        BackendError::ProcessingFailed(format!("Unsupported output format: {}", path.display()))
    })?;

    match format {
        ImageFormat::Jpeg => save_jpeg(img, path, quality),
        // GIF and WebP encoders take RGBA; the others accept the decoded layout.
        ImageFormat::Gif | ImageFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8())
            .save_with_format(path, format)
            .map_err(|e| encode_error(path, e)),
        _ => img
            .save_with_format(path, format)
            .map_err(|e| encode_error(path, e)),
    }
}

fn encode_error(path: &Path, e: image::ImageError) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
}

/// JPEG has no alpha channel, so flatten to RGB before encoding.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| encode_error(path, e))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        // A readable header is not enough: images that are only ever copied
        // must still be decodable before pages link to them.
        let img = load_image(path)?;
        Ok(Dimensions {
            width: img.width(),
            height: img.height(),
        })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::{write_test_jpeg, write_test_png};

    #[test]
    fn supported_extensions_cover_common_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "gif", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn is_supported_image_ignores_case() {
        assert!(is_supported_image(Path::new("a/Photo.JPG")));
        assert!(is_supported_image(Path::new("b.webp")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        write_test_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn identify_garbage_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn identify_truncated_png_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("cut.png");
        write_test_png(&path, 300, 200);
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(image::image_dimensions(&path).is_ok(), "header still readable");
        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn resize_jpeg_keeps_format_and_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 400, 300);

        let output = tmp.path().join("source-mobile.jpg");
        let backend = RustBackend::new();
        backend
            .resize(&ResizeParams {
                source,
                output: output.clone(),
                width: 200,
                height: 150,
                quality: Quality::new(85),
            })
            .unwrap();

        let dims = backend.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (200, 150));
        assert_eq!(
            image::ImageFormat::from_path(&output).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn resize_png_with_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("logo.png");
        write_test_png(&source, 64, 32);

        let output = tmp.path().join("logo-mobile.png");
        let backend = RustBackend::new();
        backend
            .resize(&ResizeParams {
                source,
                output: output.clone(),
                width: 32,
                height: 16,
                quality: Quality::default(),
            })
            .unwrap();

        let dims = backend.identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (32, 16));
    }

    #[test]
    fn resize_unsupported_output_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        write_test_jpeg(&source, 100, 100);

        let result = RustBackend::new().resize(&ResizeParams {
            source,
            output: tmp.path().join("output.bmp"),
            width: 50,
            height: 50,
            quality: Quality::default(),
        });
        assert!(result.is_err());
    }
}
