//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | full decode via `image::ImageReader` |
//! | **Resize** | Lanczos3 via `image::DynamicImage::resize_exact` |
//! | **Encode** | format of the source extension (JPEG at configured quality) |
//! | **Copy** | `std::fs::copy` for renditions that need no scaling |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Variant planning and execution

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{BreakpointSize, fit_to_width};
pub use operations::{Breakpoints, PlannedVariant, VariantAction, execute_variant, plan_variants};
pub use params::{Quality, ResizeParams};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};
