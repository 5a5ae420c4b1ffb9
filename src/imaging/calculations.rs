//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Represents a single breakpoint rendition to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointSize {
    /// Calculated output width.
    pub width: u32,
    /// Calculated output height.
    pub height: u32,
    /// `false` when the source already fits and is used unchanged.
    pub resized: bool,
}

/// Scale `original` down to at most `max_width` wide, preserving aspect ratio.
///
/// Never upscales: a source that is already `max_width` wide or narrower
/// keeps its dimensions and is marked `resized: false`. Height never drops
/// below one pixel.
///
/// # Examples
/// ```
/// # use mdblog::imaging::fit_to_width;
/// // 2000x1500 at a 480px breakpoint → 480x360
/// let size = fit_to_width((2000, 1500), 480);
/// assert_eq!((size.width, size.height), (480, 360));
/// assert!(size.resized);
///
/// // 300x200 already fits → unchanged
/// let size = fit_to_width((300, 200), 480);
/// assert_eq!((size.width, size.height), (300, 200));
/// assert!(!size.resized);
/// ```
pub fn fit_to_width(original: (u32, u32), max_width: u32) -> BreakpointSize {
    let (orig_w, orig_h) = original;

    if orig_w <= max_width {
        return BreakpointSize {
            width: orig_w,
            height: orig_h,
            resized: false,
        };
    }

    let ratio = max_width as f64 / orig_w as f64;
    let height = ((orig_h as f64 * ratio).round() as u32).max(1);

    BreakpointSize {
        width: max_width,
        height,
        resized: true,
    }
}
