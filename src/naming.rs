//! Filename conventions for content files and image variants.
//!
//! ## Post Filenames
//!
//! Posts may carry a `YYYY-MM-DD-` date prefix. The prefix supplies the
//! publication date when the front matter does not, and is stripped from the
//! slug:
//! - `2024-01-05-hello-world` → date=2024-01-05, slug="hello-world"
//! - `hello-world` → date=None, slug="hello-world"
//! - `2024-13-40-oops` → date=None, slug="2024-13-40-oops" (not a real date)
//!
//! ## Display Titles
//!
//! When a page has neither a front matter title nor a `# ` heading, the slug
//! is used with dashes turned into spaces: `who-am-i` → "who am i".
//!
//! ## Image Variants
//!
//! Responsive variants sit next to the copied original and differ only by a
//! fixed stem suffix: `photo.jpg` → `photo-mobile.jpg`, `photo-desktop.jpg`.

use chrono::NaiveDate;

/// Result of parsing a content filename stem.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date from a `YYYY-MM-DD-` prefix, if present and valid.
    pub date: Option<NaiveDate>,
    /// Stem with the date prefix removed. Never empty: a bare date keeps
    /// the full stem.
    pub slug: String,
    /// Slug with dashes converted to spaces.
    pub display_title: String,
}

/// Length of `YYYY-MM-DD`.
const DATE_PREFIX_LEN: usize = 10;

/// Parse a content filename stem following the `YYYY-MM-DD-slug` convention.
pub fn parse_entry_name(stem: &str) -> ParsedName {
    if let Some(date) = stem.get(..DATE_PREFIX_LEN).and_then(parse_date)
        && let Some(rest) = stem[DATE_PREFIX_LEN..].strip_prefix('-')
        && !rest.is_empty()
    {
        return ParsedName {
            date: Some(date),
            slug: rest.to_string(),
            display_title: rest.replace('-', " "),
        };
    }
    ParsedName {
        date: (stem.len() == DATE_PREFIX_LEN)
            .then(|| parse_date(stem))
            .flatten(),
        slug: stem.to_string(),
        display_title: stem.replace('-', " "),
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Which responsive rendition of an image a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Original,
    Mobile,
    Desktop,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Original, Variant::Mobile, Variant::Desktop];

    /// Stem suffix appended for this variant (empty for the original).
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Original => "",
            Variant::Mobile => "-mobile",
            Variant::Desktop => "-desktop",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Variant::Original => "original",
            Variant::Mobile => "mobile",
            Variant::Desktop => "desktop",
        }
    }
}

/// Build the filename of `variant` for a source file name like `photo.jpg`.
///
/// Deterministic, so re-running overwrites rather than accumulates files.
pub fn variant_file_name(file_name: &str, variant: Variant) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}{}.{ext}", variant.suffix()),
        _ => format!("{file_name}{}", variant.suffix()),
    }
}

/// Whether a file stem already names a generated variant.
///
/// Used to skip `photo-mobile.jpg` if someone drops generated files back
/// into the source directory.
pub fn is_variant_stem(stem: &str) -> bool {
    [Variant::Mobile, Variant::Desktop]
        .iter()
        .any(|v| stem.ends_with(v.suffix()))
}
