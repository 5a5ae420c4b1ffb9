//! # mdblog
//!
//! A small static site generator for Markdown blogs. Markdown files become
//! HTML pages, plugins inject snippets and assets into every page, and
//! images are published with responsive mobile and desktop variants.
//!
//! # Architecture: One Pass, Checked Before Written
//!
//! ```text
//! config.yml ─→ SiteConfig
//! plugins/   ─→ Vec<Plugin>              (unknown names fail here)
//! content/   ─→ Vec<ContentPage>         (front matter + Markdown)
//! images/    ─→ ImagePlan                (dimensions only)
//!            ─→ Vec<RenderedPage>        (render + inject, in parallel)
//!            ─→ site/                    (pages, assets, image variants)
//! ```
//!
//! Everything that can fail the build happens before the first write, so a
//! broken config, a missing plugin or an unresolved `{{ variable }}` never
//! leaves a half-written site behind. Images are the exception: a broken
//! image is reported and skipped, the rest of the site is still built.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.yml` / `config.toml` loading, validation, base URL overrides |
//! | [`scan`] | Walks the content directory and yields [`types::ContentPage`]s |
//! | [`frontmatter`] | Splits and parses the YAML block at the top of a Markdown file |
//! | [`naming`] | `YYYY-MM-DD-slug` post names and `-mobile`/`-desktop` variant names |
//! | [`template`] | `{{ name }}` substitution and the variable [`template::Scope`] |
//! | [`render`] | Markdown → HTML, page templates (maud defaults), index page |
//! | [`plugins`] | Plugin loading, fragment injection, plugin asset copying |
//! | [`images`] | Responsive image planning and parallel variant writing |
//! | [`imaging`] | Pure-Rust image operations: identify, resize, encode |
//! | [`writer`] | Writes pages and copies asset trees into the output directory |
//! | [`pipeline`] | Runs a full build or check and returns a report |
//! | [`output`] | CLI output formatting for build and check reports |
//! | [`server`] | Local static file server for the built site |
//! | [`types`] | Shared types: pages, metadata values |
//!
//! # Design Decisions
//!
//! ## Substitution, Not a Template Language
//!
//! Templates, fragments and Markdown share one mechanism: `{{ name }}` is
//! replaced by a value, single pass, no escaping, no expressions. Anything
//! fancier is an error. The built-in templates are written with
//! [Maud](https://maud.lambda.xyz/) so they are checked at compile time, and
//! `mdblog gen-templates` writes them out as plain HTML for editing.
//!
//! ## Variables Before Markdown
//!
//! Page bodies are substituted before Markdown conversion, so variables work
//! inside link targets: `[about]({{ base_url }}about.html)`.
//!
//! ## Variants Always Exist
//!
//! An image narrower than a breakpoint is copied under the variant name
//! instead of being skipped, so `photo-mobile.jpg` can be linked without
//! knowing the source size.

pub mod config;
pub mod frontmatter;
pub mod images;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod plugins;
pub mod render;
pub mod scan;
pub mod server;
pub mod template;
pub mod types;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
