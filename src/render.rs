//! Markdown and template rendering.
//!
//! A page goes through four text passes, each one a [`substitute`] call
//! with the same page scope:
//!
//! 1. The Markdown source (so `[x]({{ base_url }}about.html)` links work)
//! 2. Markdown → HTML via pulldown-cmark, plus `srcset` on known images
//! 3. The kind template (`page.html` / `post.html`) with `{{ content }}`
//! 4. `base.html` with the kind template's output as `{{ content }}`
//!
//! ## Templates
//!
//! Templates are plain HTML files in `templates_dir`. Any that are missing
//! fall back to built-in defaults written with [maud](https://maud.lambda.xyz/);
//! `mdblog gen-templates` writes those defaults out for editing.
//!
//! ## Scope
//!
//! | Layer | Variables |
//! |---|---|
//! | Defaults | `site_title` ("My Blog"), `lang` ("en") |
//! | Site | every non-reserved key of the config file |
//! | Built-in | `base_url`, `title`, `slug`, `url`, `date`, `date_iso` |
//! | Page | the page's front matter |

use crate::config::SiteConfig;
use crate::images::ResponsiveIndex;
use crate::naming::Variant;
use crate::template::{Origin, Scope, TemplateError, substitute};
use crate::types::{ContentPage, PageKind, RenderedPage};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const BASE_TEMPLATE: &str = "base.html";
pub const INDEX_TEMPLATE: &str = "index.html";

/// Output path of the generated post list.
pub const INDEX_PAGE: &str = "index.html";

const DEFAULT_SITE_TITLE: &str = "My Blog";
const DEFAULT_LANG: &str = "en";

/// The four page templates, loaded once per build.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSet {
    pub base: String,
    pub page: String,
    pub post: String,
    pub index: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            base: default_base().into_string(),
            page: default_page().into_string(),
            post: default_post().into_string(),
            index: default_index().into_string(),
        }
    }
}

impl TemplateSet {
    /// Load templates from `dir`, using the built-in default for each missing file.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let defaults = Self::default();
        let read = |name: &str, fallback: String| -> Result<String, TemplateError> {
            let path = dir.join(name);
            if !path.is_file() {
                return Ok(fallback);
            }
            fs::read_to_string(&path).map_err(|source| TemplateError::Read { path, source })
        };
        Ok(Self {
            base: read(BASE_TEMPLATE, defaults.base)?,
            page: read(PageKind::Page.template_name(), defaults.page)?,
            post: read(PageKind::Post.template_name(), defaults.post)?,
            index: read(INDEX_TEMPLATE, defaults.index)?,
        })
    }

    fn for_kind(&self, kind: PageKind) -> &str {
        match kind {
            PageKind::Page => &self.page,
            PageKind::Post => &self.post,
        }
    }

    fn named(&self) -> [(&'static str, &str); 4] {
        [
            (BASE_TEMPLATE, &self.base),
            (PageKind::Page.template_name(), &self.page),
            (PageKind::Post.template_name(), &self.post),
            (INDEX_TEMPLATE, &self.index),
        ]
    }
}

/// Write the built-in templates into `dir`, leaving existing files alone.
///
/// Returns the paths that were written.
pub fn write_default_templates(dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let defaults = TemplateSet::default();
    let mut written = Vec::new();
    for (name, text) in defaults.named() {
        let path = dir.join(name);
        if path.exists() {
            continue;
        }
        fs::write(&path, text)?;
        written.push(path);
    }
    Ok(written)
}

// ============================================================================
// Default templates
// ============================================================================

fn default_base() -> Markup {
    html! {
        (DOCTYPE)
        html lang="{{ lang }}" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "{{ title }} · {{ site_title }}" }
                script src="https://cdn.tailwindcss.com" {}
            }
            body class="bg-gray-100 text-gray-900 font-sans" {
                div class="container mx-auto px-4 py-8" {
                    header class="mb-8" {
                        h1 class="text-4xl font-bold" {
                            a class="text-blue-600 hover:underline" href="{{ base_url }}" { "{{ site_title }}" }
                        }
                        nav class="mt-4" {
                            a class="mr-4 hover:text-blue-600" href="{{ base_url }}" { "Home" }
                        }
                    }
                    main {
                        (PreEscaped("{{ content }}"))
                    }
                    footer class="mt-12 text-center text-sm text-gray-500" {
                        "{{ site_title }}"
                    }
                }
            }
        }
    }
}

fn default_page() -> Markup {
    html! {
        article class="prose lg:prose-xl bg-white p-8 rounded shadow" {
            (PreEscaped("{{ content }}"))
        }
    }
}

fn default_post() -> Markup {
    html! {
        article class="prose lg:prose-xl bg-white p-8 rounded shadow" {
            p class="text-sm text-gray-500 mb-4" {
                time datetime="{{ date_iso }}" { "{{ date }}" }
            }
            (PreEscaped("{{ content }}"))
        }
    }
}

fn default_index() -> Markup {
    html! {
        section class="mb-8" {
            h2 class="text-3xl font-bold mb-4" { "Latest posts" }
            (PreEscaped("{{ posts }}"))
        }
    }
}

/// The `{{ posts }}` list for the index page.
fn post_list(posts: &[&ContentPage], base_url: &str) -> Markup {
    html! {
        ul.post-list {
            @for post in posts {
                li class="mb-2" {
                    a class="text-xl text-blue-600 hover:underline" href={ (base_url) (post.url_path()) } {
                        (post.title)
                    }
                    @if let Some(date) = post.date {
                        span class="text-sm text-gray-500" { " - " (format_date(date)) }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

/// Newest first; undated posts last; ties broken by title.
pub fn sort_posts(posts: &mut [&ContentPage]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));
}

/// Convert Markdown to HTML with tables and strikethrough enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<img\s[^>]*>").expect("valid img regex"));
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\ssrc="([^"]*)""#).expect("valid src regex"));

/// Renders pages of one site. Shared read-only across worker threads.
pub struct Renderer<'a> {
    config: &'a SiteConfig,
    templates: &'a TemplateSet,
    images: &'a ResponsiveIndex,
}

impl<'a> Renderer<'a> {
    pub fn new(
        config: &'a SiteConfig,
        templates: &'a TemplateSet,
        images: &'a ResponsiveIndex,
    ) -> Self {
        Self {
            config,
            templates,
            images,
        }
    }

    /// Defaults and site metadata, shared by every page.
    fn site_scope(&self) -> Scope {
        let mut scope = Scope::new();
        scope.insert("site_title", DEFAULT_SITE_TITLE);
        scope.insert("lang", DEFAULT_LANG);
        scope.extend_from(&self.config.site);
        scope.insert("base_url", self.config.base_url.clone());
        scope
    }

    /// The full variable scope of `page`.
    ///
    /// The title may itself contain variables (`# Hi {{ name }}`), so it is
    /// substituted against the rest of the scope before being bound.
    pub fn scope_for(&self, page: &ContentPage) -> Result<Scope, TemplateError> {
        let mut scope = self.site_scope();
        scope.insert("slug", page.slug.clone());
        scope.insert(
            "url",
            format!("{}{}", self.config.base_url, page.url_path()),
        );
        scope.insert("date", page.date.map(format_date).unwrap_or_default());
        scope.insert(
            "date_iso",
            page.date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        );
        scope.extend_from(&page.metadata);

        let page_name = page_name(page);
        let title = substitute(
            &page.title,
            &scope,
            Origin {
                page: &page_name,
                source: "page title",
            },
        )?;
        scope.insert("title", title);
        Ok(scope)
    }

    /// Render `page` to a complete HTML document.
    pub fn render(&self, page: &ContentPage, scope: &Scope) -> Result<RenderedPage, TemplateError> {
        let page_name = page_name(page);
        let markdown = substitute(
            &page.body_markdown,
            scope,
            Origin {
                page: &page_name,
                source: "page body",
            },
        )?;
        let body = self.add_srcsets(&markdown_to_html(&markdown));

        let kind_name = format!("template {}", page.kind.template_name());
        let inner = substitute(
            self.templates.for_kind(page.kind),
            &scope.with("content", body),
            Origin {
                page: &page_name,
                source: &kind_name,
            },
        )?;
        let html = self.wrap_in_base(inner, scope, &page_name)?;

        Ok(RenderedPage {
            output_path: page.output_rel_path(),
            html,
        })
    }

    /// Scope of the generated index page.
    pub fn index_scope(&self) -> Scope {
        let mut scope = self.site_scope();
        scope.insert("title", "Home");
        scope.insert("slug", "index");
        scope.insert("url", format!("{}{INDEX_PAGE}", self.config.base_url));
        scope.insert("date", "");
        scope.insert("date_iso", "");
        scope
    }

    /// Render the post list, `posts` already sorted.
    pub fn render_index(
        &self,
        posts: &[&ContentPage],
        scope: &Scope,
    ) -> Result<RenderedPage, TemplateError> {
        let list = post_list(posts, &self.config.base_url).into_string();
        let inner = substitute(
            &self.templates.index,
            &scope.with("posts", list),
            Origin {
                page: INDEX_PAGE,
                source: "template index.html",
            },
        )?;
        let html = self.wrap_in_base(inner, scope, INDEX_PAGE)?;
        Ok(RenderedPage {
            output_path: PathBuf::from(INDEX_PAGE),
            html,
        })
    }

    fn wrap_in_base(
        &self,
        content: String,
        scope: &Scope,
        page_name: &str,
    ) -> Result<String, TemplateError> {
        substitute(
            &self.templates.base,
            &scope.with("content", content),
            Origin {
                page: page_name,
                source: "template base.html",
            },
        )
    }

    /// Add `srcset`/`sizes` to every `<img>` whose source is a planned image.
    fn add_srcsets(&self, html: &str) -> String {
        if self.images.is_empty() {
            return html.to_string();
        }
        let base_url = &self.config.base_url;
        let sizes = format!(
            "(max-width: {}px) 100vw, {}px",
            self.config.images.mobile_width, self.config.images.desktop_width
        );

        IMG_TAG
            .replace_all(html, |caps: &regex::Captures| {
                let tag = &caps[0];
                if tag.contains(" srcset=") {
                    return tag.to_string();
                }
                let Some(src) = SRC_ATTR.captures(tag) else {
                    return tag.to_string();
                };
                let Some(asset) = self.images.lookup(&src[1], base_url) else {
                    return tag.to_string();
                };

                let mut entries: Vec<(u32, String)> = Vec::new();
                for variant in [Variant::Mobile, Variant::Desktop, Variant::Original] {
                    if let Some(planned) = asset.variant(variant)
                        && !entries.iter().any(|(w, _)| *w == planned.width)
                    {
                        entries.push((planned.width, asset.url(planned, base_url)));
                    }
                }
                entries.sort_by_key(|(w, _)| *w);
                let srcset = entries
                    .iter()
                    .map(|(w, url)| format!("{url} {w}w"))
                    .collect::<Vec<_>>()
                    .join(", ");

                let src_end = src.get(0).map(|m| m.end()).unwrap_or(tag.len());
                format!(
                    "{} srcset=\"{srcset}\" sizes=\"{sizes}\"{}",
                    &tag[..src_end],
                    &tag[src_end..]
                )
            })
            .into_owned()
    }
}

/// Name used for a page in error messages: its content-relative path.
pub fn page_name(page: &ContentPage) -> String {
    page.rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageAsset;
    use crate::imaging::{Breakpoints, Dimensions, plan_variants};
    use crate::types::{MetaValue, Metadata};
    use chrono::NaiveDate;

    fn page(rel: &str, kind: PageKind, title: &str, body: &str) -> ContentPage {
        let rel_path = PathBuf::from(rel);
        let slug = rel_path.file_stem().unwrap().to_string_lossy().to_string();
        ContentPage {
            source_path: PathBuf::from("/content").join(rel),
            rel_path,
            slug,
            kind,
            title: title.to_string(),
            date: None,
            metadata: Metadata::new(),
            body_markdown: body.to_string(),
        }
    }

    fn minimal_templates() -> TemplateSet {
        TemplateSet {
            base: "<html><head><title>{{ title }}</title></head><body>{{ content }}</body></html>"
                .into(),
            page: "<main>{{ content }}</main>".into(),
            post: "<article data-date=\"{{ date_iso }}\">{{ content }}</article>".into(),
            index: "<ul>{{ posts }}</ul>".into(),
        }
    }

    fn render_with(
        config: &SiteConfig,
        templates: &TemplateSet,
        page: &ContentPage,
    ) -> Result<RenderedPage, TemplateError> {
        let images = ResponsiveIndex::default();
        let renderer = Renderer::new(config, templates, &images);
        let scope = renderer.scope_for(page)?;
        renderer.render(page, &scope)
    }

    #[test]
    fn substitutes_front_matter_in_markdown() {
        let mut p = page("hello.md", PageKind::Page, "Hi {{ name }}", "# Hi {{ name }}\n");
        p.metadata.insert("name".into(), MetaValue::new("World"));

        let out = render_with(&SiteConfig::default(), &minimal_templates(), &p).unwrap();
        assert_eq!(out.output_path, PathBuf::from("hello.html"));
        assert!(out.html.contains("<h1>Hi World</h1>"));
        assert!(out.html.contains("<title>Hi World</title>"));
        assert!(out.html.contains("<main><h1>"));
    }

    #[test]
    fn base_url_in_markdown_links() {
        let config = SiteConfig::default().with_base_url("/blog");
        let p = page("a.md", PageKind::Page, "A", "[about]({{ base_url }}about.html)");
        let out = render_with(&config, &minimal_templates(), &p).unwrap();
        assert!(out.html.contains(r#"<a href="/blog/about.html">about</a>"#));
    }

    #[test]
    fn page_metadata_overrides_site() {
        let mut config = SiteConfig::default();
        config.site.insert("author".into(), MetaValue::new("Site"));
        let mut p = page("a.md", PageKind::Page, "A", "by {{ author }}");
        let out = render_with(&config, &minimal_templates(), &p).unwrap();
        assert!(out.html.contains("by Site"));

        p.metadata.insert("author".into(), MetaValue::new("Page"));
        let out = render_with(&config, &minimal_templates(), &p).unwrap();
        assert!(out.html.contains("by Page"));
    }

    #[test]
    fn unresolved_variable_names_page_and_key() {
        let p = page("posts/x.md", PageKind::Post, "X", "{{ nope }}");
        let err = render_with(&SiteConfig::default(), &minimal_templates(), &p).unwrap_err();
        match err {
            TemplateError::Unresolved { page, key, .. } => {
                assert_eq!(page, "posts/x.md");
                assert_eq!(key, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unresolved_variable_in_template_is_reported() {
        let mut templates = minimal_templates();
        templates.page = "{{ sidebar }}{{ content }}".into();
        let p = page("a.md", PageKind::Page, "A", "text");
        let err = render_with(&SiteConfig::default(), &templates, &p).unwrap_err();
        assert!(err.to_string().contains("template page.html"));
    }

    #[test]
    fn post_gets_dates() {
        let mut p = page("posts/x.md", PageKind::Post, "X", "body");
        p.date = NaiveDate::from_ymd_opt(2024, 1, 5);
        let config = SiteConfig::default();
        let templates = minimal_templates();
        let images = ResponsiveIndex::default();
        let renderer = Renderer::new(&config, &templates, &images);

        let scope = renderer.scope_for(&p).unwrap();
        assert_eq!(scope.get("date"), Some("05 January 2024"));
        assert_eq!(scope.get("url"), Some("/posts/x.html"));

        let out = renderer.render(&p, &scope).unwrap();
        assert!(out.html.contains(r#"data-date="2024-01-05""#));
    }

    #[test]
    fn substituted_values_are_inserted_verbatim() {
        let mut p = page("a.md", PageKind::Page, "A", "{{ raw }}");
        p.metadata.insert("raw".into(), MetaValue::new("{{ other }}"));
        let out = render_with(&SiteConfig::default(), &minimal_templates(), &p).unwrap();
        assert!(out.html.contains("{{ other }}"));
    }

    #[test]
    fn tables_and_strikethrough_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn default_templates_render() {
        let p = page("pages/about.md", PageKind::Page, "About", "Hello");
        let out = render_with(&SiteConfig::default(), &TemplateSet::default(), &p).unwrap();
        assert_eq!(out.output_path, PathBuf::from("about.html"));
        assert!(out.html.starts_with("<!DOCTYPE html>"));
        assert!(out.html.contains("<title>About · My Blog</title>"));
        assert!(out.html.contains("<p>Hello</p>"));
        assert!(out.html.contains("</head>") && out.html.contains("</body>"));
    }

    #[test]
    fn index_lists_posts_newest_first() {
        let mut old = page("posts/old.md", PageKind::Post, "Old", "");
        old.date = NaiveDate::from_ymd_opt(2023, 5, 1);
        let mut new = page("posts/new.md", PageKind::Post, "New & Shiny", "");
        new.date = NaiveDate::from_ymd_opt(2024, 2, 1);
        let undated = page("posts/misc.md", PageKind::Post, "Misc", "");

        let mut posts = vec![&old, &undated, &new];
        sort_posts(&mut posts);
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["New & Shiny", "Old", "Misc"]);

        let config = SiteConfig::default();
        let templates = minimal_templates();
        let images = ResponsiveIndex::default();
        let renderer = Renderer::new(&config, &templates, &images);
        let out = renderer
            .render_index(&posts, &renderer.index_scope())
            .unwrap();

        assert_eq!(out.output_path, PathBuf::from("index.html"));
        assert!(out.html.contains("<title>Home</title>"));
        assert!(out.html.contains(r#"href="/posts/new.html""#));
        assert!(out.html.contains("New &amp; Shiny"));
        let new_pos = out.html.find("new.html").unwrap();
        let old_pos = out.html.find("old.html").unwrap();
        assert!(new_pos < old_pos);
    }

    #[test]
    fn load_prefers_files_on_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("post.html"), "custom {{ content }}").unwrap();

        let set = TemplateSet::load(tmp.path()).unwrap();
        assert_eq!(set.post, "custom {{ content }}");
        assert_eq!(set.base, TemplateSet::default().base);
    }

    #[test]
    fn write_defaults_keeps_existing_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("base.html"), "mine").unwrap();

        let written = write_default_templates(tmp.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_to_string(tmp.path().join("base.html")).unwrap(), "mine");
        assert!(tmp.path().join("index.html").exists());
    }

    fn asset(rel: &str, dims: (u32, u32)) -> ImageAsset {
        let rel_path = PathBuf::from(rel);
        ImageAsset {
            source_path: PathBuf::from("/static/images").join(rel),
            variants: plan_variants(&rel_path, dims, Breakpoints {
                mobile: 480,
                desktop: 1200,
            }),
            rel_path,
            dimensions: Dimensions {
                width: dims.0,
                height: dims.1,
            },
        }
    }

    #[test]
    fn images_get_srcset() {
        let config = SiteConfig::default();
        let templates = minimal_templates();
        let images = ResponsiveIndex::new(&[asset("photo.jpg", (2000, 1500))]);
        let renderer = Renderer::new(&config, &templates, &images);

        let html = renderer.add_srcsets(r#"<p><img src="/images/photo.jpg" alt="A photo" /></p>"#);
        assert_eq!(
            html,
            r#"<p><img src="/images/photo.jpg" srcset="/images/photo-mobile.jpg 480w, /images/photo-desktop.jpg 1200w, /images/photo.jpg 2000w" sizes="(max-width: 480px) 100vw, 1200px" alt="A photo" /></p>"#
        );
    }

    #[test]
    fn small_image_srcset_has_one_entry() {
        let config = SiteConfig::default();
        let templates = minimal_templates();
        let images = ResponsiveIndex::new(&[asset("icon.png", (64, 64))]);
        let renderer = Renderer::new(&config, &templates, &images);

        let html = renderer.add_srcsets(r#"<img src="/images/icon.png" alt="" />"#);
        assert!(html.contains(r#"srcset="/images/icon-mobile.png 64w""#));
    }

    #[test]
    fn unknown_and_external_images_untouched() {
        let config = SiteConfig::default();
        let templates = minimal_templates();
        let images = ResponsiveIndex::new(&[asset("photo.jpg", (2000, 1500))]);
        let renderer = Renderer::new(&config, &templates, &images);

        for tag in [
            r#"<img src="https://example.com/images/photo.jpg" alt="" />"#,
            r#"<img src="/images/other.jpg" alt="" />"#,
            r#"<img src="/images/photo.jpg" srcset="x 1w" alt="" />"#,
        ] {
            assert_eq!(renderer.add_srcsets(tag), tag);
        }
    }
}
