//! One build run, start to finish.
//!
//! ```text
//! load plugins → scan content → load templates → plan images
//!     → render + inject (parallel) → write pages → copy assets
//!     → write image variants (parallel) → BuildReport
//! ```
//!
//! Every fatal check runs before the first byte is written: an unknown
//! plugin, unreadable content or any template error leaves the output
//! directory untouched. Image failures are never fatal; they are listed in
//! [`BuildReport::image_failures`].

use crate::config::{ConfigError, SiteConfig};
use crate::images::{self, ImageAsset, ImageError, ResponsiveIndex};
use crate::imaging::{ImageBackend, Quality};
use crate::plugins::{self, Plugin, PluginInjector};
use crate::render::{INDEX_PAGE, Renderer, TemplateSet, page_name, sort_posts};
use crate::scan::{self, ScanError};
use crate::template::TemplateError;
use crate::types::{ContentPage, PageKind, RenderedPage};
use crate::writer::{OutputWriter, WriteError};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("{}", templates_message(.0))]
    Templates(Vec<TemplateError>),
    #[error("{first} and {second} both render to {path}")]
    DuplicateOutput {
        path: PathBuf,
        first: String,
        second: String,
    },
    #[error(transparent)]
    Io(#[from] WriteError),
}

fn templates_message(errors: &[TemplateError]) -> String {
    let mut msg = format!("{} template error(s):", errors.len());
    for e in errors {
        msg.push_str("\n  ");
        msg.push_str(&e.to_string());
    }
    msg
}

/// One rendered page, as listed in reports.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub title: String,
    /// Output path relative to the output directory.
    pub output_path: PathBuf,
    /// `None` for the generated index.
    pub kind: Option<PageKind>,
}

/// What a successful build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub pages: Vec<PageSummary>,
    pub plugins: Vec<String>,
    pub plugin_assets: Vec<PathBuf>,
    pub static_assets: Vec<PathBuf>,
    pub images: Vec<ImageAsset>,
    pub image_failures: Vec<ImageError>,
}

/// What `check` verified, without writing anything.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub pages: Vec<PageSummary>,
    pub plugins: Vec<String>,
    pub images: Vec<ImageAsset>,
    pub image_failures: Vec<ImageError>,
}

/// Everything computed before writing.
struct Prepared {
    plugins: Vec<Plugin>,
    rendered: Vec<(RenderedPage, PageSummary)>,
    images: images::ImagePlan,
}

fn summary(page: &ContentPage, scope_title: Option<&str>) -> PageSummary {
    PageSummary {
        title: scope_title.unwrap_or(&page.title).to_string(),
        output_path: page.output_rel_path(),
        kind: Some(page.kind),
    }
}

fn prepare(config: &SiteConfig, backend: &impl ImageBackend) -> Result<Prepared, BuildError> {
    let plugins = plugins::load_plugins(config)?;
    info!(plugins = plugins.len(), "loaded plugins");

    let mut pages = scan::scan_all(&config.content_dir)?;
    pages.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    info!(pages = pages.len(), dir = %config.content_dir.display(), "scanned content");

    let templates =
        TemplateSet::load(&config.templates_dir).map_err(|e| BuildError::Templates(vec![e]))?;
    let image_plan = images::plan(backend, config);
    let index = ResponsiveIndex::new(&image_plan.assets);

    let renderer = Renderer::new(config, &templates, &index);
    let injector = PluginInjector::new(&plugins);

    let results: Vec<Result<(RenderedPage, PageSummary), TemplateError>> = pages
        .par_iter()
        .map(|page| {
            let scope = renderer.scope_for(page)?;
            let rendered = renderer.render(page, &scope)?;
            let html = injector.inject(&rendered.html, &scope, &page_name(page))?;
            debug!(page = %page.rel_path.display(), "rendered");
            Ok((
                RenderedPage { html, ..rendered },
                summary(page, scope.get("title")),
            ))
        })
        .collect();

    let mut rendered = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(page) => rendered.push(page),
            Err(e) => errors.push(e),
        }
    }
    if !errors.is_empty() {
        errors.sort_by_key(|e| e.to_string());
        return Err(BuildError::Templates(errors));
    }

    check_duplicates(&pages)?;

    let has_index = rendered
        .iter()
        .any(|(page, _)| page.output_path == Path::new(INDEX_PAGE));
    if !has_index {
        let mut posts: Vec<&ContentPage> =
            pages.iter().filter(|p| p.kind == PageKind::Post).collect();
        sort_posts(&mut posts);
        let scope = renderer.index_scope();
        let page = renderer
            .render_index(&posts, &scope)
            .and_then(|page| {
                let html = injector.inject(&page.html, &scope, INDEX_PAGE)?;
                Ok(RenderedPage { html, ..page })
            })
            .map_err(|e| BuildError::Templates(vec![e]))?;
        rendered.push((
            page,
            PageSummary {
                title: scope.get("title").unwrap_or_default().to_string(),
                output_path: PathBuf::from(INDEX_PAGE),
                kind: None,
            },
        ));
    }

    Ok(Prepared {
        plugins,
        rendered,
        images: image_plan,
    })
}

fn check_duplicates(pages: &[ContentPage]) -> Result<(), BuildError> {
    let mut seen: BTreeMap<PathBuf, &ContentPage> = BTreeMap::new();
    for page in pages {
        let path = page.output_rel_path();
        if let Some(first) = seen.get(&path) {
            return Err(BuildError::DuplicateOutput {
                path,
                first: page_name(first),
                second: page_name(page),
            });
        }
        seen.insert(path, page);
    }
    Ok(())
}

/// Build the site described by `config` into `config.output_dir`.
pub fn build(config: &SiteConfig, backend: &impl ImageBackend) -> Result<BuildReport, BuildError> {
    let prepared = prepare(config, backend)?;
    let writer = OutputWriter::new(&config.output_dir);

    let mut report = BuildReport {
        output_dir: config.output_dir.clone(),
        plugins: prepared.plugins.iter().map(|p| p.name.clone()).collect(),
        ..Default::default()
    };

    for (page, summary) in &prepared.rendered {
        writer.write_page(page)?;
        report.pages.push(summary.clone());
    }
    info!(pages = report.pages.len(), "wrote pages");

    report.plugin_assets = PluginInjector::new(&prepared.plugins).copy_static(&writer)?;
    report.static_assets = writer.copy_tree(
        &config.static_dir,
        Path::new(""),
        Some(&config.images.source_dir),
    )?;
    info!(
        plugin_assets = report.plugin_assets.len(),
        static_assets = report.static_assets.len(),
        "copied assets"
    );

    let images = images::process(
        backend,
        &prepared.images.assets,
        &config.output_dir,
        Quality::new(config.images.quality),
    );
    report.images = images.processed;
    report.image_failures = prepared.images.failures;
    report.image_failures.extend(images.failures);
    info!(
        images = report.images.len(),
        failed = report.image_failures.len(),
        "processed images"
    );

    Ok(report)
}

/// Run every stage of a build except writing.
pub fn check(config: &SiteConfig, backend: &impl ImageBackend) -> Result<CheckReport, BuildError> {
    let prepared = prepare(config, backend)?;
    Ok(CheckReport {
        pages: prepared.rendered.into_iter().map(|(_, s)| s).collect(),
        plugins: prepared.plugins.into_iter().map(|p| p.name).collect(),
        images: prepared.images.assets,
        image_failures: prepared.images.failures,
    })
}
