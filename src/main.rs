use clap::{Parser, Subcommand};
use mdblog::imaging::RustBackend;
use mdblog::{config, output, pipeline, render, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that render pages.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// Override `base_url` (takes precedence over MDBLOG_BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Parser)]
#[command(name = "mdblog")]
#[command(about = "Static site generator for Markdown blogs")]
#[command(long_about = "\
Static site generator for Markdown blogs

Markdown files become pages, plugins inject HTML snippets into every page,
and images get responsive mobile and desktop variants.

Site structure:

  config.yml                       # Site config (or config.toml)
  content/
  ├── pages/about.md               # → about.html
  ├── posts/2024-01-05-hello.md    # → posts/hello.html, listed on the index
  └── guides/setup.md              # → guides/setup.html
  templates/                       # base.html, page.html, post.html, index.html
  plugins/
  └── example/
      ├── head.html                # inserted before </head>
      ├── body.html                # inserted before </body>
      └── static/                  # → site/plugins/example/
  static/                          # → copied to the site root
  └── images/photo.jpg             # → photo.jpg, photo-mobile.jpg, photo-desktop.jpg

Pages use {{ name }} variables from front matter, the config file, and the
built-ins base_url, title, slug, url and date.

Run 'mdblog gen-config' to print a documented config.yml.")]
#[command(version)]
struct Cli {
    /// Config file (.yml, .yaml or .toml)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Log pipeline progress (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into output_dir
    #[command(alias = "generate")]
    Build(RenderArgs),
    /// Render everything without writing, reporting any errors
    Check(RenderArgs),
    /// Serve output_dir over HTTP
    Serve {
        #[arg(long, default_value_t = 8000)]
        port: u16,
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
    /// Print a stock config.yml with all options documented
    GenConfig,
    /// Write the built-in templates into templates_dir (existing files are kept)
    GenTemplates,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build(args) => {
            let site_config = load(&cli.config, &args)?;
            init_thread_pool(&site_config.processing);
            let report = pipeline::build(&site_config, &RustBackend::new())?;
            output::print_build_report(&report);
        }
        Command::Check(args) => {
            let site_config = load(&cli.config, &args)?;
            init_thread_pool(&site_config.processing);
            println!("==> Checking {}", site_config.content_dir.display());
            let report = pipeline::check(&site_config, &RustBackend::new())?;
            output::print_check_report(&report);
        }
        Command::Serve { port, host } => {
            let site_config = config::load_config(&cli.config)?;
            server::serve(&site_config.output_dir, &host, port)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_yaml());
        }
        Command::GenTemplates => {
            let site_config = config::load_config(&cli.config)?;
            let written = render::write_default_templates(&site_config.templates_dir)?;
            if written.is_empty() {
                println!(
                    "All templates already exist in {}",
                    site_config.templates_dir.display()
                );
            }
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}

/// Load the config file and apply the base URL override chain.
fn load(
    path: &std::path::Path,
    args: &RenderArgs,
) -> Result<config::SiteConfig, config::ConfigError> {
    let site_config = config::load_config(path)?;
    let env = std::env::var(config::BASE_URL_ENV).ok();
    let base_url =
        config::resolve_base_url(args.base_url.as_deref(), env.as_deref(), &site_config.base_url);
    Ok(site_config.with_base_url(base_url))
}

/// Install the fmt subscriber. `-v` raises the default level; RUST_LOG wins.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,mdblog=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
