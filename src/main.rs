use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use static_page_utils::cache::{clean_cache_dir, scan_cache_dir};
use static_page_utils::font::{FontStyle, character_set};
use static_page_utils::img::ImportImageOptions;
use static_page_utils::pwa::PwaManifest;
use static_page_utils::settings::{self, ProcessingConfig};
use static_page_utils::shell::{DEFAULT_LANG, PageShellOptions, Seo};
use static_page_utils::svg::ImportSvgOptions;
use static_page_utils::{RenderPass, Settings, StaticPageUtils, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter, e.g. `static_page_utils=debug`.
const LOG_ENV: &str = "STATIC_PAGE_UTILS_LOG";

#[derive(Parser)]
#[command(name = "static-page-utils")]
#[command(about = "Asset-import helpers for static sites")]
#[command(long_about = "\
Asset-import helpers for static sites

Each import prints an HTML fragment on stdout: an inline <style> or <script>,
a responsive <picture>, an inline <svg>, a Google Font block or a /res URL.
Generated files (resized images, PWA icons, manifest.json) are written under
the webroot, and expensive work is cached by content hash.

Project layout:

  site/
  ├── config.toml          # Settings (optional, see gen-config)
  ├── .browserslistrc      # CSS prefixing targets (optional)
  ├── cache/               # Content-hash cache
  └── public/              # Webroot
      ├── manifest.json
      ├── service-worker.js
      └── res/             # Images, icons, linked resources

Logging goes to stderr and is filtered by STATIC_PAGE_UTILS_LOG.

Run 'static-page-utils gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project root holding config.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log debug events (cache hits, downloads, created directories)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import one asset and print its HTML fragment
    #[command(subcommand)]
    Import(ImportCommand),
    /// Render a full page described by a TOML file
    Page {
        /// Page description
        page: PathBuf,
    },
    /// Inspect or clear the disk cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum ImportCommand {
    /// Inline a stylesheet with vendor prefixes
    Css { path: PathBuf },
    /// Compile and inline a SCSS file
    Sass { path: PathBuf },
    /// Inline a script
    Js { path: PathBuf },
    /// Generate responsive sizes and print a <picture>
    Img(ImgArgs),
    /// Inline an optimized SVG
    Svg(SvgArgs),
    /// Print an SVG as a base64 data URI
    SvgData { path: PathBuf },
    /// Inline a Google Font's CSS
    Font(FontArgs),
    /// Publish a file under /res and print its URL
    Res { path: PathBuf },
    /// Install a service worker and print its registration script
    Sw { path: PathBuf },
}

#[derive(Args)]
struct ImgArgs {
    path: PathBuf,
    /// Fraction of the viewport width the image occupies
    #[arg(long)]
    width_ratio: Option<f64>,
    /// Height as a fraction of the width
    #[arg(long)]
    height_ratio: Option<f64>,
    /// Encoding quality (1-100), overriding images.quality
    #[arg(long)]
    quality: Option<u32>,
    #[arg(long, default_value = "")]
    alt: String,
    #[arg(long)]
    id: Option<String>,
    #[arg(long = "class")]
    classes: Vec<String>,
    /// Output formats, overriding images.extensions
    #[arg(long = "ext")]
    extensions: Vec<String>,
    /// Crop to exactly the requested size instead of fitting
    #[arg(long)]
    force_size: bool,
}

#[derive(Args)]
struct SvgArgs {
    path: PathBuf,
    #[arg(long)]
    alt: Option<String>,
    #[arg(long)]
    id: Option<String>,
    #[arg(long = "class")]
    classes: Vec<String>,
}

#[derive(Args)]
struct FontArgs {
    family: String,
    /// Upright weight, repeatable
    #[arg(long = "weight", default_values_t = [400u16])]
    weights: Vec<u16>,
    /// Italic weight, repeatable
    #[arg(long = "italic")]
    italics: Vec<u16>,
    /// Glyph subset: basic_latin or all_latin, repeatable
    #[arg(long = "charset")]
    charsets: Vec<String>,
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Show entries and size per namespace
    Stats,
    /// Delete the cache directory
    Clean,
}

/// A page described in TOML. Paths are relative to the page file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PageFile {
    title: String,
    /// Output path relative to the webroot
    output: PathBuf,
    /// HTML fragment placed in `<body>`
    body: PathBuf,
    lang: Option<String>,
    #[serde(default)]
    body_classes: Vec<String>,
    #[serde(default)]
    fonts: Vec<PageFont>,
    #[serde(default)]
    css: Vec<PathBuf>,
    #[serde(default)]
    sass: Vec<PathBuf>,
    #[serde(default)]
    external_css: Vec<String>,
    #[serde(default)]
    js: Vec<PathBuf>,
    #[serde(default)]
    external_js: Vec<String>,
    #[serde(default)]
    seo: Seo,
    pwa: Option<PwaManifest>,
    service_worker: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PageFont {
    family: String,
    styles: Vec<FontStyle>,
    #[serde(default)]
    character_sets: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::GenConfig => {
            print!("{}", settings::stock_config_toml());
        }
        Command::Cache(command) => {
            let cache_dir = settings::load_config(&cli.root)?.cache_dir;
            match command {
                CacheCommand::Stats => {
                    let report = scan_cache_dir(&cache_dir)?;
                    output::print_cache_report(&report, &cache_dir);
                }
                CacheCommand::Clean => {
                    let removed = clean_cache_dir(&cache_dir)?;
                    println!("{}", output::format_cache_clean(&cache_dir, removed));
                }
            }
        }
        Command::Import(command) => {
            let kit = build_toolkit(&cli.root)?;
            println!("{}", run_import(&kit, command)?);
        }
        Command::Page { page } => {
            let kit = build_toolkit(&cli.root)?;
            render_page(&kit, &page)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load settings for `root` and assemble the toolkit.
fn build_toolkit(root: &Path) -> Result<StaticPageUtils, Box<dyn std::error::Error>> {
    let config: Settings = settings::load_config(root)?;
    init_thread_pool(&config.processing);
    let queries = settings::browserslist_queries(root, &config.css);
    Ok(StaticPageUtils::new_with_browserslist(config, queries)?)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores.
fn init_thread_pool(processing: &ProcessingConfig) {
    let threads = settings::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn run_import(kit: &StaticPageUtils, command: ImportCommand) -> static_page_utils::Result<String> {
    match command {
        ImportCommand::Css { path } => kit.css().import(path),
        ImportCommand::Sass { path } => kit.sass().import(path),
        ImportCommand::Js { path } => kit.js().import(path),
        ImportCommand::Img(args) => {
            let options = ImportImageOptions {
                width_ratio: args.width_ratio,
                height_ratio: args.height_ratio,
                quality: args.quality,
                id: args.id,
                classes: args.classes,
                alt: args.alt,
                extensions: (!args.extensions.is_empty()).then_some(args.extensions),
                force_size: args.force_size,
            };
            kit.img().import(args.path, &options)
        }
        ImportCommand::Svg(args) => {
            let options = ImportSvgOptions {
                alt: args.alt,
                id: args.id,
                classes: args.classes,
            };
            kit.svg().import(args.path, &options)
        }
        ImportCommand::SvgData { path } => kit.svg().as_data_string(path),
        ImportCommand::Font(args) => {
            let styles: Vec<FontStyle> = args
                .weights
                .iter()
                .map(|&w| FontStyle::new(w))
                .chain(args.italics.iter().map(|&w| FontStyle::italic(w)))
                .collect();
            let sets = named_character_sets(&args.charsets)?;
            kit.font().import_google(&args.family, &styles, &sets)
        }
        ImportCommand::Res { path } => kit.res().link(path),
        ImportCommand::Sw { path } => kit.pwa().import_service_worker(path),
    }
}

fn named_character_sets(
    names: &[String],
) -> static_page_utils::Result<Vec<static_page_utils::font::CharacterSet>> {
    names
        .iter()
        .map(|name| {
            character_set(name).ok_or_else(|| {
                settings::ConfigError::Validation(format!("unknown character set '{name}'")).into()
            })
        })
        .collect()
}

fn render_page(kit: &StaticPageUtils, page_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(page_path)?;
    let mut page: PageFile = toml::from_str(&content)?;
    let base = page_path.parent().unwrap_or(Path::new("."));
    rebase_page(&mut page, base);

    let mut pass = RenderPass::new();
    let mut attempts = 0;
    let mut shell = kit.shell(PageShellOptions {
        head: None,
        tail: None,
        body_classes: page.body_classes.clone(),
    });

    for font in &page.fonts {
        let sets = named_character_sets(&font.character_sets)?;
        shell.append_to_head(&kit.font().import_google(&font.family, &font.styles, &sets)?);
    }
    for path in &page.css {
        attempts += 1;
        shell.append_to_head(&kit.css().import_once(&mut pass, path)?);
    }
    for path in &page.sass {
        attempts += 1;
        shell.append_to_head(&kit.sass().import_once(&mut pass, path)?);
    }
    for url in &page.external_css {
        attempts += 1;
        shell.append_to_head(&kit.css().import_external_once(&mut pass, url)?);
    }
    for path in &page.js {
        attempts += 1;
        shell.append_to_tail(&kit.js().import_once(&mut pass, path)?);
    }
    for url in &page.external_js {
        attempts += 1;
        shell.append_to_tail(&kit.js().import_external_once(&mut pass, url)?);
    }
    if let Some(manifest) = &page.pwa {
        kit.pwa().create_manifest(manifest, &mut shell)?;
    }
    if let Some(worker) = &page.service_worker {
        shell.append_to_tail(&kit.pwa().import_service_worker(worker)?);
    }

    let body = std::fs::read_to_string(&page.body)?;
    let lang = page.lang.as_deref().unwrap_or(DEFAULT_LANG);
    let html = shell.render_lang(&page.title, &body, &page.seo, lang)?;

    let output_path = kit.settings().webroot_abs().join(&page.output);
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output_path, html)?;

    output::print_page_output(
        &page.title,
        &output_path,
        pass.len(),
        attempts - pass.len(),
        kit.cache_stats(),
    );
    Ok(())
}

/// Resolve every source path in a page file against the page's directory.
fn rebase_page(page: &mut PageFile, base: &Path) {
    let rebase = |path: &mut PathBuf| {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    };
    rebase(&mut page.body);
    page.css.iter_mut().for_each(rebase);
    page.sass.iter_mut().for_each(rebase);
    page.js.iter_mut().for_each(rebase);
    if let Some(image) = &mut page.seo.image {
        rebase(image);
    }
    if let Some(worker) = &mut page.service_worker {
        rebase(worker);
    }
    if let Some(pwa) = &mut page.pwa {
        let icons = &mut pwa.icon;
        for icon in [
            &mut icons.svg,
            &mut icons.png,
            &mut icons.maskable_svg,
            &mut icons.maskable_png,
        ]
        .into_iter()
        .flatten()
        {
            rebase(icon);
        }
    }
}
