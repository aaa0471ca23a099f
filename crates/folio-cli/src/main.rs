use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use folio_common::telemetry::{self, TelemetryConfig};
use folio_common::{NotionClient, NotionConfig, SiteConfig, load_dotenv};
use folio_renderer::assets::document_asset_urls;
use folio_renderer::{
    AssetCache, AssetMap, Document, EmphasisMode, HttpFetcher, PostIndex, PostMeta,
    RenderContext, render_article, render_document,
};
use futures_util::StreamExt;
use miette::{IntoDiagnostic, Result};
use serde_json::{Value, json};

#[derive(Parser)]
#[command(version, about = "Folio - Notion-backed blog builder", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding `.env` / `.env.local`
    #[arg(long, default_value = ".", global = true)]
    env_dir: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Site root; cached images go under `<public-dir>/images/notion`
    #[arg(long, global = true)]
    public_dir: Option<PathBuf>,

    /// Asset map location
    #[arg(long, global = true)]
    asset_map: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download images for every published post and rewrite the asset map
    Assets {
        /// Simultaneous downloads (overrides FOLIO_DOWNLOAD_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Write the post index JSON
    Index {
        /// Output path (overrides FOLIO_POST_INDEX)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Save a post's page and blocks as a local export
    Export {
        slug: String,

        #[arg(long)]
        out: PathBuf,
    },
    /// Render one post to HTML
    Render {
        /// Post slug (or page id) to fetch from Notion
        #[arg(long, conflicts_with = "export", required_unless_present = "export")]
        slug: Option<String>,

        /// Render a local export instead of fetching
        #[arg(long)]
        export: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Wrap the body in a full HTML document
        #[arg(long)]
        standalone: bool,

        /// Nest every emphasis mark instead of keeping only the strongest
        #[arg(long)]
        compose_emphasis: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette()?;

    let cli = Cli::parse();
    // Before telemetry so env files can set RUST_LOG.
    load_dotenv(&cli.env_dir)?;
    let mut telemetry_config = TelemetryConfig::from_env("folio");
    if cli.verbose {
        telemetry_config = telemetry_config.with_level(tracing::Level::DEBUG);
    }
    telemetry::init(telemetry_config);

    let mut site = SiteConfig::from_env()?;
    if let Some(dir) = cli.public_dir {
        site.public_dir = dir;
    }
    if let Some(path) = cli.asset_map {
        site.asset_map_path = path;
    }

    match cli.command {
        Commands::Assets { concurrency } => {
            if let Some(n) = concurrency {
                site.download_concurrency = n.max(1);
            }
            build_assets(&site).await
        }
        Commands::Index { out } => {
            let out = out.unwrap_or_else(|| site.post_index_path.clone());
            write_index(&out).await
        }
        Commands::Export { slug, out } => export_post(&slug, &out).await,
        Commands::Render {
            slug,
            export,
            out,
            standalone,
            compose_emphasis,
        } => {
            let emphasis = if compose_emphasis {
                EmphasisMode::Compose
            } else {
                EmphasisMode::Precedence
            };
            let loaded = match (export, slug) {
                (Some(path), _) => Document::from_export(&path).map_err(miette::Report::from),
                (None, Some(slug)) => load_post(&slug).await,
                (None, None) => Err(miette::miette!("either --slug or --export is required")),
            };

            let map = AssetMap::load_or_empty(&site.asset_map_path);
            let ctx = RenderContext::new(&map).with_emphasis(emphasis);
            let html = match loaded {
                Ok(doc) if standalone => render_document(&doc, &ctx).standalone_html(),
                loaded => render_article(loaded, &ctx),
            };
            write_output(out.as_deref(), &html)
        }
    }
}

fn client() -> Result<NotionClient> {
    Ok(NotionClient::new(NotionConfig::from_env()?)?)
}

/// The published page whose slug or id is `slug`.
async fn find_page(client: &NotionClient, slug: &str) -> Result<Value> {
    client
        .query_published()
        .await?
        .into_iter()
        .find(|page| PostMeta::from_page(page).is_ok_and(|meta| meta.matches(slug)))
        .ok_or_else(|| miette::miette!("no published post with slug {slug:?}"))
}

async fn load_post(slug: &str) -> Result<Document> {
    let client = client()?;
    let page = find_page(&client, slug).await?;
    let id = page.get("id").and_then(Value::as_str).unwrap_or_default();
    let blocks = client.fetch_block_children(id).await?;
    Ok(Document::from_values(&page, &blocks)?)
}

async fn build_assets(site: &SiteConfig) -> Result<()> {
    let client = client()?;
    let pages = client.query_published().await?;
    tracing::info!(posts = pages.len(), "collecting asset urls");

    let loaded: Vec<Result<Document>> = futures_util::stream::iter(pages.iter().map(|page| {
        let client = &client;
        async move {
            let id = page.get("id").and_then(Value::as_str).unwrap_or_default();
            let blocks = client.fetch_block_children(id).await?;
            Ok::<_, miette::Report>(Document::from_values(page, &blocks)?)
        }
    }))
    .buffered(site.download_concurrency)
    .collect()
    .await;

    let urls = batch_asset_urls(loaded)?;

    let cache = AssetCache::from_config(site);
    let report = cache.build(&urls, &HttpFetcher::new()?).await?;
    println!(
        "✓ {} downloaded, {} cached, {} failed; map at {}",
        report.downloaded,
        report.skipped,
        report.failed,
        cache.map_path().display()
    );
    Ok(())
}

/// Asset URLs across every post, or the first load failure.
///
/// The map is rebuilt from the batch, so any failed load aborts the build
/// before the existing map is touched.
fn batch_asset_urls(loaded: Vec<Result<Document>>) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    for doc in loaded {
        let doc = doc.map_err(|e| e.wrap_err("loading post blocks; asset map left unchanged"))?;
        urls.extend(document_asset_urls(&doc));
    }
    Ok(urls)
}

async fn write_index(out: &Path) -> Result<()> {
    let pages = client()?.query_published().await?;
    let index = PostIndex::from_pages(&pages, chrono::Utc::now());
    index.save(out)?;
    println!("✓ {} posts written to {}", index.posts.len(), out.display());
    Ok(())
}

async fn export_post(slug: &str, out: &Path) -> Result<()> {
    let client = client()?;
    let page = find_page(&client, slug).await?;
    let id = page.get("id").and_then(Value::as_str).unwrap_or_default();
    let blocks = client.fetch_block_children(id).await?;

    let json = serde_json::to_string_pretty(&json!({ "page": page, "blocks": blocks }))
        .into_diagnostic()?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).into_diagnostic()?;
    }
    std::fs::write(out, json).into_diagnostic()?;
    println!("✓ Exported {} blocks to {}", blocks.len(), out.display());
    Ok(())
}

fn write_output(out: Option<&Path>, html: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            std::fs::write(path, html).into_diagnostic()?;
            tracing::info!(path = %path.display(), bytes = html.len(), "wrote html");
        }
        None => print!("{html}"),
    }
    Ok(())
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}
