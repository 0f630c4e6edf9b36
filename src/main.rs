mod config;
mod extract;
mod fetch;
mod inspect;
mod media;
mod model;
mod pipeline;
mod slug;
mod storage;
mod transform;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

use crate::config::Settings;
use crate::fetch::HttpFetcher;
use crate::model::{PostRecord, VideoRecord};
use crate::pipeline::ScrapeStats;
use crate::storage::{load_records, FsStorage};

#[derive(Parser)]
#[command(name = "wp_migrate", about = "Migrate WordPress blog posts and videos to Hugo content")]
struct Cli {
    /// Blog index page (overrides MIGRATE_BLOG_URL)
    #[arg(long, global = true)]
    blog_url: Option<String>,
    /// Directory for scraped JSON and images (overrides MIGRATE_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Hugo content directory (overrides MIGRATE_CONTENT_DIR)
    #[arg(long, global = true)]
    content_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape text posts: listing, post pages, images → posts.json
    Posts,
    /// Scrape video cards and thumbnails → videos.json
    Videos,
    /// Turn scraped records into Hugo page bundles
    Transform {
        #[arg(short, long, value_enum, default_value_t = RecordKind::Videos)]
        kind: RecordKind,
    },
    /// Show how links on the blog index page are distributed
    Inspect,
}

#[derive(Clone, Copy, ValueEnum)]
enum RecordKind {
    Posts,
    Videos,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?.with_overrides(cli.blog_url, cli.output_dir, cli.content_dir);
    let today = chrono::Local::now().date_naive();

    let result = match cli.command {
        Commands::Posts => {
            let fetcher = HttpFetcher::new(settings.timeout())?;
            let stats = pipeline::scrape_posts(&fetcher, &FsStorage, &settings, today).await?;
            if stats.found == 0 {
                println!("No posts found. Exiting.");
                return Ok(());
            }
            print_stats("posts", &stats);
            println!("Data saved to: {}", settings.posts_file().display());
            println!("Images saved to: {}", settings.images_dir().display());
            Ok(())
        }
        Commands::Videos => {
            let fetcher = HttpFetcher::new(settings.timeout())?;
            let stats = pipeline::scrape_videos(&fetcher, &FsStorage, &settings, today).await?;
            if stats.found == 0 {
                println!("No video posts found. Exiting.");
                return Ok(());
            }
            print_stats("video posts", &stats);
            println!("Data saved to: {}", settings.videos_file().display());
            println!("Thumbnails saved to: {}", settings.images_dir().display());
            Ok(())
        }
        Commands::Transform { kind } => {
            let storage = FsStorage;
            let images_dir = settings.images_dir();
            let written = match kind {
                RecordKind::Videos => {
                    let records: Vec<VideoRecord> = load_records(&storage, &settings.videos_file())?;
                    println!("Loaded {} video records", records.len());
                    transform::transform_all(&storage, &records, &images_dir, &settings.content_dir)?
                }
                RecordKind::Posts => {
                    let records: Vec<PostRecord> = load_records(&storage, &settings.posts_file())?;
                    println!("Loaded {} post records", records.len());
                    transform::transform_all(&storage, &records, &images_dir, &settings.content_dir)?
                }
            };
            println!("Created {} Hugo posts in {}/", written, settings.content_dir.display());
            Ok(())
        }
        Commands::Inspect => {
            let fetcher = HttpFetcher::new(settings.timeout())?;
            let base = Url::parse(&settings.blog_url)?;
            let html = fetch::Fetcher::get_text(&fetcher, base.as_str()).await?;
            print_census(&inspect::census(&html, &base));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_stats(what: &str, stats: &ScrapeStats) {
    println!(
        "Scraped {} {} ({} found, {} errors, {} images downloaded)",
        stats.saved, what, stats.found, stats.errors, stats.images
    );
}

fn print_census(c: &inspect::LinkCensus) {
    println!("Total links on page: {}\n", c.total);
    print_links("Video links", &c.video, 5);
    print_links("Blog links", &c.blog, 10);
    print_links("Other links", &c.other, 5);
    println!("CTA sections: {}", c.cta_sections);
    if c.cta_sections > 0 {
        print_links("Links in first CTA", &c.first_cta_links, usize::MAX);
    }
}

fn print_links(label: &str, links: &[(String, String)], limit: usize) {
    println!("{}: {}", label, links.len());
    for (text, url) in links.iter().take(limit) {
        println!("  - {}: {}", truncate(text, 50), truncate(url, 80));
    }
    println!();
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
