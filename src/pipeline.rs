use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use crate::config::Settings;
use crate::extract::detail::extract_detail;
use crate::extract::listing::{extract_posts, extract_videos};
use crate::fetch::Fetcher;
use crate::media::{download_image, download_thumbnail};
use crate::model::{PostRecord, PostSummary, VideoRecord};
use crate::storage::{save_records, Storage};

/// Scrape stats returned after completion.
#[derive(Debug, Default, PartialEq)]
pub struct ScrapeStats {
    pub found: usize,
    pub saved: usize,
    pub errors: usize,
    pub images: usize,
}

fn base_url(settings: &Settings) -> Result<Url> {
    Url::parse(&settings.blog_url).with_context(|| format!("Invalid blog URL: {}", settings.blog_url))
}

fn progress(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

/// Index page → post pages → `posts.json`. Nothing is written when the
/// listing yields no posts.
pub async fn scrape_posts<F: Fetcher, S: Storage>(
    fetcher: &F,
    storage: &S,
    settings: &Settings,
    captured: NaiveDate,
) -> Result<ScrapeStats> {
    let base = base_url(settings)?;
    info!("Scraping blog listing from {}", base);

    let listing = match fetcher.get_text(base.as_str()).await {
        Ok(html) => extract_posts(&html, &base),
        Err(e) => {
            warn!("Error scraping blog listing: {}", e);
            Vec::new()
        }
    };
    let mut stats = ScrapeStats {
        found: listing.len(),
        ..Default::default()
    };
    if listing.is_empty() {
        return Ok(stats);
    }

    let pb = progress(listing.len())?;
    let mut records = Vec::with_capacity(listing.len());

    for (i, summary) in listing.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(settings.request_delay()).await;
        }
        pb.set_message(summary.url.clone());

        match scrape_post(fetcher, storage, settings, summary, captured).await {
            Ok((record, images)) => {
                info!(
                    "Scraped {} ({}; {} categories, {} videos)",
                    record.title,
                    record.date,
                    record.categories.len(),
                    record.embedded_video_urls.len()
                );
                stats.images += images;
                records.push(record);
            }
            Err(e) => {
                warn!("Error scraping post {}: {:#}", summary.url, e);
                stats.errors += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    save_records(storage, &settings.posts_file(), &records)?;
    stats.saved = records.len();
    info!("Saved {} posts to {}", stats.saved, settings.posts_file().display());
    Ok(stats)
}

/// One post page plus its images. Returns the record and how many images were
/// stored locally.
async fn scrape_post<F: Fetcher, S: Storage>(
    fetcher: &F,
    storage: &S,
    settings: &Settings,
    summary: &PostSummary,
    captured: NaiveDate,
) -> Result<(PostRecord, usize)> {
    let url = Url::parse(&summary.url).with_context(|| format!("Invalid post URL: {}", summary.url))?;
    let html = fetcher.get_text(url.as_str()).await?;
    let detail = extract_detail(&html, &url, summary, captured);
    let images_dir = settings.images_dir();

    let featured_image_filename = if detail.featured_image.is_empty() {
        None
    } else {
        download_image(fetcher, storage, &images_dir, &detail.featured_image, &detail.slug).await
    };
    let mut images = usize::from(featured_image_filename.is_some());

    for src in detail.content_images.iter().filter(|src| **src != detail.featured_image) {
        if download_image(fetcher, storage, &images_dir, src, &detail.slug)
            .await
            .is_some()
        {
            images += 1;
        }
    }

    let record = PostRecord {
        url: summary.url.clone(),
        title: detail.title,
        slug: detail.slug,
        date: detail.date,
        content: detail.content,
        excerpt: summary.excerpt.clone(),
        categories: detail.categories,
        featured_image_url: detail.featured_image,
        featured_image_filename,
        embedded_video_urls: detail.video_urls,
    };
    Ok((record, images))
}

/// Index page → video cards → thumbnails → `videos.json`.
pub async fn scrape_videos<F: Fetcher, S: Storage>(
    fetcher: &F,
    storage: &S,
    settings: &Settings,
    captured: NaiveDate,
) -> Result<ScrapeStats> {
    let base = base_url(settings)?;
    info!("Scraping video posts from {}", base);

    let videos = match fetcher.get_text(base.as_str()).await {
        Ok(html) => extract_videos(&html),
        Err(e) => {
            warn!("Error scraping video posts: {}", e);
            Vec::new()
        }
    };
    let mut stats = ScrapeStats {
        found: videos.len(),
        ..Default::default()
    };
    if videos.is_empty() {
        return Ok(stats);
    }

    let images_dir = settings.images_dir();
    let mut records = Vec::with_capacity(videos.len());
    for video in videos {
        let thumbnail =
            download_thumbnail(fetcher, storage, &images_dir, &video.video_id, &video.slug).await;
        if thumbnail.is_some() {
            stats.images += 1;
        }
        info!("{} (video {})", video.title, video.video_id);
        records.push(VideoRecord::from_summary(video, captured, thumbnail));
    }

    save_records(storage, &settings.videos_file(), &records)?;
    stats.saved = records.len();
    info!("Saved {} video posts to {}", stats.saved, settings.videos_file().display());
    Ok(stats)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::fetch::fake::FakeFetcher;
    use crate::media::{thumbnail_url, ThumbnailQuality};
    use crate::storage::load_records;
    use crate::storage::memory::MemStorage;

    const BLOG: &str = "https://iipmr.com/blog/";

    fn settings() -> Settings {
        Settings {
            output_dir: PathBuf::from("scraped"),
            request_delay_ms: 0,
            ..Settings::default()
        }
    }

    fn captured() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    #[tokio::test]
    async fn posts_end_to_end() {
        let fetcher = FakeFetcher::default()
            .page(BLOG, fixture("blog_index.html"))
            .page("https://iipmr.com/blog/future-of-warehousing/", fixture("post.html"))
            .page("https://iipmr.com/wp-content/uploads/warehouse.jpg", "w")
            .page("https://iipmr.com/wp-content/uploads/rack.jpg", "r")
            .fail("https://iipmr.com/blog/ai-in-procurement/", 500)
            .page(
                "https://iipmr.com/blog/green-logistics/",
                "<html><body><article><p>Greener routes.</p></article></body></html>",
            );
        let storage = MemStorage::default();

        let stats = scrape_posts(&fetcher, &storage, &settings(), captured()).await.unwrap();
        assert_eq!(stats.found, 3);
        assert_eq!(stats.saved, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.images, 2);

        let posts: Vec<PostRecord> = load_records(&storage, &settings().posts_file()).unwrap();
        assert_eq!(posts.len(), 2);

        let first = &posts[0];
        assert_eq!(first.slug, "the-future-of-warehousing");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(first.categories, vec!["Warehousing", "Automation"]);
        assert_eq!(first.featured_image_filename.as_deref(), Some("warehouse.jpg"));
        assert_eq!(first.embedded_video_urls.len(), 2);
        assert!(storage.exists(&PathBuf::from("scraped/images/rack.jpg")));

        // failed detail fetch drops that record, not the run
        assert!(posts.iter().all(|p| p.url != "https://iipmr.com/blog/ai-in-procurement/"));

        // featured image 404s: the record survives without a local copy
        let second = &posts[1];
        assert_eq!(second.url, "https://iipmr.com/blog/green-logistics/");
        assert_eq!(second.featured_image_url, "https://iipmr.com/wp-content/uploads/green.jpg");
        assert_eq!(second.featured_image_filename, None);
        assert_eq!(second.date, captured());
        assert_eq!(second.content, "<article><p>Greener routes.</p></article>");
    }

    #[tokio::test]
    async fn featured_image_in_content_is_fetched_once() {
        let hero = "https://iipmr.com/wp-content/uploads/hero.jpg";
        let fetcher = FakeFetcher::default()
            .page(
                BLOG,
                r#"<div class="pagelayer-cta">
                    <div class="pagelayer-cta-heading"><a href="/blog/hero-post/">Hero Post</a></div>
                    <div class="pagelayer-cta-image"><img src="/wp-content/uploads/hero.jpg"></div>
                </div>"#,
            )
            .page(
                "https://iipmr.com/blog/hero-post/",
                r#"<article><img src="/wp-content/uploads/hero.jpg"><img src="/wp-content/uploads/chart.png"></article>"#,
            )
            .page(hero, "h")
            .page("https://iipmr.com/wp-content/uploads/chart.png", "c");
        let storage = MemStorage::default();

        let stats = scrape_posts(&fetcher, &storage, &settings(), captured()).await.unwrap();
        assert_eq!(stats.saved, 1);
        assert_eq!(stats.images, 2);
        let hero_requests = fetcher.requests.borrow().iter().filter(|u| *u == hero).count();
        assert_eq!(hero_requests, 1);
    }

    #[tokio::test]
    async fn unreachable_listing_writes_nothing() {
        let fetcher = FakeFetcher::default().fail(BLOG, 503);
        let storage = MemStorage::default();

        let stats = scrape_posts(&fetcher, &storage, &settings(), captured()).await.unwrap();
        assert_eq!(stats, ScrapeStats::default());
        let stats = scrape_videos(&fetcher, &storage, &settings(), captured()).await.unwrap();
        assert_eq!(stats, ScrapeStats::default());
        assert!(storage.files.borrow().is_empty());
    }

    #[tokio::test]
    async fn videos_end_to_end() {
        let fetcher = FakeFetcher::default()
            .page(BLOG, fixture("blog_index.html"))
            .page(&thumbnail_url("dQw4w9WgXcQ", ThumbnailQuality::MaxRes), "max")
            .page(&thumbnail_url("abc12345678", ThumbnailQuality::High), "hq");
        let storage = MemStorage::default();

        let stats = scrape_videos(&fetcher, &storage, &settings(), captured()).await.unwrap();
        assert_eq!(stats.found, 3);
        assert_eq!(stats.saved, 3);
        assert_eq!(stats.images, 2);

        let videos: Vec<VideoRecord> = load_records(&storage, &settings().videos_file()).unwrap();
        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["dQw4w9WgXcQ", "abc12345678", "Zz9_-Yy8Xx7"]);
        assert!(videos.iter().all(|v| v.date == captured()));

        assert_eq!(
            videos[0].thumbnail_filename.as_deref(),
            Some("supply-chain-basics-thumbnail.jpg")
        );
        assert_eq!(
            storage.text("scraped/images/market-research-live-thumbnail.jpg").as_deref(),
            Some("hq")
        );
        assert_eq!(videos[2].thumbnail_filename, None);
    }
}
