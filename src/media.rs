use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::fetch::{FetchError, Fetcher};
use crate::storage::Storage;

/// Recognised video URL shapes, tried in order.
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})",
        r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/v/([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const THUMBNAIL_HOST: &str = "https://img.youtube.com/vi";

pub fn is_video_url(href: &str) -> bool {
    href.contains("youtube.com") || href.contains("youtu.be")
}

pub fn video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailQuality {
    MaxRes,
    High,
}

impl ThumbnailQuality {
    fn file_name(self) -> &'static str {
        match self {
            ThumbnailQuality::MaxRes => "maxresdefault.jpg",
            ThumbnailQuality::High => "hqdefault.jpg",
        }
    }
}

pub fn thumbnail_url(video_id: &str, quality: ThumbnailQuality) -> String {
    format!("{}/{}/{}", THUMBNAIL_HOST, video_id, quality.file_name())
}

pub fn thumbnail_filename(slug: &str) -> String {
    format!("{}-thumbnail.jpg", slug)
}

/// Max-resolution thumbnail, falling back once to the high-quality one when
/// the first is reported missing.
pub async fn fetch_thumbnail<F: Fetcher>(fetcher: &F, video_id: &str) -> Result<Vec<u8>, FetchError> {
    match fetcher
        .get_bytes(&thumbnail_url(video_id, ThumbnailQuality::MaxRes))
        .await
    {
        Err(e) if e.is_not_found() => {
            fetcher
                .get_bytes(&thumbnail_url(video_id, ThumbnailQuality::High))
                .await
        }
        other => other,
    }
}

/// Fetch and store the thumbnail for `video_id` as `<slug>-thumbnail.jpg`.
/// Any failure is logged and yields `None`.
pub async fn download_thumbnail<F: Fetcher, S: Storage>(
    fetcher: &F,
    storage: &S,
    images_dir: &Path,
    video_id: &str,
    slug: &str,
) -> Option<String> {
    let bytes = match fetch_thumbnail(fetcher, video_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to download thumbnail for {}: {}", video_id, e);
            return None;
        }
    };

    let filename = thumbnail_filename(slug);
    if let Err(e) = storage.write(&images_dir.join(&filename), &bytes) {
        warn!("Failed to save thumbnail {}: {:#}", filename, e);
        return None;
    }
    info!("Downloaded thumbnail: {}", filename);
    Some(filename)
}

/// Local name for a remote image: its basename, or `<slug>-image.jpg` when the
/// path has none. `None` for anything that is not an http(s) URL.
pub fn image_filename(image_url: &str, slug: &str) -> Option<String> {
    if !image_url.starts_with("http") {
        return None;
    }
    let parsed = url::Url::parse(image_url).ok()?;
    let basename = parsed.path().rsplit('/').next().unwrap_or_default();
    if basename.is_empty() {
        Some(format!("{}-image.jpg", slug))
    } else {
        Some(basename.to_string())
    }
}

pub async fn download_image<F: Fetcher, S: Storage>(
    fetcher: &F,
    storage: &S,
    images_dir: &Path,
    image_url: &str,
    slug: &str,
) -> Option<String> {
    let filename = image_filename(image_url, slug)?;

    let bytes = match fetcher.get_bytes(image_url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to download image {}: {}", image_url, e);
            return None;
        }
    };

    if let Err(e) = storage.write(&images_dir.join(&filename), &bytes) {
        warn!("Failed to save image {}: {:#}", filename, e);
        return None;
    }
    info!("Downloaded image: {}", filename);
    Some(filename)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fake::FakeFetcher;
    use crate::storage::memory::MemStorage;

    #[test]
    fn video_id_shapes() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(video_id("https://youtu.be/abc12345678").as_deref(), Some("abc12345678"));
        assert_eq!(
            video_id("https://www.youtube.com/embed/Zz9_-Yy8Xx7?rel=0").as_deref(),
            Some("Zz9_-Yy8Xx7")
        );
        assert_eq!(video_id("https://www.youtube.com/v/abc12345678").as_deref(), Some("abc12345678"));
    }

    #[test]
    fn unrecognised_urls_have_no_id() {
        assert_eq!(video_id("https://www.youtube.com/channel/UCxyz"), None);
        assert_eq!(video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(video_id("https://vimeo.com/12345678901"), None);
        assert_eq!(video_id(""), None);
    }

    #[test]
    fn image_filenames() {
        assert_eq!(
            image_filename("https://iipmr.com/wp-content/uploads/rack.jpg?ver=2", "s").as_deref(),
            Some("rack.jpg")
        );
        assert_eq!(image_filename("https://iipmr.com/", "my-post").as_deref(), Some("my-post-image.jpg"));
        assert_eq!(image_filename("/relative/a.jpg", "s"), None);
        assert_eq!(image_filename("data:image/png;base64,AAAA", "s"), None);
    }

    #[tokio::test]
    async fn thumbnail_falls_back_on_not_found() {
        let fetcher = FakeFetcher::default()
            .page(&thumbnail_url("abc12345678", ThumbnailQuality::High), b"hq".to_vec());
        let storage = MemStorage::default();

        let name = download_thumbnail(&fetcher, &storage, Path::new("img"), "abc12345678", "talk").await;
        assert_eq!(name.as_deref(), Some("talk-thumbnail.jpg"));
        assert_eq!(storage.text("img/talk-thumbnail.jpg").as_deref(), Some("hq"));
        assert_eq!(fetcher.requests.borrow().len(), 2);
    }

    #[tokio::test]
    async fn thumbnail_prefers_max_resolution() {
        let fetcher = FakeFetcher::default()
            .page(&thumbnail_url("abc12345678", ThumbnailQuality::MaxRes), b"max".to_vec())
            .page(&thumbnail_url("abc12345678", ThumbnailQuality::High), b"hq".to_vec());
        let bytes = fetch_thumbnail(&fetcher, "abc12345678").await.unwrap();
        assert_eq!(bytes, b"max");
        assert_eq!(fetcher.requests.borrow().len(), 1);
    }

    #[tokio::test]
    async fn other_thumbnail_failures_do_not_retry() {
        let fetcher = FakeFetcher::default()
            .fail(&thumbnail_url("abc12345678", ThumbnailQuality::MaxRes), 503)
            .page(&thumbnail_url("abc12345678", ThumbnailQuality::High), b"hq".to_vec());
        let storage = MemStorage::default();

        let name = download_thumbnail(&fetcher, &storage, Path::new("img"), "abc12345678", "talk").await;
        assert_eq!(name, None);
        assert!(storage.files.borrow().is_empty());
        assert_eq!(fetcher.requests.borrow().len(), 1);
    }

    #[tokio::test]
    async fn failed_image_download_is_absent() {
        let fetcher = FakeFetcher::default();
        let storage = MemStorage::default();
        let name = download_image(
            &fetcher,
            &storage,
            Path::new("img"),
            "https://iipmr.com/missing.jpg",
            "p",
        )
        .await;
        assert_eq!(name, None);
        assert!(storage.files.borrow().is_empty());
    }
}
