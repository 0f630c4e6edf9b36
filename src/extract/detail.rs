use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use super::{
    first_match, first_selected, has_class_containing_ignore_case, img_source, resolve, text_of,
    unique_labels, Strategy,
};
use crate::media::is_video_url;
use crate::model::PostSummary;
use crate::slug::post_slug;

/// Main-content candidates, most specific first.
pub const CONTENT_SELECTORS: &[&str] = &[
    "article .entry-content",
    "article .post-content",
    ".post-content",
    ".entry-content",
    "article",
    ".content",
];

/// Calendar formats tried after RFC 3339, in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%d %B %Y", "%m/%d/%Y"];

static CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static TITLE_HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2").unwrap());
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static DATE_CANDIDATE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time, span").unwrap());
static CATEGORY_CANDIDATE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a, span").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static IFRAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("iframe[src]").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Everything a post page contributes, before any image is downloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub content: String,
    pub categories: Vec<String>,
    pub featured_image: String,
    pub content_images: Vec<String>,
    pub video_urls: Vec<String>,
}

pub fn extract_detail(
    html: &str,
    post_url: &Url,
    summary: &PostSummary,
    captured: NaiveDate,
) -> PostDetail {
    let doc = Html::parse_document(html);

    let content_el = first_selected(&doc, &CONTENT);
    let content = match content_el {
        Some(el) => el.html(),
        None => {
            warn!("Could not find content for {}", post_url);
            String::new()
        }
    };

    let title = if summary.title.is_empty() {
        let strategies: [Strategy<Html, String>; 2] = [titled_heading, first_h1];
        first_match(&doc, &strategies).unwrap_or_default()
    } else {
        summary.title.clone()
    };

    let date = page_date(&doc).unwrap_or(captured);

    let categories = if summary.categories.is_empty() {
        page_categories(&doc)
    } else {
        summary.categories.clone()
    };

    let featured_image = if summary.featured_image.is_empty() {
        doc.select(&IMG)
            .find(|img| has_class_containing_ignore_case(img, "featured"))
            .or_else(|| content_el.and_then(|el| el.select(&IMG).next()))
            .and_then(img_source)
            .and_then(|src| resolve(post_url, &src))
            .unwrap_or_default()
    } else {
        summary.featured_image.clone()
    };

    let content_images = content_el
        .map(|el| {
            el.select(&IMG)
                .filter_map(img_source)
                .filter_map(|src| resolve(post_url, &src))
                .collect()
        })
        .unwrap_or_default();

    PostDetail {
        slug: post_slug(&title, post_url.as_str()),
        title,
        date,
        content,
        categories,
        featured_image,
        content_images,
        video_urls: embedded_video_urls(&doc),
    }
}

fn titled_heading(doc: &Html) -> Option<String> {
    doc.select(&TITLE_HEADING)
        .find(|h| has_class_containing_ignore_case(h, "title"))
        .map(text_of)
        .filter(|t| !t.is_empty())
}

fn first_h1(doc: &Html) -> Option<String> {
    doc.select(&H1).next().map(text_of).filter(|t| !t.is_empty())
}

/// Date from the first `time`/`span` whose class mentions a date or time.
fn page_date(doc: &Html) -> Option<NaiveDate> {
    let el = doc.select(&DATE_CANDIDATE).find(|el| {
        has_class_containing_ignore_case(el, "date") || has_class_containing_ignore_case(el, "time")
    })?;
    let raw = el
        .value()
        .attr("datetime")
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| text_of(el));
    parse_date(&raw)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn page_categories(doc: &Html) -> Vec<String> {
    let candidates = doc.select(&CATEGORY_CANDIDATE).filter(|el: &ElementRef| {
        has_class_containing_ignore_case(el, "categor") || has_class_containing_ignore_case(el, "tag")
    });
    unique_labels(candidates)
}

/// Video-platform iframes first, then anchors, in document order.
fn embedded_video_urls(doc: &Html) -> Vec<String> {
    let iframes = doc
        .select(&IFRAME)
        .filter_map(|el| el.value().attr("src"))
        .filter(|src| src.contains("youtube.com"));
    let anchors = doc
        .select(&LINK)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| is_video_url(href));
    iframes.chain(anchors).map(str::to_string).collect()
}

// ── Tests ──
