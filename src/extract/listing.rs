use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use super::{
    block_image, descendant_elements, find_all_by_class, find_by_class, first_heading_text,
    has_class_containing, resolve, text_of, unique_labels,
};
use crate::media::{is_video_url, video_id};
use crate::model::{PostSummary, VideoSummary};
use crate::slug::video_slug;

static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

const BADGE_CLASS: &str = "pagelayer-badge";
const PLACEHOLDER_TITLE: &str = "click here";

/// Class-name fragments identifying one card shape on the index page.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub name: &'static str,
    pub container: &'static str,
    pub heading: &'static str,
    pub image: &'static str,
    pub description: &'static str,
}

pub const CTA: Layout = Layout {
    name: "call-to-action",
    container: "pagelayer-cta",
    heading: "pagelayer-cta-heading",
    image: "pagelayer-cta-image",
    description: "pagelayer-cta-subheading",
};

pub const SERVICE: Layout = Layout {
    name: "service",
    container: "pagelayer-service",
    heading: "pagelayer-service-heading",
    image: "pagelayer-service-image",
    description: "pagelayer-service-details",
};

/// Scan order. Cards from later layouts are dropped when an earlier card
/// already produced the same key.
pub const LAYOUTS: [Layout; 2] = [CTA, SERVICE];

/// Which link inside a card counts as the card's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRule {
    /// The heading link (or the first link); the card is skipped when that
    /// link points at a video platform.
    ExcludeVideo,
    /// The first link that points at a video platform; cards without one
    /// are skipped.
    RequireVideo,
}

/// Outermost `div`s carrying the layout's container class, in document order.
/// Nested parts of a card (`...-heading`, `...-image`) share the class prefix
/// and are folded into their enclosing card.
pub fn containers<'a>(doc: &'a Html, layout: &Layout) -> Vec<ElementRef<'a>> {
    doc.select(&DIV)
        .filter(|el| has_class_containing(el, layout.container))
        .filter(|el| {
            !el.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| a.value().name() == "div" && has_class_containing(&a, layout.container))
        })
        .collect()
}

fn card_link<'a>(card: ElementRef<'a>, layout: &Layout, rule: LinkRule) -> Option<ElementRef<'a>> {
    match rule {
        LinkRule::ExcludeVideo => {
            let link = find_by_class(card, layout.heading)
                .and_then(|h| h.select(&LINK).next())
                .or_else(|| card.select(&LINK).next())?;
            let href = link.value().attr("href").unwrap_or_default();
            if is_video_url(href) {
                debug!("Skipping video card link {}", href);
                return None;
            }
            Some(link)
        }
        LinkRule::RequireVideo => card
            .select(&LINK)
            .find(|a| a.value().attr("href").is_some_and(is_video_url)),
    }
}

fn usable_title(text: String) -> Option<String> {
    if text.is_empty() || text.eq_ignore_ascii_case(PLACEHOLDER_TITLE) {
        None
    } else {
        Some(text)
    }
}

fn card_description(card: ElementRef, layout: &Layout) -> String {
    find_by_class(card, layout.description)
        .map(text_of)
        .unwrap_or_default()
}

fn card_categories(card: ElementRef) -> Vec<String> {
    unique_labels(find_all_by_class(card, BADGE_CLASS))
}

fn post_card(card: ElementRef, layout: &Layout, base: &Url) -> Option<PostSummary> {
    let link = card_link(card, layout, LinkRule::ExcludeVideo)?;
    let url = resolve(base, link.value().attr("href")?)?;

    let title = Some(text_of(link))
        .filter(|t| !t.is_empty())
        .or_else(|| first_heading_text(card))
        .unwrap_or_default();

    let featured_image = find_by_class(card, layout.image)
        .and_then(block_image)
        .and_then(|src| resolve(base, &src))
        .unwrap_or_default();

    Some(PostSummary {
        url,
        title,
        featured_image,
        excerpt: card_description(card, layout),
        categories: card_categories(card),
    })
}

fn video_card(card: ElementRef, layout: &Layout) -> Option<VideoSummary> {
    let link = card_link(card, layout, LinkRule::RequireVideo)?;
    let video_url = link.value().attr("href")?.trim().to_string();
    let Some(id) = video_id(&video_url) else {
        warn!("Could not extract video ID from {}", video_url);
        return None;
    };

    let title = usable_title(text_of(link))
        .or_else(|| find_by_class(card, layout.heading).map(text_of).and_then(usable_title))
        .or_else(|| first_heading_text(card).and_then(usable_title))
        .unwrap_or_else(|| format!("Video {}", id));

    Some(VideoSummary {
        slug: video_slug(&title, &id),
        title,
        video_id: id,
        video_url,
        description: card_description(card, layout),
        categories: card_categories(card),
    })
}

/// Text-post cards from the index page, in document order.
pub fn extract_posts(html: &str, base: &Url) -> Vec<PostSummary> {
    let doc = Html::parse_document(html);
    let mut posts: Vec<PostSummary> = Vec::new();

    for (pass, layout) in LAYOUTS.iter().enumerate() {
        let cards = containers(&doc, layout);
        info!("Found {} {} sections", cards.len(), layout.name);

        for card in cards {
            let Some(post) = post_card(card, layout, base) else {
                continue;
            };
            if pass > 0 && posts.iter().any(|p| p.url == post.url) {
                continue;
            }
            debug!("Post card: {} ({})", post.title, post.url);
            posts.push(post);
        }
    }

    info!("Found {} posts on blog listing page", posts.len());
    posts
}

/// Video cards from the index page, at most one per video id.
pub fn extract_videos(html: &str) -> Vec<VideoSummary> {
    let doc = Html::parse_document(html);
    let mut videos: Vec<VideoSummary> = Vec::new();

    for layout in &LAYOUTS {
        let cards = containers(&doc, layout);
        info!("Found {} {} sections", cards.len(), layout.name);

        for card in cards {
            let Some(video) = video_card(card, layout) else {
                continue;
            };
            if videos.iter().any(|v| v.video_id == video.video_id) {
                debug!("Duplicate video {} skipped", video.video_id);
                continue;
            }
            debug!("Video card: {} ({})", video.title, video.video_id);
            videos.push(video);
        }
    }

    info!("Found {} video posts on blog listing page", videos.len());
    videos
}

/// Hyperlinks inside a card as `(text, href)` pairs.
pub fn card_links(card: ElementRef) -> Vec<(String, String)> {
    descendant_elements(card)
        .filter(|el| el.value().name() == "a")
        .filter_map(|a| Some((text_of(a), a.value().attr("href")?.to_string())))
        .collect()
}

// ── Tests ──
