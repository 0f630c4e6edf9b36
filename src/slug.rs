use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercase, collapse every run of non `[a-z0-9]` characters to one hyphen,
/// trim hyphens from both ends.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug for a text post: title, then the last non-empty URL path segment,
/// then a fixed placeholder.
pub fn post_slug(title: &str, url: &str) -> String {
    let from_title = slugify(title);
    if !from_title.is_empty() {
        return from_title;
    }

    let from_path = last_path_segment(url).map(slugify).unwrap_or_default();
    if !from_path.is_empty() {
        return from_path;
    }

    "post".to_string()
}

/// Slug for a video: title, or `video-<id>` when the title slug is too short.
pub fn video_slug(title: &str, video_id: &str) -> String {
    let slug = slugify(title);
    if slug.len() < 3 {
        format!("video-{}", video_id)
    } else {
        slug
    }
}

fn last_path_segment(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = without_query
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(without_query);
    path.split('/').filter(|s| !s.is_empty()).last()
}
