use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::extract::listing::{card_links, containers, CTA};
use crate::extract::{resolve, text_of};
use crate::media::is_video_url;

static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

#[derive(Debug, Default)]
pub struct LinkCensus {
    pub total: usize,
    pub video: Vec<(String, String)>,
    pub blog: Vec<(String, String)>,
    pub other: Vec<(String, String)>,
    pub cta_sections: usize,
    pub first_cta_links: Vec<(String, String)>,
}

/// Classify every link on the index page as video, same-site blog, or other.
/// Entries are `(text, absolute url)`.
pub fn census(html: &str, base: &Url) -> LinkCensus {
    let doc = Html::parse_document(html);
    let mut out = LinkCensus::default();

    for a in doc.select(&LINK) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        out.total += 1;
        let full = resolve(base, href).unwrap_or_else(|| href.to_string());
        let entry = (text_of(a), full.clone());

        if is_video_url(href) {
            out.video.push(entry);
        } else if href.contains("/blog/") || same_host(base, &full) {
            out.blog.push(entry);
        } else {
            out.other.push(entry);
        }
    }

    let cards = containers(&doc, &CTA);
    out.cta_sections = cards.len();
    out.first_cta_links = cards.first().map(|c| card_links(*c)).unwrap_or_default();
    out
}

fn same_host(base: &Url, url: &str) -> bool {
    match (base.host_str(), Url::parse(url).ok()) {
        (Some(host), Some(u)) => u.host_str() == Some(host),
        _ => false,
    }
}
