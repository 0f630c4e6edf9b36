pub mod detail;
pub mod listing;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static BACKGROUND_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(["']?([^"')]+)["']?\)"#).unwrap());
static ANY_HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2, h3, h4").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// One way of pulling a value out of some input. Strategies are tried in
/// order and the first `Some` wins.
pub type Strategy<I, T> = fn(&I) -> Option<T>;

pub fn first_match<I: ?Sized, T>(input: &I, strategies: &[Strategy<I, T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(input))
}

/// First selector in `selectors` that matches anything in `doc`.
pub fn first_selected<'a>(doc: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| doc.select(s).next())
}

/// True when any class token of `el` contains `needle`.
pub fn has_class_containing(el: &ElementRef, needle: &str) -> bool {
    el.value().classes().any(|c| c.contains(needle))
}

pub fn has_class_containing_ignore_case(el: &ElementRef, needle: &str) -> bool {
    el.value()
        .classes()
        .any(|c| c.to_lowercase().contains(needle))
}

/// Descendants of `el`, excluding `el` itself, in document order.
pub fn descendant_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.descendants().skip(1).filter_map(ElementRef::wrap)
}

pub fn find_by_class<'a>(el: ElementRef<'a>, needle: &str) -> Option<ElementRef<'a>> {
    descendant_elements(el).find(|d| has_class_containing(d, needle))
}

pub fn find_all_by_class<'a>(el: ElementRef<'a>, needle: &'a str) -> impl Iterator<Item = ElementRef<'a>> {
    descendant_elements(el).filter(move |d| has_class_containing(d, needle))
}

/// All text under `el`, concatenated and trimmed.
pub fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub fn first_heading_text(el: ElementRef) -> Option<String> {
    el.select(&ANY_HEADING).next().map(text_of).filter(|t| !t.is_empty())
}

/// Resolve `href` against `base`. Returns `None` for unparseable targets.
pub fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href.trim()).ok().map(String::from)
}

/// `background-image: url(...)` target from an inline style attribute.
pub fn background_image(style: &str) -> Option<String> {
    if !style.contains("background-image") {
        return None;
    }
    BACKGROUND_URL_RE
        .captures(style)
        .map(|caps| caps[1].trim().to_string())
        .filter(|u| !u.is_empty())
}

/// `src`, or `data-src` for lazy-loaded images.
pub fn img_source(img: ElementRef) -> Option<String> {
    ["src", "data-src"]
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Image for a block: inline background first, then a nested `<img>`.
pub fn block_image(el: ElementRef) -> Option<String> {
    el.value()
        .attr("style")
        .and_then(background_image)
        .or_else(|| el.select(&IMG).next().and_then(img_source))
}

/// Non-empty text labels of the given elements, first occurrence only.
pub fn unique_labels<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for el in elements {
        let text = text_of(el);
        if !text.is_empty() && !labels.contains(&text) {
            labels.push(text);
        }
    }
    labels
}

// ── Tests ──
