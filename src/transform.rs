use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::media::video_id;
use crate::model::{PostRecord, VideoRecord};
use crate::slug::slugify;
use crate::storage::{copy_if_exists, Storage};

/// Known category labels and the tag each one becomes.
pub const TAG_TABLE: &[(&str, &str)] = &[
    ("Supply Chain", "supply-chain"),
    ("Logistics", "logistics"),
    ("Artificial Intelligence", "artificial-intelligence"),
    ("AI", "artificial-intelligence"),
    ("Market Research", "market-research"),
    ("Warehousing", "warehousing"),
    ("Gaming", "gaming"),
    ("News", "news"),
    ("Industry Updates", "industry-updates"),
    ("Sustainability", "sustainability"),
    ("Automation", "automation"),
    ("Digital Transformation", "digital-transformation"),
];

pub const VIDEO_TAG: &str = "video";
pub const ARTICLE_TAG: &str = "blog";

const INDEX_FILE: &str = "index.md";

/// Exact table hit, then case-insensitive table hit, then the slugified label.
pub fn resolve_tag(category: &str) -> String {
    exact_tag(category)
        .or_else(|| case_insensitive_tag(category))
        .map(str::to_string)
        .unwrap_or_else(|| slugify(category))
}

fn exact_tag(category: &str) -> Option<&'static str> {
    TAG_TABLE
        .iter()
        .find(|(label, _)| *label == category)
        .map(|(_, tag)| *tag)
}

fn case_insensitive_tag(category: &str) -> Option<&'static str> {
    let lower = category.to_lowercase();
    TAG_TABLE
        .iter()
        .find(|(label, _)| label.to_lowercase() == lower)
        .map(|(_, tag)| *tag)
}

/// Resolved, de-duplicated tags in first-seen order, always ending up with
/// `sentinel` somewhere in the list.
pub fn tags_for(categories: &[String], sentinel: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for category in categories {
        let tag = resolve_tag(category);
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if !tags.iter().any(|t| t == sentinel) {
        tags.push(sentinel.to_string());
    }
    tags
}

pub fn embed_directive(video_id: &str) -> String {
    format!("{{{{< youtube {} >}}}}", video_id)
}

enum Value {
    Text(String),
    List(Vec<String>),
}

/// Ordered `---`-delimited key/value preamble.
#[derive(Default)]
pub struct FrontMatter {
    fields: Vec<(&'static str, Value)>,
}

impl FrontMatter {
    pub fn text(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, Value::Text(value.into())));
        self
    }

    pub fn text_if(self, key: &'static str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.text(key, v),
            None => self,
        }
    }

    pub fn list(mut self, key: &'static str, values: Vec<String>) -> Self {
        self.fields.push((key, Value::List(values)));
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.fields {
            match value {
                Value::Text(v) => out.push_str(&format!("{}: {}\n", key, quote(v))),
                Value::List(items) => {
                    let joined = items.iter().map(|i| quote(i)).collect::<Vec<_>>().join(", ");
                    out.push_str(&format!("{}: [{}]\n", key, joined));
                }
            }
        }
        out.push_str("---\n\n");
        out
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A record that becomes one output directory.
pub trait Publish {
    fn slug(&self) -> &str;
    /// Local image the page wants next to it, if any.
    fn image(&self) -> Option<&str>;
    /// Full `index.md`. `image` is `Some` only when the file was copied.
    fn render(&self, image: Option<&str>) -> String;
}

impl Publish for VideoRecord {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn image(&self) -> Option<&str> {
        self.thumbnail_filename.as_deref()
    }

    fn render(&self, image: Option<&str>) -> String {
        let front = FrontMatter::default()
            .text("title", &self.title)
            .text("date", self.date.format("%Y-%m-%d").to_string())
            .list("tags", tags_for(&self.categories, VIDEO_TAG))
            .text_if("image", image)
            .text_if("description", Some(self.description.as_str()));

        let mut lines: Vec<String> = Vec::new();
        if !self.description.is_empty() {
            lines.push(self.description.clone());
            lines.push(String::new());
            lines.push("---".to_string());
            lines.push(String::new());
        }
        lines.push(embed_directive(&self.video_id));

        front.render() + &lines.join("\n")
    }
}

impl Publish for PostRecord {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn image(&self) -> Option<&str> {
        self.featured_image_filename.as_deref()
    }

    fn render(&self, image: Option<&str>) -> String {
        let front = FrontMatter::default()
            .text("title", &self.title)
            .text("date", self.date.format("%Y-%m-%d").to_string())
            .list("tags", tags_for(&self.categories, ARTICLE_TAG))
            .text_if("image", image)
            .text_if("description", Some(self.excerpt.as_str()));

        let mut ids: Vec<String> = Vec::new();
        for id in self.embedded_video_urls.iter().filter_map(|u| video_id(u)) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut parts: Vec<String> = Vec::new();
        let content = self.content.trim();
        if !content.is_empty() {
            parts.push(content.to_string());
        }
        parts.extend(ids.iter().map(|id| embed_directive(id)));

        front.render() + &parts.join("\n\n")
    }
}

/// Write `<content_dir>/<slug>/index.md` for every record, copying its image
/// from `images_dir` when present. Returns the number of pages written.
pub fn transform_all<S: Storage, R: Publish>(
    storage: &S,
    records: &[R],
    images_dir: &Path,
    content_dir: &Path,
) -> Result<usize> {
    let mut written = 0;

    for (i, record) in records.iter().enumerate() {
        let slug = record.slug();
        if slug.is_empty() {
            warn!("Record {} has no slug, skipped", i + 1);
            continue;
        }
        let dir = content_dir.join(slug);

        let image = match record.image().filter(|name| !name.is_empty()) {
            Some(name) if copy_if_exists(storage, &images_dir.join(name), &dir.join(name))? => {
                info!("Copied image: {}", name);
                Some(name)
            }
            _ => None,
        };

        let page = dir.join(INDEX_FILE);
        let rendered = record.render(image);
        if replaces_other_page(storage, &page, &rendered) {
            warn!("Overwriting {} with different content (slug collision?)", page.display());
        }
        storage.write(&page, rendered.as_bytes())?;
        info!("[{}/{}] Created {}", i + 1, records.len(), page.display());
        written += 1;
    }

    Ok(written)
}

/// True when `page` already holds something other than `rendered`.
fn replaces_other_page<S: Storage>(storage: &S, page: &Path, rendered: &str) -> bool {
    storage.exists(page)
        && storage
            .read(page)
            .map(|existing| existing != rendered.as_bytes())
            .unwrap_or(true)
}

// ── Tests ──
