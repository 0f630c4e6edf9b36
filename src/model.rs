use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One text-post card as it appears on the index page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostSummary {
    pub url: String,
    pub title: String,
    pub featured_image: String,
    pub excerpt: String,
    pub categories: Vec<String>,
}

/// A fully scraped text post. Field order is the on-disk JSON order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub url: String,
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub featured_image_url: String,
    pub featured_image_filename: Option<String>,
    #[serde(default)]
    pub embedded_video_urls: Vec<String>,
}

/// One video card as it appears on the index page. Only built once the
/// video id has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    pub title: String,
    pub slug: String,
    pub video_id: String,
    pub video_url: String,
    pub description: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub video_id: String,
    pub video_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub thumbnail_filename: Option<String>,
}

impl VideoRecord {
    pub fn from_summary(
        summary: VideoSummary,
        date: NaiveDate,
        thumbnail_filename: Option<String>,
    ) -> Self {
        VideoRecord {
            title: summary.title,
            slug: summary.slug,
            date,
            video_id: summary.video_id,
            video_url: summary.video_url,
            description: summary.description,
            categories: summary.categories,
            thumbnail_filename,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_record_json_field_order() {
        let record = VideoRecord {
            title: "Café logistics".into(),
            slug: "caf-logistics".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            video_id: "dQw4w9WgXcQ".into(),
            video_url: "https://youtu.be/dQw4w9WgXcQ".into(),
            description: String::new(),
            categories: vec!["AI".into()],
            thumbnail_filename: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"title":"Café logistics","slug":"caf-logistics","date":"2024-03-09""#));
        assert!(json.ends_with(r#""thumbnail_filename":null}"#));
    }

    #[test]
    fn post_record_tolerates_missing_optional_lists() {
        let json = r#"{
            "url": "https://example.com/blog/a/",
            "title": "A",
            "slug": "a",
            "date": "2023-01-02",
            "content": "",
            "featured_image_filename": null
        }"#;
        let record: PostRecord = serde_json::from_str(json).unwrap();
        assert!(record.categories.is_empty());
        assert!(record.embedded_video_urls.is_empty());
    }
}
