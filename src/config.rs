use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;

pub const DEFAULT_BLOG_URL: &str = "https://iipmr.com/blog/";
const DEFAULT_OUTPUT_DIR: &str = "wordpress-scraped";
const DEFAULT_CONTENT_DIR: &str = "content/posts";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub blog_url: String,
    pub output_dir: PathBuf,
    pub content_dir: PathBuf,
    pub timeout_secs: u64,
    pub request_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            blog_url: DEFAULT_BLOG_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
        }
    }
}

impl Settings {
    /// Defaults overlaid with `MIGRATE_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(config::Environment::with_prefix("MIGRATE"))
    }

    fn load_from(env: config::Environment) -> Result<Self> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("blog_url", defaults.blog_url)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("content_dir", DEFAULT_CONTENT_DIR)?
            .set_default("timeout_secs", defaults.timeout_secs)?
            .set_default("request_delay_ms", defaults.request_delay_ms)?
            .add_source(env)
            .build()
            .context("Failed to read MIGRATE_* settings")?
            .try_deserialize()
            .context("Invalid MIGRATE_* settings")
    }

    /// Apply CLI flags on top of whatever `load` produced.
    pub fn with_overrides(
        mut self,
        blog_url: Option<String>,
        output_dir: Option<PathBuf>,
        content_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(url) = blog_url {
            self.blog_url = url;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(dir) = content_dir {
            self.content_dir = dir;
        }
        self
    }

    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }

    pub fn posts_file(&self) -> PathBuf {
        self.output_dir.join("posts.json")
    }

    pub fn videos_file(&self) -> PathBuf {
        self.output_dir.join("videos.json")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
