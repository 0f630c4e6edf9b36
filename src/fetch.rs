use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}

/// Single-attempt GET access to remote content.
pub trait Fetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.send(url)
            .await?
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .send(url)
            .await?
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
pub mod fake {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::{FetchError, Fetcher};

    /// Serves canned bodies; anything else is a 404. Records every request.
    #[derive(Default)]
    pub struct FakeFetcher {
        pub pages: HashMap<String, Vec<u8>>,
        pub failing: HashMap<String, u16>,
        pub requests: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.pages.insert(url.to_string(), body.into());
            self
        }

        pub fn fail(mut self, url: &str, status: u16) -> Self {
            self.failing.insert(url.to_string(), status);
            self
        }

        fn respond(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            if let Some(status) = self.failing.get(url) {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                });
            }
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    impl Fetcher for FakeFetcher {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            self.respond(url)
                .map(|b| String::from_utf8_lossy(&b).into_owned())
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.respond(url)
        }
    }
}
