use crate::domain::ports::FeedSource;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Downloads plaintext feeds over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("adblock-gateway-sync/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_lines(&self, url: &str) -> Result<Vec<String>> {
        tracing::debug!("Downloading feed: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::fetch(url, format!("unexpected status {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| SyncError::fetch(url, e.to_string()))?;
        tracing::info!("📥 Downloaded file from {}. File size: {}", url, text.len());

        Ok(text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_lines_drops_blank_lines() {
        let server = MockServer::start();
        let feed_mock = server.mock(|when, then| {
            when.method(GET).path("/hosts.txt");
            then.status(200).body("# header\n\n0.0.0.0 ads.example.com\r\n   \ntracker.net\n");
        });

        let source = HttpFeedSource::new(Duration::from_secs(5)).unwrap();
        let lines = source.fetch_lines(&server.url("/hosts.txt")).await.unwrap();

        feed_mock.assert();
        assert_eq!(lines, vec!["# header", "0.0.0.0 ads.example.com", "tracker.net"]);
    }

    #[tokio::test]
    async fn test_fetch_lines_fails_on_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.txt");
            then.status(404);
        });

        let source = HttpFeedSource::new(Duration::from_secs(5)).unwrap();
        let result = source.fetch_lines(&server.url("/missing.txt")).await;

        match result {
            Err(SyncError::FetchError { url, message }) => {
                assert!(url.ends_with("/missing.txt"));
                assert!(message.contains("404"));
            }
            other => panic!("expected FetchError, got {:?}", other),
        }
    }
}
