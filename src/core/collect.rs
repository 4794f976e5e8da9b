use crate::core::fanout::join_slots;
use crate::core::normalize::{collapse_subdomains, normalize_lines};
use crate::domain::model::{DomainSet, FeedDomains};
use crate::domain::ports::FeedSource;
use crate::utils::error::{Result, SyncError};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Fetches and normalizes the block and allow feeds side by side.
pub struct DomainCollector {
    source: Arc<dyn FeedSource>,
    block_urls: Vec<String>,
    allow_urls: Vec<String>,
    collapse_subdomains: bool,
}

impl DomainCollector {
    pub fn new(
        source: Arc<dyn FeedSource>,
        block_urls: Vec<String>,
        allow_urls: Vec<String>,
        collapse_subdomains: bool,
    ) -> Self {
        Self {
            source,
            block_urls,
            allow_urls,
            collapse_subdomains,
        }
    }

    /// Both feeds run as independent tasks. Either one failing is fatal.
    pub async fn collect(&self) -> Result<FeedDomains> {
        let block = tokio::spawn(collect_feed(
            Arc::clone(&self.source),
            "block",
            self.block_urls.clone(),
            self.collapse_subdomains,
        ));
        let allow = tokio::spawn(collect_feed(
            Arc::clone(&self.source),
            "allow",
            self.allow_urls.clone(),
            false,
        ));

        let (block, allow) = tokio::try_join!(flatten(block), flatten(allow))?;
        Ok(FeedDomains { block, allow })
    }
}

async fn flatten(handle: tokio::task::JoinHandle<Result<DomainSet>>) -> Result<DomainSet> {
    handle.await.map_err(|e| SyncError::TaskError {
        message: e.to_string(),
    })?
}

async fn collect_feed(
    source: Arc<dyn FeedSource>,
    feed: &'static str,
    urls: Vec<String>,
    collapse: bool,
) -> Result<DomainSet> {
    let lines = fetch_all(source, feed, &urls).await?;
    let mut domains = normalize_lines(&lines);
    if collapse {
        domains = collapse_subdomains(domains);
    }
    tracing::info!("Number of domains in {} feed: {}", feed, domains.len());
    Ok(domains)
}

/// Downloads every URL of one feed and concatenates the lines in URL order.
async fn fetch_all(
    source: Arc<dyn FeedSource>,
    feed: &str,
    urls: &[String],
) -> Result<Vec<String>> {
    let mut tasks = JoinSet::new();
    for (slot, url) in urls.iter().enumerate() {
        let source = Arc::clone(&source);
        let url = url.clone();
        tasks.spawn(async move { (slot, source.fetch_lines(&url).await) });
    }

    let per_url = join_slots(&format!("fetch {} feed", feed), tasks, urls.len()).await?;
    Ok(per_url.into_iter().flatten().collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned feeds keyed by URL; unknown URLs fail like a 404.
    pub(crate) struct StaticFeeds {
        feeds: HashMap<String, Vec<String>>,
    }

    impl StaticFeeds {
        /// `feeds` pairs a URL with its newline-separated body.
        pub fn new(feeds: &[(&str, &str)]) -> Self {
            Self {
                feeds: feeds
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.lines().map(str::to_string).collect()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl FeedSource for StaticFeeds {
        async fn fetch_lines(&self, url: &str) -> Result<Vec<String>> {
            self.feeds
                .get(url)
                .cloned()
                .ok_or_else(|| SyncError::fetch(url, "unexpected status 404 Not Found"))
        }
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_collect_merges_urls_per_feed() {
        let source = Arc::new(StaticFeeds::new(&[
            ("block-1", "a.com\nb.com"),
            ("block-2", "0.0.0.0 a.com\nc.com"),
            ("allow-1", "b.com"),
        ]));
        let collector =
            DomainCollector::new(source, urls(&["block-1", "block-2"]), urls(&["allow-1"]), false);

        let feeds = collector.collect().await.unwrap();

        assert_eq!(feeds.block.len(), 3);
        assert_eq!(feeds.allow.len(), 1);
        assert!(feeds.allow.contains_str("b.com"));
    }

    #[tokio::test]
    async fn test_collect_fails_when_any_feed_is_unreachable() {
        let source = Arc::new(StaticFeeds::new(&[("block-1", "a.com")]));
        let collector =
            DomainCollector::new(source, urls(&["block-1"]), urls(&["allow-missing"]), false);

        let result = collector.collect().await;

        assert!(matches!(result, Err(SyncError::FetchError { .. })));
    }

    #[tokio::test]
    async fn test_collapse_applies_to_block_feed_only() {
        let source = Arc::new(StaticFeeds::new(&[
            ("block", "example.com\nads.example.com"),
            ("allow", "example.org\nwww.example.org"),
        ]));
        let collector = DomainCollector::new(source, urls(&["block"]), urls(&["allow"]), true);

        let feeds = collector.collect().await.unwrap();

        assert_eq!(feeds.block.len(), 1);
        assert_eq!(feeds.allow.len(), 2);
    }
}
