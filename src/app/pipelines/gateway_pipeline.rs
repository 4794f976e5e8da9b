use crate::core::collect::DomainCollector;
use crate::core::reconcile::{chunk_count, reconcile, remote_entry_count, should_skip};
use crate::core::writer::RemoteWriter;
use crate::domain::model::{Domain, FeedDomains, SyncOutcome};
use crate::domain::ports::{ConfigProvider, GatewayApi, Pipeline};
use crate::utils::error::Result;
use std::sync::Arc;

/// Feeds in, gateway lists and policy out.
pub struct GatewayPipeline<C: ConfigProvider> {
    pub(crate) collector: DomainCollector,
    pub(crate) gateway: Arc<dyn GatewayApi>,
    pub(crate) config: C,
    pub(crate) dry_run: bool,
}

impl<C: ConfigProvider> GatewayPipeline<C> {
    pub fn new(collector: DomainCollector, gateway: Arc<dyn GatewayApi>, config: C) -> Self {
        Self {
            collector,
            gateway,
            config,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn writer(&self) -> RemoteWriter {
        RemoteWriter::new(
            Arc::clone(&self.gateway),
            self.config.list_prefix(),
            self.config.policy_name(),
            self.config.chunk_size(),
        )
    }
}

#[async_trait::async_trait]
impl<C: ConfigProvider> Pipeline for GatewayPipeline<C> {
    async fn extract(&self) -> Result<FeedDomains> {
        self.collector.collect().await
    }

    async fn transform(&self, data: FeedDomains) -> Result<Vec<Domain>> {
        let target = reconcile(data.block, &data.allow);
        tracing::info!("Number of domains after filtering: {}", target.len());
        Ok(target)
    }

    async fn load(&self, target: Vec<Domain>) -> Result<SyncOutcome> {
        let prefix = self.config.list_prefix();
        let remote_lists = self.gateway.list_gateway_lists(&prefix).await?;
        let remote_count = remote_entry_count(&remote_lists);

        if should_skip(&target, &remote_lists) {
            tracing::warn!(
                "⏭️ Lists are the same size ({} entries), skipping. Content is not compared.",
                remote_count
            );
            return Ok(SyncOutcome::Skipped { remote_count });
        }

        if self.dry_run {
            let new_lists = chunk_count(target.len(), self.config.chunk_size());
            tracing::info!(
                "🔍 DRY RUN - would replace {} lists ({} entries) with {} lists ({} entries)",
                remote_lists.len(),
                remote_count,
                new_lists,
                target.len()
            );
            return Ok(SyncOutcome::Planned {
                target_count: target.len(),
                remote_count,
                stale_lists: remote_lists.len(),
                new_lists,
            });
        }

        self.writer().replace(&target, &remote_lists).await
    }
}
