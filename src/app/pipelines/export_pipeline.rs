use crate::core::collect::DomainCollector;
use crate::core::reconcile::reconcile;
use crate::domain::model::{Domain, FeedDomains, SyncOutcome};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::Result;

/// Writes the computed block list to a file, one domain per line.
pub struct ExportPipeline<S: Storage> {
    pub(crate) collector: DomainCollector,
    pub(crate) storage: S,
    pub(crate) output: String,
}

impl<S: Storage> ExportPipeline<S> {
    pub fn new(collector: DomainCollector, storage: S, output: impl Into<String>) -> Self {
        Self {
            collector,
            storage,
            output: output.into(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for ExportPipeline<S> {
    async fn extract(&self) -> Result<FeedDomains> {
        self.collector.collect().await
    }

    async fn transform(&self, data: FeedDomains) -> Result<Vec<Domain>> {
        Ok(reconcile(data.block, &data.allow))
    }

    async fn load(&self, target: Vec<Domain>) -> Result<SyncOutcome> {
        let mut content = String::with_capacity(target.len() * 16);
        for domain in &target {
            content.push_str(domain.as_str());
            content.push('\n');
        }

        self.storage.write_file(&self.output, content.as_bytes()).await?;
        tracing::info!("💾 Wrote {} domains to {}", target.len(), self.output);

        Ok(SyncOutcome::Exported {
            path: self.output.clone(),
            count: target.len(),
        })
    }
}
