use crate::domain::model::SyncOutcome;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct SyncEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> SyncEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<SyncOutcome> {
        let started = Instant::now();

        tracing::info!("📥 Fetching block and allow feeds...");
        let feeds = self.pipeline.extract().await?;
        tracing::info!(
            "Fetched {} blocked and {} allowed domains",
            feeds.block.len(),
            feeds.allow.len()
        );

        let target = self.pipeline.transform(feeds).await?;
        tracing::info!("Total {} domains", target.len());

        let outcome = self.pipeline.load(target).await?;
        tracing::debug!("Finished in {:?}: {:?}", started.elapsed(), outcome);

        Ok(outcome)
    }
}
