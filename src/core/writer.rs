//! Policy replacement protocol: delete policy, delete stale lists, create
//! chunked lists, then create or update the single policy.
//!
//! Concurrent phases spawn one task per unit of work and wait for all of them.
//! A failing task never cancels its siblings; once the phase has drained, the
//! first error fails the run.

use crate::core::fanout::join_slots;
use crate::core::reconcile::{chunk_domains, list_name};
use crate::domain::model::{Domain, PolicyAction, RemoteList, SyncOutcome};
use crate::domain::ports::GatewayApi;
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::task::JoinSet;

pub struct RemoteWriter {
    gateway: Arc<dyn GatewayApi>,
    list_prefix: String,
    policy_name: String,
    chunk_size: usize,
}

impl RemoteWriter {
    pub fn new(
        gateway: Arc<dyn GatewayApi>,
        list_prefix: impl Into<String>,
        policy_name: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            gateway,
            list_prefix: list_prefix.into(),
            policy_name: policy_name.into(),
            chunk_size,
        }
    }

    /// Replaces all remote state with `target`. `stale` are the lists read
    /// before the change check.
    pub async fn replace(&self, target: &[Domain], stale: &[RemoteList]) -> Result<SyncOutcome> {
        let deleted_policies = self.delete_policy().await?;
        let deleted_lists = self.delete_lists(stale).await?;
        let created = self.create_lists(target).await?;
        let list_ids: Vec<String> = created.iter().map(|list| list.id.clone()).collect();
        let policy = self.upsert_policy(&list_ids).await?;

        tracing::info!("✅ Done!");
        Ok(SyncOutcome::Synced {
            deleted_policies,
            deleted_lists,
            created_lists: created.len(),
            policy,
        })
    }

    /// Removes the policy and every owned list without creating anything.
    pub async fn teardown(&self) -> Result<SyncOutcome> {
        let deleted_policies = self.delete_policy().await?;
        let lists = self.gateway.list_gateway_lists(&self.list_prefix).await?;
        let deleted_lists = self.delete_lists(&lists).await?;

        tracing::info!("✅ Deletion completed");
        Ok(SyncOutcome::TornDown {
            deleted_policies,
            deleted_lists,
        })
    }

    pub async fn delete_policy(&self) -> Result<usize> {
        let deleted = self.gateway.delete_gateway_policy(&self.policy_name).await?;
        tracing::info!("🗑️ Deleted {} gateway policies", deleted);
        Ok(deleted)
    }

    pub async fn delete_lists(&self, lists: &[RemoteList]) -> Result<usize> {
        let mut tasks = JoinSet::new();
        for (slot, list) in lists.iter().enumerate() {
            tracing::info!("🗑️ Deleting list {} - ID: {}", list.name, list.id);
            let gateway = Arc::clone(&self.gateway);
            let id = list.id.clone();
            tasks.spawn(async move { (slot, gateway.delete_gateway_list(&id).await) });
        }

        let deleted = join_slots("delete lists", tasks, lists.len()).await?;
        Ok(deleted.len())
    }

    /// Creates one list per chunk. The result keeps chunk order regardless of
    /// which request finishes first.
    pub async fn create_lists(&self, target: &[Domain]) -> Result<Vec<RemoteList>> {
        let chunks = chunk_domains(target, self.chunk_size);
        let mut tasks = JoinSet::new();
        for (slot, chunk) in chunks.iter().enumerate() {
            let name = list_name(&self.list_prefix, slot + 1);
            tracing::info!("📝 Creating list {}", name);
            let gateway = Arc::clone(&self.gateway);
            let domains = chunk.to_vec();
            tasks.spawn(async move { (slot, gateway.create_gateway_list(&name, &domains).await) });
        }

        join_slots("create lists", tasks, chunks.len()).await
    }

    pub async fn upsert_policy(&self, list_ids: &[String]) -> Result<PolicyAction> {
        if list_ids.is_empty() {
            tracing::warn!("⚠️ No domains to block, not creating a firewall policy");
            return Ok(PolicyAction::SkippedEmpty);
        }

        let policies = self.gateway.list_gateway_policies(&self.policy_name).await?;
        tracing::info!("Number of policies in gateway: {}", policies.len());

        match policies.as_slice() {
            [] => {
                tracing::info!("🛡️ Creating firewall policy");
                self.gateway
                    .create_gateway_policy(&self.policy_name, list_ids)
                    .await?;
                Ok(PolicyAction::Created)
            }
            [existing] => {
                tracing::info!("🛡️ Updating firewall policy");
                self.gateway
                    .update_gateway_policy(&self.policy_name, &existing.id, list_ids)
                    .await?;
                Ok(PolicyAction::Updated)
            }
            many => {
                tracing::error!(
                    "❌ More than one firewall policy found ({}), leaving policy untouched",
                    many.len()
                );
                Ok(PolicyAction::Anomaly {
                    matching: many.len(),
                })
            }
        }
    }
}
