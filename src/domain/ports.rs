use crate::domain::model::{Domain, FeedDomains, RemoteList, RemotePolicy, SyncOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// Name prefix shared by every list resource this tool owns.
    fn list_prefix(&self) -> String;
    fn policy_name(&self) -> String;
    fn chunk_size(&self) -> usize;
    fn collapse_subdomains(&self) -> bool;
}

/// Retrieves a plaintext feed as non-empty lines.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_lines(&self, url: &str) -> Result<Vec<String>>;
}

/// Remote policy engine surface: named list and policy resources.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    async fn list_gateway_lists(&self, name_prefix: &str) -> Result<Vec<RemoteList>>;
    async fn delete_gateway_list(&self, id: &str) -> Result<()>;
    async fn create_gateway_list(&self, name: &str, domains: &[Domain]) -> Result<RemoteList>;
    async fn list_gateway_policies(&self, name_prefix: &str) -> Result<Vec<RemotePolicy>>;
    /// Deletes every policy whose name starts with `name_prefix`, returning how many went.
    async fn delete_gateway_policy(&self, name_prefix: &str) -> Result<usize>;
    async fn create_gateway_policy(&self, name: &str, list_ids: &[String]) -> Result<()>;
    async fn update_gateway_policy(&self, name: &str, id: &str, list_ids: &[String])
        -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<FeedDomains>;
    async fn transform(&self, data: FeedDomains) -> Result<Vec<Domain>>;
    async fn load(&self, target: Vec<Domain>) -> Result<SyncOutcome>;
}
