pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, Command};

pub use adapters::{cloudflare::CloudflareClient, http::HttpFeedSource, storage::LocalStorage};
pub use app::pipelines::{ExportPipeline, GatewayPipeline};
pub use config::{Credentials, SyncConfig};
pub use crate::core::{collect::DomainCollector, engine::SyncEngine};
pub use domain::model::{Domain, PolicyAction, RemoteList, RemotePolicy, SyncOutcome};
pub use utils::error::{Result, SyncError};
