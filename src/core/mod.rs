pub mod collect;
pub mod engine;
pub(crate) mod fanout;
pub mod normalize;
pub mod reconcile;
pub mod writer;

pub use crate::domain::model::{Domain, DomainSet, FeedDomains, SyncOutcome};
pub use crate::domain::ports::{ConfigProvider, FeedSource, GatewayApi, Pipeline, Storage};
pub use crate::utils::error::Result;
