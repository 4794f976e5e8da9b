// Adapters layer: concrete implementations for external systems.

pub mod cloudflare;
pub mod http;
pub mod storage;
