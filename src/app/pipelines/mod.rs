pub mod export_pipeline;
pub mod gateway_pipeline;

pub use export_pipeline::ExportPipeline;
pub use gateway_pipeline::GatewayPipeline;
