use adblock_gateway_sync::core::writer::RemoteWriter;
use adblock_gateway_sync::domain::ports::{ConfigProvider, GatewayApi};
use adblock_gateway_sync::utils::{logger, validation::Validate};
use adblock_gateway_sync::{
    Cli, CloudflareClient, Command, Credentials, DomainCollector, ExportPipeline, GatewayPipeline,
    HttpFeedSource, LocalStorage, PolicyAction, Result, SyncConfig, SyncEngine, SyncOutcome,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = SyncConfig::load(cli.config.as_deref());

    // 初始化日誌
    let (json_logs, level) = match &config {
        Ok(config) => (cli.log_json || config.wants_json_logs(), config.logging.level.clone()),
        Err(_) => (cli.log_json, None),
    };
    if json_logs {
        logger::init_json_logger(cli.verbose, level.as_deref());
    } else {
        logger::init_cli_logger(cli.verbose, level.as_deref());
    }

    tracing::info!("🚀 Starting adblock-gateway-sync");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    let result = match config {
        Ok(config) => run(&cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => report(&outcome),
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: &Cli, config: SyncConfig) -> Result<SyncOutcome> {
    config.validate()?;
    let timeout = Duration::from_secs(config.gateway.timeout_seconds);
    let storage = LocalStorage::new(".");

    match cli.resolved_command() {
        Command::Sync { dry_run } => {
            // 任何遠端呼叫之前先檢查憑證
            let gateway = gateway_client(&config, timeout)?;
            let collector = feed_collector(&config, &storage, timeout).await?;
            let pipeline = GatewayPipeline::new(collector, gateway, config).with_dry_run(dry_run);
            SyncEngine::new(pipeline).run().await
        }
        Command::Delete => {
            let gateway = gateway_client(&config, timeout)?;
            RemoteWriter::new(
                gateway,
                config.list_prefix(),
                config.policy_name(),
                config.chunk_size(),
            )
            .teardown()
            .await
        }
        Command::Export { output } => {
            let collector = feed_collector(&config, &storage, timeout).await?;
            SyncEngine::new(ExportPipeline::new(collector, storage, output))
                .run()
                .await
        }
    }
}

fn gateway_client(config: &SyncConfig, timeout: Duration) -> Result<Arc<dyn GatewayApi>> {
    let credentials = Credentials::from_env()?;
    let client: Arc<dyn GatewayApi> = Arc::new(
        CloudflareClient::builder(credentials.api_token, credentials.account_id)
            .base_url(config.gateway.api_base_url.clone())
            .timeout(timeout)
            .build()?,
    );
    Ok(client)
}

async fn feed_collector(
    config: &SyncConfig,
    storage: &LocalStorage,
    timeout: Duration,
) -> Result<DomainCollector> {
    let feeds = config.resolve_feeds(storage).await?;
    tracing::info!(
        "📋 {} block feed(s), {} allow feed(s)",
        feeds.block.len(),
        feeds.allow.len()
    );
    Ok(DomainCollector::new(
        Arc::new(HttpFeedSource::new(timeout)?),
        feeds.block,
        feeds.allow,
        config.collapse_subdomains(),
    ))
}

fn report(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Skipped { remote_count } => {
            println!("⏭️ Gateway already holds {} entries, nothing to do", remote_count);
        }
        SyncOutcome::Synced {
            deleted_policies,
            deleted_lists,
            created_lists,
            policy,
        } => {
            println!(
                "✅ Sync completed: {} policies and {} lists deleted, {} lists created",
                deleted_policies, deleted_lists, created_lists
            );
            if let PolicyAction::Anomaly { matching } = policy {
                println!("⚠️ {} matching policies found, policy left untouched", matching);
            }
        }
        SyncOutcome::Planned {
            target_count,
            new_lists,
            ..
        } => {
            println!(
                "🔍 Dry run: {} domains would be written to {} lists",
                target_count, new_lists
            );
        }
        SyncOutcome::Exported { path, count } => {
            println!("📁 {} domains saved to {}", count, path);
        }
        SyncOutcome::TornDown {
            deleted_policies,
            deleted_lists,
        } => {
            println!(
                "🗑️ Deleted {} policies and {} lists",
                deleted_policies, deleted_lists
            );
        }
    }
}
