use anyhow::Context;
use spector::api::{self, app_state::AppState};
use spector::config::config::AppConfig;
use spector::config::loader::ConfigLoader;
use spector::config::roster::Roster;
use spector::observability::init_tracing;
use spector::services::orchestrator::Orchestrator;
use spector::storage::repository::SurrealWorldRepository;
use spector::storage::surrealdb::SurrealPool;
use std::sync::Arc;
use tracing::{info, warn};

/// 名册文件缺失时以空名册启动
fn load_roster(config: &AppConfig) -> anyhow::Result<Roster> {
    if !config.roster_path.exists() {
        warn!(
            path = %config.roster_path.display(),
            "Roster file not found, starting with no agents"
        );
        return Ok(Roster::default());
    }

    let roster = ConfigLoader::load_roster(&config.roster_path)
        .with_context(|| format!("failed to load roster {}", config.roster_path.display()))?;
    let duplicates = roster.duplicate_ids();
    if !duplicates.is_empty() {
        anyhow::bail!("duplicate agent ids in roster: {}", duplicates.join(", "));
    }
    Ok(roster)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging);

    ConfigLoader::validate(&config).context("invalid configuration")?;
    info!(
        app = %config.app_name,
        environment = %config.environment,
        "Starting Spector..."
    );

    let db_pool = SurrealPool::new(config.database.clone())
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;
    info!(url = %config.database.url, "Database connection initialized");

    let roster = load_roster(&config)?;
    info!(
        agents = roster.agents.len(),
        wake_conditions = roster.game_master.wake_conditions.len(),
        "Roster loaded"
    );

    let repository = Arc::new(SurrealWorldRepository::new(db_pool));
    let orchestrator = Orchestrator::from_config(&config, repository, roster)?;
    orchestrator.sync_roster().await?;

    if !config.adapters.preload.is_empty() {
        let report = orchestrator.preload_adapters(&config.adapters.preload).await;
        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Adapter preload finished"
        );
    }

    let app = api::create_router(AppState::new(orchestrator), &config.server.cors_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
