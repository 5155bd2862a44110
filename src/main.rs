use anyhow::Context;
use price_rounds::{
    api, config::Config, db::init_db, seed, Repository, RoundEngine, SqliteDirectory, SystemClock,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;

    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("failed to initialize database at {}", config.database_path))?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(path) = &config.seed_path {
        seed::load_seed_file(&repo, path).await?;
    }

    let directory = Arc::new(SqliteDirectory::new(repo.clone()));
    let clock = Arc::new(SystemClock::new(config.business_timezone));
    let engine = Arc::new(RoundEngine::new(
        repo.clone(),
        directory.clone(),
        directory,
        clock,
    ));

    let app = api::create_router(api::AppState::new(repo, engine));

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!(
        timezone = %config.business_timezone,
        "Server listening on {}",
        addr
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
