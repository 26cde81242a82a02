use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use media_manager::{
    config::Config,
    create_app,
    database::Database,
    handlers::AppState,
    services::create_mailer,
    storage::create_storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_manager=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let mailer = create_mailer(&config)?;

    let state = if config.database_url.is_empty() {
        tracing::warn!("DATABASE_URL not set, using the in-memory store");
        AppState::in_memory(config.clone(), mailer)?
    } else {
        let database = Database::new(&config.database_url)
            .await
            .context("Failed to connect to database")?;
        database.migrate().await.context("Failed to run migrations")?;
        tracing::info!("Database migrations applied");

        let storage = create_storage(&config)?;

        AppState::new(
            config.clone(),
            Arc::new(database.folders()),
            Arc::new(database.files()),
            Arc::new(database.users()),
            storage,
            mailer,
        )
    };

    let app = create_app(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Media manager listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
