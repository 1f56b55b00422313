use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orphelinats_api::{app, config::Config, db, services, services::email::EmailService, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orphelinats_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url).await?;
    if config.run_migrations {
        db::run_migrations(&pool).await?;
        info!("Database connected and migrations applied");
    } else {
        info!("Database connected (migrations skipped)");
    }

    let redis_client = redis::Client::open(config.redis_url.as_str())?;

    services::metrics::start(pool.clone(), config.metrics_refresh_seconds);

    let email = EmailService::new(&config).map(Arc::new);
    if email.is_some() {
        info!("SMTP email service configured");
    } else {
        info!("SMTP not configured, account emails disabled");
    }

    let state = AppState {
        db: pool,
        redis_client,
        config: config.clone(),
        email,
    };

    let addr = format!("{}:{}", config.host, config.port);
    info!("Orphanage registry API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
