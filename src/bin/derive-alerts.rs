/// Derive the current health alerts and print them as JSON.
/// Alerts are recomputed on each run; nothing is stored between runs.
///
/// Usage: derive-alerts [--notify]
///   --notify : also write one notification per alert for every active admin

use clap::Parser;
use orphelinats_api::services::alerts::AlertService;

#[derive(Parser)]
#[command(name = "derive-alerts", about = "Derive health alerts from recent diagnoses and vaccination records")]
struct Args {
    /// Publish the alerts to the admins' notification feed
    #[arg(long)]
    notify: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;
    let pool = orphelinats_api::db::create_pool(&database_url).await?;

    let today = chrono::Utc::now().date_naive();
    let alerts = AlertService::derive(&pool, today).await?;
    tracing::info!("{} health alerts derived", alerts.len());

    println!("{}", serde_json::to_string_pretty(&alerts)?);

    if args.notify {
        let published = AlertService::publish(&pool, &alerts).await?;
        tracing::info!("{} notifications written", published);
    }

    Ok(())
}
