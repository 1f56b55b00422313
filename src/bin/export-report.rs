/// Export a report to stdout or a file.
///
/// Usage: export-report --type general [--format csv] [--output rapport.csv]

use std::path::PathBuf;

use clap::Parser;
use orphelinats_api::{
    models::report::{ReportFormat, ReportType},
    services::reports::ReportService,
};

#[derive(Parser)]
#[command(name = "export-report", about = "Export a registry report as text or CSV")]
struct Args {
    /// general, orphanages, children, nutrition or provinces
    #[arg(long = "type")]
    report_type: ReportType,

    /// text or csv
    #[arg(long, default_value = "text")]
    format: ReportFormat,

    /// Write to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
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
    let report = ReportService::export(&pool, args.report_type, args.format, today).await?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, report.body.as_bytes()).await?;
            tracing::info!("Report written to {}", path.display());
        }
        None => print!("{}", report.body),
    }

    Ok(())
}
