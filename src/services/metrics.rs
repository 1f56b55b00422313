use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec};
use sqlx::PgPool;
use tracing::{info, warn};

lazy_static! {
    // ── Event counters ──────────────────────────────────────────────────────
    pub static ref REGISTRATIONS_COUNTER: CounterVec = register_counter_vec!(
        "api_registrations_total",
        "Formulaires publics reçus par type (orphanage, partner)",
        &["kind"]
    ).unwrap();

    pub static ref REVIEWS_COUNTER: CounterVec = register_counter_vec!(
        "api_reviews_total",
        "Décisions de validation par type et décision",
        &["kind", "decision"]
    ).unwrap();

    pub static ref HEALTH_ALERTS_COUNTER: CounterVec = register_counter_vec!(
        "api_health_alerts_derived_total",
        "Alertes sanitaires calculées par type et sévérité",
        &["kind", "severity"]
    ).unwrap();

    pub static ref REPORTS_COUNTER: CounterVec = register_counter_vec!(
        "api_reports_exported_total",
        "Rapports exportés par type et format",
        &["report", "format"]
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref ORPHANAGES_GAUGE: GaugeVec = register_gauge_vec!(
        "orphelinats_orphanages_total",
        "Centres d'accueil par statut légal",
        &["legal_status"]
    ).unwrap();

    pub static ref CHILDREN_GAUGE: Gauge = register_gauge!(
        "orphelinats_children_total",
        "Enfants enregistrés"
    ).unwrap();

    pub static ref PENDING_PARTNER_REQUESTS_GAUGE: Gauge = register_gauge!(
        "orphelinats_partner_requests_pending_total",
        "Demandes de partenariat en attente"
    ).unwrap();
}

/// Spawn the background collector refreshing the business gauges every `interval_secs`.
pub fn start(pool: PgPool, interval_secs: u64) {
    tokio::spawn(async move {
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(interval_secs)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let by_status: Vec<(String, i64)> = sqlx::query_as(
        "SELECT legal_status, COUNT(*)::BIGINT FROM orphanages GROUP BY legal_status",
    )
    .fetch_all(pool)
    .await?;

    for status in ["pending", "verified", "rejected"] {
        let count = by_status
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, c)| *c)
            .unwrap_or(0);
        ORPHANAGES_GAUGE.with_label_values(&[status]).set(count as f64);
    }

    let children: i64 = sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM children")
        .fetch_one(pool)
        .await
        .unwrap_or(0);
    CHILDREN_GAUGE.set(children as f64);

    let pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)::BIGINT FROM partner_requests WHERE status = 'pending'",
    )
    .fetch_one(pool)
    .await
    .unwrap_or(0);
    PENDING_PARTNER_REQUESTS_GAUGE.set(pending as f64);

    info!("Metrics: collected ({} orphanage status group(s))", by_status.len());
    Ok(())
}
