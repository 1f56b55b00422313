pub mod alerts;
pub mod children;
pub mod documents;
pub mod health;
pub mod health_records;
pub mod metrics;
pub mod notifications;
pub mod nutrition;
pub mod orphanages;
pub mod partners;
pub mod reference;
pub mod reports;
pub mod stats;

use chrono::NaiveDate;
use serde_json::{json, Value};

/// Calendar day used for date validation and age computation.
pub(crate) fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub(crate) fn message(text: &str) -> axum::Json<Value> {
    axum::Json(json!({ "message": text }))
}
