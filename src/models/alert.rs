use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::notification::Priority;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DiseaseOutbreak,
    VaccinationGap,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::DiseaseOutbreak => "disease_outbreak",
            AlertKind::VaccinationGap => "vaccination_gap",
        }
    }
}

/// Derived on demand, never stored as such.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthAlert {
    pub kind: AlertKind,
    pub severity: Priority,
    pub orphanage_id: Uuid,
    pub orphanage_name: String,
    pub disease: Option<String>,
    /// Diagnoses (outbreak) or non-vaccinated children (gap).
    pub case_count: i64,
    pub affected_percentage: Option<f64>,
    pub message: String,
}

/// A diagnosis joined to the facility of the child.
#[derive(Debug, Clone, FromRow)]
pub struct DiagnosisRow {
    pub orphanage_id: Uuid,
    pub orphanage_name: String,
    pub disease_name: String,
    pub record_date: NaiveDate,
}

/// A health record's vaccination status joined to the facility of the child.
#[derive(Debug, Clone, FromRow)]
pub struct VaccinationRow {
    pub orphanage_id: Uuid,
    pub orphanage_name: String,
    pub child_id: Uuid,
    pub status: Option<String>,
}
