use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationStatus {
    Vaccinated,
    PartiallyVaccinated,
    NotVaccinated,
    Unknown,
}

impl VaccinationStatus {
    /// Lenient parse for values read back from JSONB; anything unexpected is `Unknown`.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("vaccinated") => VaccinationStatus::Vaccinated,
            Some("partially_vaccinated") => VaccinationStatus::PartiallyVaccinated,
            Some("not_vaccinated") => VaccinationStatus::NotVaccinated,
            _ => VaccinationStatus::Unknown,
        }
    }
}

/// The `vaccination_status_structured` JSONB column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaccinationRecord {
    pub status: VaccinationStatus,
    #[serde(default)]
    pub vaccines: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Disease {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HealthRecord {
    pub id: Uuid,
    pub child_id: Uuid,
    pub record_date: NaiveDate,
    pub vaccination_status_structured: Option<Json<VaccinationRecord>>,
    pub chronic_conditions: Option<String>,
    pub medications: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Join row of a health record and a diagnosed disease, with the disease name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChildDisease {
    pub id: Uuid,
    pub health_record_id: Uuid,
    pub child_id: Uuid,
    pub disease_id: i32,
    pub disease_name: String,
    pub severity: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthRecordWithDiseases {
    #[serde(flatten)]
    pub record: HealthRecord,
    pub diseases: Vec<ChildDisease>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisEntry {
    pub disease_id: i32,
    pub severity: Severity,
    pub notes: Option<String>,
}

/// Body of both the create form and `PUT /update-health-record/{id}`; an update
/// replaces the record and its whole diagnosis list.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthRecordPayload {
    pub record_date: NaiveDate,
    pub vaccination_status_structured: Option<VaccinationRecord>,
    pub chronic_conditions: Option<String>,
    pub medications: Option<String>,
    pub remarks: Option<String>,
    #[serde(default)]
    pub diseases: Vec<DiagnosisEntry>,
}

impl HealthRecordPayload {
    pub fn validate(&self, today: NaiveDate) -> Result<(), String> {
        if self.record_date > today {
            return Err("La date de la fiche ne peut pas être dans le futur.".into());
        }
        if let Some(vaccination) = &self.vaccination_status_structured {
            if vaccination.vaccines.iter().any(|v| v.trim().is_empty()) {
                return Err("Les noms de vaccins ne peuvent pas être vides.".into());
            }
            if vaccination.status == VaccinationStatus::NotVaccinated && !vaccination.vaccines.is_empty() {
                return Err("Un enfant non vacciné ne peut pas avoir de vaccins listés.".into());
            }
        }
        let mut seen = HashSet::new();
        if !self.diseases.iter().all(|d| seen.insert(d.disease_id)) {
            return Err("Une maladie ne peut être déclarée qu'une fois par fiche.".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn structured_status_shape() {
        let payload: HealthRecordPayload = serde_json::from_value(serde_json::json!({
            "record_date": "2024-06-01",
            "vaccination_status_structured": {
                "status": "partially_vaccinated",
                "vaccines": ["BCG", "Polio"],
                "last_updated": "2024-06-01T09:00:00Z"
            },
            "diseases": [{ "disease_id": 3, "severity": "moderate" }]
        }))
        .unwrap();

        let vaccination = payload.vaccination_status_structured.as_ref().unwrap();
        assert_eq!(vaccination.status, VaccinationStatus::PartiallyVaccinated);
        assert_eq!(vaccination.vaccines.len(), 2);
        assert_eq!(payload.diseases[0].severity, Severity::Moderate);
        assert!(payload.validate(today()).is_ok());
    }

    #[test]
    fn unknown_status_or_severity_fails_the_payload_shape() {
        let bad_status: Result<VaccinationRecord, _> = serde_json::from_value(serde_json::json!({
            "status": "maybe",
            "last_updated": "2024-06-01T09:00:00Z"
        }));
        assert!(bad_status.is_err());

        let bad_severity: Result<DiagnosisEntry, _> =
            serde_json::from_value(serde_json::json!({ "disease_id": 1, "severity": "critical" }));
        assert!(bad_severity.is_err());
    }

    #[test]
    fn duplicate_diagnoses_are_rejected() {
        let payload = HealthRecordPayload {
            record_date: today(),
            vaccination_status_structured: None,
            chronic_conditions: None,
            medications: None,
            remarks: None,
            diseases: vec![
                DiagnosisEntry { disease_id: 1, severity: Severity::Mild, notes: None },
                DiagnosisEntry { disease_id: 1, severity: Severity::Severe, notes: None },
            ],
        };
        assert!(payload.validate(today()).is_err());
    }

    #[test]
    fn future_record_date_is_rejected() {
        let payload = HealthRecordPayload {
            record_date: NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
            vaccination_status_structured: None,
            chronic_conditions: None,
            medications: None,
            remarks: None,
            diseases: vec![],
        };
        assert!(payload.validate(today()).is_err());
    }

    #[test]
    fn stored_status_parse_is_lenient() {
        assert_eq!(VaccinationStatus::from_stored(Some("not_vaccinated")), VaccinationStatus::NotVaccinated);
        assert_eq!(VaccinationStatus::from_stored(Some("legacy")), VaccinationStatus::Unknown);
        assert_eq!(VaccinationStatus::from_stored(None), VaccinationStatus::Unknown);
    }
}
