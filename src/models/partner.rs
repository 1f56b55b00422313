use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartnerRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for PartnerRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PartnerRequestStatus::Pending => "pending",
            PartnerRequestStatus::Approved => "approved",
            PartnerRequestStatus::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PartnerRequest {
    pub id: Uuid,
    pub organization_name: String,
    pub organization_type: Option<String>,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub purpose: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePartnerRequest {
    pub organization_name: String,
    pub organization_type: Option<String>,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub purpose: Option<String>,
}

impl CreatePartnerRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.organization_name.trim().is_empty() {
            return Err("Le nom de l'organisation est requis.".into());
        }
        if self.contact_name.trim().is_empty() {
            return Err("Le nom du contact est requis.".into());
        }
        if !self.email.contains('@') {
            return Err("Adresse courriel invalide.".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartnerDecision {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct ReviewPartnerRequest {
    pub decision: PartnerDecision,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartnerRequestQuery {
    pub status: Option<PartnerRequestStatus>,
}
