use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Agrement,
    Statuts,
    AutorisationOuverture,
    RapportActivite,
    Autre,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentType::Agrement => "agrement",
            DocumentType::Statuts => "statuts",
            DocumentType::AutorisationOuverture => "autorisation_ouverture",
            DocumentType::RapportActivite => "rapport_activite",
            DocumentType::Autre => "autre",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DocumentType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agrement" => Ok(DocumentType::Agrement),
            "statuts" => Ok(DocumentType::Statuts),
            "autorisation_ouverture" => Ok(DocumentType::AutorisationOuverture),
            "rapport_activite" => Ok(DocumentType::RapportActivite),
            "autre" => Ok(DocumentType::Autre),
            _ => Err(anyhow::anyhow!("Unknown doc_type: {s}")),
        }
    }
}

/// Metadata of a legal document; the file itself lives in external storage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrphanageDocument {
    pub id: Uuid,
    pub orphanage_id: Uuid,
    pub title: String,
    pub doc_type: String,
    pub file_url: String,
    pub expiry_date: Option<NaiveDate>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPayload {
    pub title: String,
    pub doc_type: DocumentType,
    pub file_url: String,
    pub expiry_date: Option<NaiveDate>,
}

impl DocumentPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Le titre du document est requis.".into());
        }
        if !(self.file_url.starts_with("https://") || self.file_url.starts_with("http://")) {
            return Err("Le lien du fichier doit être une URL http(s).".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub doc_type: Option<DocumentType>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_requires_title_and_url() {
        let mut payload = DocumentPayload {
            title: "Agrément ministériel".into(),
            doc_type: DocumentType::Agrement,
            file_url: "https://stockage.example.org/docs/agrement.pdf".into(),
            expiry_date: None,
        };
        assert!(payload.validate().is_ok());

        payload.file_url = "agrement.pdf".into();
        assert!(payload.validate().is_err());

        payload.file_url = "https://stockage.example.org/a.pdf".into();
        payload.title = " ".into();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn doc_type_text_round_trips() {
        let t: DocumentType = "autorisation_ouverture".parse().unwrap();
        assert_eq!(t, DocumentType::AutorisationOuverture);
        assert_eq!(t.to_string(), "autorisation_ouverture");
    }
}
