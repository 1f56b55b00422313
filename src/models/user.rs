use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Orphelinat,
    Partner,
}

impl UserRole {
    /// Label used in account emails.
    pub fn label_fr(&self) -> &'static str {
        match self {
            UserRole::Admin => "Administrateur",
            UserRole::Orphelinat => "Gestionnaire de centre",
            UserRole::Partner => "Partenaire",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserRole::Admin => "admin",
            UserRole::Orphelinat => "orphelinat",
            UserRole::Partner => "partner",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "orphelinat" => Ok(UserRole::Orphelinat),
            "partner" => Ok(UserRole::Partner),
            _ => Err(anyhow::anyhow!("Unknown role: {s}")),
        }
    }
}

/// DB row; role kept as TEXT and parsed on demand.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub force_password_change: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account created when an orphanage is verified or a partner approved.
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub user_id: Uuid,
    pub email: String,
    /// `None` when the email already had an account that was linked instead.
    pub temporary_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_text_round_trips() {
        for role in [UserRole::Admin, UserRole::Orphelinat, UserRole::Partner] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("super_admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&UserRole::Orphelinat).unwrap(), "\"orphelinat\"");
    }
}
