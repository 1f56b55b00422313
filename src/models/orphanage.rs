use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LegalStatus {
    Pending,
    Verified,
    Rejected,
}

impl std::fmt::Display for LegalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LegalStatus::Pending => "pending",
            LegalStatus::Verified => "verified",
            LegalStatus::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for LegalStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LegalStatus::Pending),
            "verified" => Ok(LegalStatus::Verified),
            "rejected" => Ok(LegalStatus::Rejected),
            _ => Err(anyhow::anyhow!("Unknown legal_status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Orphanage {
    pub id: Uuid,
    pub name: String,
    pub province: String,
    pub city: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub contact_person: String,
    pub legal_status: String,
    pub rejection_reason: Option<String>,
    pub child_capacity: i32,
    pub children_total: i32,
    pub boys_count: i32,
    pub girls_count: i32,
    pub schooling_rate: Option<f64>,
    pub annual_disease_rate: Option<f64>,
    pub meals_per_day: Option<i32>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public registration form of a centre d'accueil.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterOrphanageRequest {
    pub name: String,
    pub province: String,
    pub city: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub contact_person: String,
    pub child_capacity: i32,
    pub children_total: i32,
    pub boys_count: i32,
    pub girls_count: i32,
    pub schooling_rate: Option<f64>,
    pub annual_disease_rate: Option<f64>,
    pub meals_per_day: Option<i32>,
}

impl RegisterOrphanageRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Le nom du centre est requis.".into());
        }
        if self.province.trim().is_empty() || self.city.trim().is_empty() {
            return Err("La province et la ville sont requises.".into());
        }
        if self.contact_person.trim().is_empty() {
            return Err("La personne de contact est requise.".into());
        }
        if !self.email.contains('@') {
            return Err("Adresse courriel invalide.".into());
        }
        if self.child_capacity < 1 {
            return Err("La capacité d'accueil doit être d'au moins 1 enfant.".into());
        }
        validate_counts(self.children_total, self.boys_count, self.girls_count)?;
        validate_rates(self.schooling_rate, self.annual_disease_rate, self.meals_per_day)
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrphanageRequest {
    pub name: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub contact_person: Option<String>,
    pub child_capacity: Option<i32>,
    pub children_total: Option<i32>,
    pub boys_count: Option<i32>,
    pub girls_count: Option<i32>,
    pub schooling_rate: Option<f64>,
    pub annual_disease_rate: Option<f64>,
    pub meals_per_day: Option<i32>,
}

impl UpdateOrphanageRequest {
    pub fn validate(&self) -> Result<(), String> {
        for field in [&self.name, &self.province, &self.city, &self.contact_person]
            .into_iter()
            .flatten()
        {
            if field.trim().is_empty() {
                return Err("Les champs obligatoires ne peuvent pas être vides.".into());
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err("Adresse courriel invalide.".into());
            }
        }
        if matches!(self.child_capacity, Some(c) if c < 1) {
            return Err("La capacité d'accueil doit être d'au moins 1 enfant.".into());
        }
        if [self.children_total, self.boys_count, self.girls_count]
            .into_iter()
            .flatten()
            .any(|count| count < 0)
        {
            return Err("Les effectifs ne peuvent pas être négatifs.".into());
        }
        validate_rates(self.schooling_rate, self.annual_disease_rate, self.meals_per_day)
    }

    /// Counts of `current` once this update is applied must still balance.
    pub fn check_counts_against(&self, current: &Orphanage) -> Result<(), String> {
        validate_counts(
            self.children_total.unwrap_or(current.children_total),
            self.boys_count.unwrap_or(current.boys_count),
            self.girls_count.unwrap_or(current.girls_count),
        )
    }
}

fn validate_counts(total: i32, boys: i32, girls: i32) -> Result<(), String> {
    if total < 0 || boys < 0 || girls < 0 {
        return Err("Les effectifs ne peuvent pas être négatifs.".into());
    }
    if boys.checked_add(girls) != Some(total) {
        return Err("Le nombre de garçons et de filles doit correspondre au total.".into());
    }
    Ok(())
}

fn validate_rates(
    schooling_rate: Option<f64>,
    annual_disease_rate: Option<f64>,
    meals_per_day: Option<i32>,
) -> Result<(), String> {
    for rate in [schooling_rate, annual_disease_rate].into_iter().flatten() {
        if !(0.0..=100.0).contains(&rate) {
            return Err("Les taux doivent être compris entre 0 et 100.".into());
        }
    }
    if matches!(meals_per_day, Some(m) if !(0..=10).contains(&m)) {
        return Err("Le nombre de repas par jour doit être compris entre 0 et 10.".into());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Verify,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct ReviewOrphanageRequest {
    pub decision: ReviewDecision,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrphanageQuery {
    pub province: Option<String>,
    pub status: Option<LegalStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegisterOrphanageRequest {
        RegisterOrphanageRequest {
            name: "Centre Espoir".into(),
            province: "Kinshasa".into(),
            city: "Limete".into(),
            address: None,
            phone: Some("+243 810 000 000".into()),
            email: "contact@espoir.cd".into(),
            contact_person: "Marie Kabila".into(),
            child_capacity: 40,
            children_total: 25,
            boys_count: 12,
            girls_count: 13,
            schooling_rate: Some(80.0),
            annual_disease_rate: Some(12.5),
            meals_per_day: Some(3),
        }
    }

    #[test]
    fn complete_registration_is_valid() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn gender_counts_must_add_up() {
        let mut req = registration();
        req.girls_count = 20;
        assert!(req.validate().unwrap_err().contains("total"));
    }

    #[test]
    fn rates_are_bounded() {
        let mut req = registration();
        req.schooling_rate = Some(120.0);
        assert!(req.validate().is_err());

        let mut req = registration();
        req.meals_per_day = Some(11);
        assert!(req.validate().is_err());
    }

    #[test]
    fn capacity_must_be_positive() {
        let mut req = registration();
        req.child_capacity = 0;
        assert!(req.validate().is_err());
    }

    fn stored(total: i32, boys: i32, girls: i32) -> Orphanage {
        let now = Utc::now();
        Orphanage {
            id: Uuid::new_v4(),
            name: "Centre Espoir".into(),
            province: "Kinshasa".into(),
            city: "Limete".into(),
            address: None,
            phone: None,
            email: "contact@espoir.cd".into(),
            contact_person: "Marie Kabila".into(),
            legal_status: LegalStatus::Verified.to_string(),
            rejection_reason: None,
            child_capacity: 40,
            children_total: total,
            boys_count: boys,
            girls_count: girls,
            schooling_rate: None,
            annual_disease_rate: None,
            meals_per_day: Some(3),
            verified_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let mut req = registration();
        req.boys_count = i32::MAX;
        req.girls_count = i32::MAX;
        req.children_total = 1;
        assert!(req.validate().unwrap_err().contains("total"));
    }

    #[test]
    fn negative_count_in_partial_update_is_rejected() {
        let update = UpdateOrphanageRequest {
            boys_count: Some(-5),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn partial_update_counts_are_checked_against_the_stored_row() {
        let current = stored(25, 12, 13);

        let unbalanced = UpdateOrphanageRequest {
            boys_count: Some(99),
            ..Default::default()
        };
        assert!(unbalanced.validate().is_ok());
        assert!(unbalanced.check_counts_against(&current).unwrap_err().contains("total"));

        let new_arrival = UpdateOrphanageRequest {
            children_total: Some(26),
            girls_count: Some(14),
            ..Default::default()
        };
        assert!(new_arrival.check_counts_against(&current).is_ok());

        let untouched = UpdateOrphanageRequest {
            name: Some("Centre Espoir Limete".into()),
            ..Default::default()
        };
        assert!(untouched.check_counts_against(&current).is_ok());
    }

    #[test]
    fn blank_required_field_in_update_is_rejected() {
        let blank_name = UpdateOrphanageRequest {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());
    }

    #[test]
    fn legal_status_parses() {
        assert_eq!("verified".parse::<LegalStatus>().unwrap(), LegalStatus::Verified);
        assert!("approved".parse::<LegalStatus>().is_err());
    }
}
