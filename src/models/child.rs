use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Gender::Male => "M",
            Gender::Female => "F",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Gender {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            _ => Err(anyhow::anyhow!("Unknown gender: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParentStatus {
    TotalOrphan,
    PartialOrphan,
    Abandoned,
}

impl std::fmt::Display for ParentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParentStatus::TotalOrphan => "total_orphan",
            ParentStatus::PartialOrphan => "partial_orphan",
            ParentStatus::Abandoned => "abandoned",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ParentStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_orphan" => Ok(ParentStatus::TotalOrphan),
            "partial_orphan" => Ok(ParentStatus::PartialOrphan),
            "abandoned" => Ok(ParentStatus::Abandoned),
            _ => Err(anyhow::anyhow!("Unknown parent_status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Child {
    pub id: Uuid,
    pub orphanage_id: Uuid,
    pub full_name: String,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,
    pub estimated_age: Option<i32>,
    pub entry_date: Option<NaiveDate>,
    pub parent_status: String,
    pub internal_code: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateChildRequest {
    pub full_name: String,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
    pub estimated_age: Option<i32>,
    pub entry_date: Option<NaiveDate>,
    pub parent_status: ParentStatus,
    pub internal_code: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

impl CreateChildRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), String> {
        if self.full_name.trim().is_empty() {
            return Err("Le nom complet est requis.".into());
        }
        if self.birth_date.is_none() && self.estimated_age.is_none() {
            return Err("La date de naissance ou l'âge estimé est requis.".into());
        }
        validate_dates(self.birth_date, self.estimated_age, self.entry_date, today)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateChildRequest {
    pub full_name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub estimated_age: Option<i32>,
    pub entry_date: Option<NaiveDate>,
    pub parent_status: Option<ParentStatus>,
    pub internal_code: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

impl UpdateChildRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<(), String> {
        if matches!(&self.full_name, Some(name) if name.trim().is_empty()) {
            return Err("Le nom complet est requis.".into());
        }
        validate_dates(self.birth_date, self.estimated_age, self.entry_date, today)
    }

    /// Dates of `current` once this update is applied must stay in order.
    pub fn check_dates_against(&self, current: &Child) -> Result<(), String> {
        let birth_date = self.birth_date.or(current.birth_date);
        let entry_date = self.entry_date.or(current.entry_date);
        check_entry_after_birth(birth_date, entry_date)
    }
}

fn check_entry_after_birth(birth_date: Option<NaiveDate>, entry_date: Option<NaiveDate>) -> Result<(), String> {
    if let (Some(birth), Some(entry)) = (birth_date, entry_date) {
        if entry < birth {
            return Err("La date d'entrée précède la date de naissance.".into());
        }
    }
    Ok(())
}

fn validate_dates(
    birth_date: Option<NaiveDate>,
    estimated_age: Option<i32>,
    entry_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), String> {
    if matches!(birth_date, Some(d) if d > today) {
        return Err("La date de naissance ne peut pas être dans le futur.".into());
    }
    if matches!(estimated_age, Some(a) if !(0..=25).contains(&a)) {
        return Err("L'âge estimé doit être compris entre 0 et 25 ans.".into());
    }
    if matches!(entry_date, Some(d) if d > today) {
        return Err("La date d'entrée ne peut pas être dans le futur.".into());
    }
    check_entry_after_birth(birth_date, entry_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn request() -> CreateChildRequest {
        CreateChildRequest {
            full_name: "Grâce Mbuyi".into(),
            gender: Gender::Female,
            birth_date: NaiveDate::from_ymd_opt(2016, 3, 2),
            estimated_age: None,
            entry_date: NaiveDate::from_ymd_opt(2021, 9, 1),
            parent_status: ParentStatus::PartialOrphan,
            internal_code: Some("CE-014".into()),
            photo_url: None,
            notes: None,
        }
    }

    #[test]
    fn form_payload_deserializes_enums() {
        let req: CreateChildRequest = serde_json::from_value(serde_json::json!({
            "full_name": "Jonas",
            "gender": "M",
            "estimated_age": 7,
            "parent_status": "abandoned"
        }))
        .unwrap();
        assert_eq!(req.gender, Gender::Male);
        assert_eq!(req.parent_status, ParentStatus::Abandoned);
        assert!(req.validate(today()).is_ok());
    }

    #[test]
    fn unknown_gender_is_rejected_by_the_payload_shape() {
        let res: Result<CreateChildRequest, _> = serde_json::from_value(serde_json::json!({
            "full_name": "Jonas",
            "gender": "X",
            "estimated_age": 7,
            "parent_status": "abandoned"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn age_source_is_required() {
        let mut req = request();
        req.birth_date = None;
        assert!(req.validate(today()).is_err());
        req.estimated_age = Some(9);
        assert!(req.validate(today()).is_ok());
    }

    #[test]
    fn future_dates_are_rejected() {
        let mut req = request();
        req.birth_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        assert!(req.validate(today()).is_err());

        let mut req = request();
        req.entry_date = NaiveDate::from_ymd_opt(2024, 7, 1);
        assert!(req.validate(today()).is_err());
    }

    #[test]
    fn estimated_age_is_bounded() {
        let mut req = request();
        req.birth_date = None;
        req.estimated_age = Some(30);
        assert!(req.validate(today()).is_err());
    }

    fn stored_child() -> Child {
        let now = Utc::now();
        Child {
            id: Uuid::new_v4(),
            orphanage_id: Uuid::new_v4(),
            full_name: "Grâce Mbuyi".into(),
            gender: "F".into(),
            birth_date: NaiveDate::from_ymd_opt(2016, 3, 2),
            estimated_age: None,
            entry_date: NaiveDate::from_ymd_opt(2021, 9, 1),
            parent_status: "partial_orphan".into(),
            internal_code: None,
            photo_url: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn entry_date_alone_is_checked_against_stored_birth_date() {
        let current = stored_child();

        let before_birth = UpdateChildRequest {
            entry_date: NaiveDate::from_ymd_opt(2015, 1, 10),
            ..Default::default()
        };
        assert!(before_birth.validate(today()).is_ok());
        assert!(before_birth.check_dates_against(&current).is_err());

        let later_birth = UpdateChildRequest {
            birth_date: NaiveDate::from_ymd_opt(2022, 1, 1),
            ..Default::default()
        };
        assert!(later_birth.check_dates_against(&current).is_err());

        let corrected = UpdateChildRequest {
            entry_date: NaiveDate::from_ymd_opt(2020, 2, 3),
            ..Default::default()
        };
        assert!(corrected.check_dates_against(&current).is_ok());
    }

    #[test]
    fn gender_and_parent_status_text_round_trip() {
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(Gender::Male.to_string(), "M");
        assert_eq!(
            ParentStatus::TotalOrphan.to_string().parse::<ParentStatus>().unwrap(),
            ParentStatus::TotalOrphan
        );
    }
}
