use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Canonical stored set. `underweight` / `overweight` are not accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NutritionStatus {
    Normal,
    Malnourished,
    SeverelyMalnourished,
}

impl std::fmt::Display for NutritionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NutritionStatus::Normal => "normal",
            NutritionStatus::Malnourished => "malnourished",
            NutritionStatus::SeverelyMalnourished => "severely_malnourished",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NutritionStatus {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(NutritionStatus::Normal),
            "malnourished" => Ok(NutritionStatus::Malnourished),
            "severely_malnourished" => Ok(NutritionStatus::SeverelyMalnourished),
            _ => Err(anyhow::anyhow!("Unknown nutrition_status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionRecord {
    pub id: Uuid,
    pub child_id: Uuid,
    pub record_date: NaiveDate,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: Option<f64>,
    pub nutrition_status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NutritionPayload {
    pub record_date: NaiveDate,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub nutrition_status: NutritionStatus,
    pub notes: Option<String>,
}

impl NutritionPayload {
    pub fn validate(&self, today: NaiveDate) -> Result<(), String> {
        if self.record_date > today {
            return Err("La date de la mesure ne peut pas être dans le futur.".into());
        }
        if !(0.5..=150.0).contains(&self.weight_kg) {
            return Err("Le poids doit être compris entre 0,5 et 150 kg.".into());
        }
        if !(30.0..=220.0).contains(&self.height_cm) {
            return Err("La taille doit être comprise entre 30 et 220 cm.".into());
        }
        Ok(())
    }

    pub fn bmi(&self) -> f64 {
        body_mass_index(self.weight_kg, self.height_cm)
    }
}

/// kg / m², rounded to one decimal.
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    if height_m <= 0.0 {
        return 0.0;
    }
    (weight_kg / (height_m * height_m) * 10.0).round() / 10.0
}
