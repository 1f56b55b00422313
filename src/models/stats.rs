use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One bar / pie slice of a dashboard chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountBucket {
    pub key: String,
    pub label: String,
    pub count: i64,
}

impl CountBucket {
    pub fn zero(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyPoint {
    /// e.g. "janv. 2024"
    pub month: String,
    pub new_children: i64,
    pub total_children: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildrenStats {
    pub total: i64,
    pub gender: Vec<CountBucket>,
    pub age_groups: Vec<CountBucket>,
    pub parent_status: Vec<CountBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionStats {
    pub statuses: Vec<CountBucket>,
    pub records_count: i64,
    pub average_bmi: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStats {
    pub vaccination: Vec<CountBucket>,
    pub records_count: i64,
    pub diagnoses_last_30_days: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CapacityStats {
    pub capacity: i64,
    pub current_children: i64,
    pub available_places: i64,
    /// Percentage with one decimal.
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrphanageSummary {
    pub id: Uuid,
    pub name: String,
    pub province: String,
    pub city: String,
    pub child_capacity: i32,
}

/// Response of `GET /orphanage-stats`.
#[derive(Debug, Clone, Serialize)]
pub struct OrphanageStats {
    pub orphanage: OrphanageSummary,
    pub children: ChildrenStats,
    pub nutrition: NutritionStats,
    pub health: HealthStats,
    pub capacity: CapacityStats,
    pub trend: Vec<MonthlyPoint>,
}

/// Cross-facility dashboard for admins and partners.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewStats {
    pub province: Option<String>,
    pub orphanages: i64,
    pub children: ChildrenStats,
    pub nutrition: NutritionStats,
    pub vaccination: Vec<CountBucket>,
    pub trend: Vec<MonthlyPoint>,
}

/// Row of the `public_stats` view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PublicStats {
    pub total_orphanages: i64,
    pub verified_orphanages: i64,
    pub total_children: i64,
    pub total_boys: i64,
    pub total_girls: i64,
    pub provinces_covered: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicStatsResponse {
    #[serde(flatten)]
    pub stats: PublicStats,
    /// True when the view could not be read and the fixed example dataset is served.
    pub is_example: bool,
}

/// Row of `province_stats` (city is `None`) or `city_stats`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AreaStats {
    pub province: String,
    pub city: Option<String>,
    pub orphanage_count: i64,
    pub verified_count: i64,
    pub children_count: i64,
    pub boys_count: i64,
    pub girls_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct AreaQuery {
    pub province: Option<String>,
}
