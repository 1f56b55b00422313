//! Aggregate statistics behind the dashboard charts and reports.
//!
//! The pure functions at the top only see rows already fetched; `StatsService`
//! does the fetching. Every fixed bucket set is emitted in full, zero counts
//! included, so charts keep the same shape on empty data.

use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    child::Child,
    health::VaccinationStatus,
    stats::{
        AreaStats, CapacityStats, ChildrenStats, CountBucket, HealthStats, MonthlyPoint,
        NutritionStats, OrphanageStats, OrphanageSummary, OverviewStats, PublicStats,
    },
};

/// Upper bound (inclusive) of each age bucket; the last bucket is open.
const AGE_BUCKETS: [(Option<i32>, &str, &str); 5] = [
    (Some(2), "0-2", "0-2 ans"),
    (Some(5), "3-5", "3-5 ans"),
    (Some(10), "6-10", "6-10 ans"),
    (Some(15), "11-15", "11-15 ans"),
    (None, "16+", "16+ ans"),
];

const GENDER_BUCKETS: [(&str, &str); 2] = [("M", "Garçons"), ("F", "Filles")];

const PARENT_STATUS_BUCKETS: [(&str, &str); 4] = [
    ("total_orphan", "Orphelin total"),
    ("partial_orphan", "Orphelin partiel"),
    ("abandoned", "Abandonné"),
    ("unknown", "Inconnu"),
];

const NUTRITION_BUCKETS: [(&str, &str); 4] = [
    ("normal", "Normal"),
    ("malnourished", "Malnutrition"),
    ("severely_malnourished", "Malnutrition sévère"),
    ("unknown", "Inconnu"),
];

const VACCINATION_BUCKETS: [(VaccinationStatus, &str, &str); 4] = [
    (VaccinationStatus::Vaccinated, "vaccinated", "Vacciné"),
    (VaccinationStatus::PartiallyVaccinated, "partially_vaccinated", "Partiellement vacciné"),
    (VaccinationStatus::NotVaccinated, "not_vaccinated", "Non vacciné"),
    (VaccinationStatus::Unknown, "unknown", "Inconnu"),
];

const FRENCH_MONTHS: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.", "déc.",
];

/// Age in whole years: year difference from the birth date, else the estimated
/// age, else 0.
pub fn age_in_years(birth_date: Option<NaiveDate>, estimated_age: Option<i32>, today: NaiveDate) -> i32 {
    match (birth_date, estimated_age) {
        (Some(birth), _) => (today.year() - birth.year()).max(0),
        (None, Some(age)) => age.max(0),
        (None, None) => 0,
    }
}

/// Index into the age buckets; a value on a boundary stays in the lower bucket.
pub fn age_bucket_index(age: i32) -> usize {
    AGE_BUCKETS
        .iter()
        .position(|(upper, _, _)| upper.map_or(true, |u| age <= u))
        .unwrap_or(AGE_BUCKETS.len() - 1)
}

pub fn age_bucket_label(age: i32) -> &'static str {
    AGE_BUCKETS[age_bucket_index(age)].2
}

pub fn gender_tally(children: &[Child]) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = GENDER_BUCKETS
        .iter()
        .map(|(key, label)| CountBucket::zero(key, label))
        .collect();
    for child in children {
        if let Some(bucket) = buckets.iter_mut().find(|b| b.key == child.gender) {
            bucket.count += 1;
        }
    }
    buckets
}

pub fn age_distribution(children: &[Child], today: NaiveDate) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = AGE_BUCKETS
        .iter()
        .map(|(_, key, label)| CountBucket::zero(key, label))
        .collect();
    for child in children {
        let age = age_in_years(child.birth_date, child.estimated_age, today);
        buckets[age_bucket_index(age)].count += 1;
    }
    buckets
}

pub fn parent_status_tally(children: &[Child]) -> Vec<CountBucket> {
    tally_text(&PARENT_STATUS_BUCKETS, children.iter().map(|c| Some(c.parent_status.as_str())))
}

/// Nutrition statuses as stored; anything outside the canonical set lands in `unknown`.
pub fn nutrition_tally<'a>(statuses: impl IntoIterator<Item = Option<&'a str>>) -> Vec<CountBucket> {
    tally_text(&NUTRITION_BUCKETS, statuses)
}

pub fn vaccination_tally(statuses: impl IntoIterator<Item = VaccinationStatus>) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = VACCINATION_BUCKETS
        .iter()
        .map(|(_, key, label)| CountBucket::zero(key, label))
        .collect();
    for status in statuses {
        if let Some(idx) = VACCINATION_BUCKETS.iter().position(|(s, _, _)| *s == status) {
            buckets[idx].count += 1;
        }
    }
    buckets
}

/// The last bucket of `defs` is the catch-all.
fn tally_text<'a>(
    defs: &[(&str, &str)],
    values: impl IntoIterator<Item = Option<&'a str>>,
) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = defs
        .iter()
        .map(|(key, label)| CountBucket::zero(key, label))
        .collect();
    let fallback = buckets.len() - 1;
    for value in values {
        let idx = value
            .and_then(|v| defs.iter().position(|(key, _)| *key == v))
            .unwrap_or(fallback);
        buckets[idx].count += 1;
    }
    buckets
}

/// Short French month label, e.g. `janv. 2024`.
pub fn month_label(date: NaiveDate) -> String {
    format!("{} {}", FRENCH_MONTHS[date.month0() as usize], date.year())
}

/// Arrival date of a child: entry date, else the day the row was created.
pub fn arrival_date(child: &Child) -> NaiveDate {
    child.entry_date.unwrap_or_else(|| child.created_at.date_naive())
}

/// New arrivals per calendar month with a running total. Dates are sorted
/// first; the running total is carried across months in that order.
pub fn monthly_trend(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<MonthlyPoint> {
    let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
    dates.sort();

    let mut points: Vec<MonthlyPoint> = Vec::new();
    let mut current: Option<(i32, u32)> = None;
    let mut running_total = 0i64;

    for date in dates {
        running_total += 1;
        let key = (date.year(), date.month());
        match points.last_mut() {
            Some(point) if current == Some(key) => {
                point.new_children += 1;
                point.total_children = running_total;
            }
            _ => {
                current = Some(key);
                points.push(MonthlyPoint {
                    month: month_label(date),
                    new_children: 1,
                    total_children: running_total,
                });
            }
        }
    }
    points
}

/// Occupancy against the declared capacity; the rate is 0 when no capacity is declared.
pub fn capacity_utilization(capacity: i64, current_children: i64) -> CapacityStats {
    let utilization_rate = if capacity > 0 {
        (current_children as f64 / capacity as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };
    CapacityStats {
        capacity,
        current_children,
        available_places: (capacity - current_children).max(0),
        utilization_rate,
    }
}

pub fn children_stats(children: &[Child], today: NaiveDate) -> ChildrenStats {
    ChildrenStats {
        total: children.len() as i64,
        gender: gender_tally(children),
        age_groups: age_distribution(children, today),
        parent_status: parent_status_tally(children),
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Fixed dataset served by the public dashboard when the view cannot be read.
pub fn example_public_stats() -> PublicStats {
    PublicStats {
        total_orphanages: 48,
        verified_orphanages: 35,
        total_children: 1_250,
        total_boys: 640,
        total_girls: 610,
        provinces_covered: 12,
    }
}

/// Rows are restricted either to one orphanage (`$1`) or, when `$1` is null, to
/// verified orphanages optionally filtered by province (`$2`).
const SCOPE_FILTER: &str = "($1::uuid IS NULL OR c.orphanage_id = $1)
       AND ($1::uuid IS NOT NULL OR (o.legal_status = 'verified' AND ($2::text IS NULL OR o.province = $2)))";

#[derive(Debug, Clone)]
pub enum StatsScope {
    Orphanage(Uuid),
    Area { province: Option<String> },
}

impl StatsScope {
    fn binds(&self) -> (Option<Uuid>, Option<String>) {
        match self {
            StatsScope::Orphanage(id) => (Some(*id), None),
            StatsScope::Area { province } => (None, province.clone()),
        }
    }
}

/// Raw material of one dashboard, fetched in one go.
struct ScopeRows {
    children: Vec<Child>,
    latest_nutrition: Vec<(String, Option<f64>)>,
    nutrition_records: i64,
    latest_vaccination: Vec<Option<String>>,
    health_records: i64,
    recent_diagnoses: i64,
}

impl ScopeRows {
    fn nutrition(&self) -> NutritionStats {
        let bmis: Vec<f64> = self.latest_nutrition.iter().filter_map(|(_, bmi)| *bmi).collect();
        NutritionStats {
            statuses: nutrition_tally(self.latest_nutrition.iter().map(|(s, _)| Some(s.as_str()))),
            records_count: self.nutrition_records,
            average_bmi: average(&bmis),
        }
    }

    /// Latest status per child; children without any structured record count as unknown.
    fn vaccination(&self) -> Vec<CountBucket> {
        let without_record = (self.children.len() as i64 - self.latest_vaccination.len() as i64).max(0);
        vaccination_tally(
            self.latest_vaccination
                .iter()
                .map(|s| VaccinationStatus::from_stored(s.as_deref()))
                .chain(std::iter::repeat(VaccinationStatus::Unknown).take(without_record as usize)),
        )
    }
}

pub struct StatsService;

impl StatsService {
    async fn fetch_scope(pool: &PgPool, scope: &StatsScope) -> anyhow::Result<ScopeRows> {
        let (orphanage_id, province) = scope.binds();

        let children = sqlx::query_as::<_, Child>(&format!(
            "SELECT c.* FROM children c
             JOIN orphanages o ON o.id = c.orphanage_id
             WHERE {SCOPE_FILTER}
             ORDER BY c.full_name"
        ))
        .bind(orphanage_id)
        .bind(&province)
        .fetch_all(pool)
        .await?;

        let latest_nutrition: Vec<(String, Option<f64>)> = sqlx::query_as(&format!(
            "SELECT DISTINCT ON (n.child_id) n.nutrition_status, n.bmi
             FROM nutrition_records n
             JOIN children c ON c.id = n.child_id
             JOIN orphanages o ON o.id = c.orphanage_id
             WHERE {SCOPE_FILTER}
             ORDER BY n.child_id, n.record_date DESC, n.created_at DESC"
        ))
        .bind(orphanage_id)
        .bind(&province)
        .fetch_all(pool)
        .await?;

        let nutrition_records: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*)::BIGINT FROM nutrition_records n
             JOIN children c ON c.id = n.child_id
             JOIN orphanages o ON o.id = c.orphanage_id
             WHERE {SCOPE_FILTER}"
        ))
        .bind(orphanage_id)
        .bind(&province)
        .fetch_one(pool)
        .await?;

        let latest_vaccination: Vec<Option<String>> = sqlx::query_scalar(&format!(
            "SELECT DISTINCT ON (h.child_id) h.vaccination_status_structured ->> 'status'
             FROM health_records h
             JOIN children c ON c.id = h.child_id
             JOIN orphanages o ON o.id = c.orphanage_id
             WHERE h.vaccination_status_structured IS NOT NULL AND {SCOPE_FILTER}
             ORDER BY h.child_id, h.record_date DESC, h.created_at DESC"
        ))
        .bind(orphanage_id)
        .bind(&province)
        .fetch_all(pool)
        .await?;

        let health_records: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*)::BIGINT FROM health_records h
             JOIN children c ON c.id = h.child_id
             JOIN orphanages o ON o.id = c.orphanage_id
             WHERE {SCOPE_FILTER}"
        ))
        .bind(orphanage_id)
        .bind(&province)
        .fetch_one(pool)
        .await?;

        let recent_diagnoses: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*)::BIGINT FROM child_diseases cd
             JOIN health_records h ON h.id = cd.health_record_id
             JOIN children c ON c.id = cd.child_id
             JOIN orphanages o ON o.id = c.orphanage_id
             WHERE h.record_date >= CURRENT_DATE - 30 AND {SCOPE_FILTER}"
        ))
        .bind(orphanage_id)
        .bind(&province)
        .fetch_one(pool)
        .await?;

        Ok(ScopeRows {
            children,
            latest_nutrition,
            nutrition_records,
            latest_vaccination,
            health_records,
            recent_diagnoses,
        })
    }

    /// Aggregates of one facility (`GET /orphanage-stats`).
    pub async fn orphanage_stats(
        pool: &PgPool,
        orphanage_id: Uuid,
        today: NaiveDate,
    ) -> anyhow::Result<OrphanageStats> {
        let orphanage = sqlx::query_as::<_, OrphanageSummary>(
            "SELECT id, name, province, city, child_capacity FROM orphanages WHERE id = $1",
        )
        .bind(orphanage_id)
        .fetch_one(pool)
        .await?;

        let rows = Self::fetch_scope(pool, &StatsScope::Orphanage(orphanage_id)).await?;

        Ok(OrphanageStats {
            capacity: capacity_utilization(orphanage.child_capacity as i64, rows.children.len() as i64),
            children: children_stats(&rows.children, today),
            nutrition: rows.nutrition(),
            health: HealthStats {
                vaccination: rows.vaccination(),
                records_count: rows.health_records,
                diagnoses_last_30_days: rows.recent_diagnoses,
            },
            trend: monthly_trend(rows.children.iter().map(arrival_date)),
            orphanage,
        })
    }

    /// Aggregates over all verified facilities, optionally one province.
    pub async fn overview(
        pool: &PgPool,
        province: Option<String>,
        today: NaiveDate,
    ) -> anyhow::Result<OverviewStats> {
        let orphanages: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM orphanages
             WHERE legal_status = 'verified' AND ($1::text IS NULL OR province = $1)",
        )
        .bind(&province)
        .fetch_one(pool)
        .await?;

        let rows = Self::fetch_scope(pool, &StatsScope::Area { province: province.clone() }).await?;

        Ok(OverviewStats {
            province,
            orphanages,
            children: children_stats(&rows.children, today),
            nutrition: rows.nutrition(),
            vaccination: rows.vaccination(),
            trend: monthly_trend(rows.children.iter().map(arrival_date)),
        })
    }

    pub async fn public_stats(pool: &PgPool) -> anyhow::Result<PublicStats> {
        let stats = sqlx::query_as::<_, PublicStats>(
            "SELECT total_orphanages, verified_orphanages, total_children,
                    total_boys, total_girls, provinces_covered
             FROM public_stats",
        )
        .fetch_one(pool)
        .await?;
        Ok(stats)
    }

    pub async fn province_stats(pool: &PgPool) -> anyhow::Result<Vec<AreaStats>> {
        let rows = sqlx::query_as::<_, AreaStats>(
            "SELECT province, NULL::TEXT AS city, orphanage_count, verified_count,
                    children_count, boys_count, girls_count
             FROM province_stats
             ORDER BY children_count DESC, province",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn city_stats(pool: &PgPool, province: Option<&str>) -> anyhow::Result<Vec<AreaStats>> {
        let rows = sqlx::query_as::<_, AreaStats>(
            "SELECT province, city, orphanage_count, verified_count,
                    children_count, boys_count, girls_count
             FROM city_stats
             WHERE ($1::text IS NULL OR province = $1)
             ORDER BY province, children_count DESC, city",
        )
        .bind(province)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub(crate) fn child(gender: &str, birth: Option<NaiveDate>, estimated_age: Option<i32>) -> Child {
        Child {
            id: Uuid::new_v4(),
            orphanage_id: Uuid::nil(),
            full_name: "Enfant".into(),
            gender: gender.into(),
            birth_date: birth,
            estimated_age,
            entry_date: None,
            parent_status: "total_orphan".into(),
            internal_code: None,
            photo_url: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn counts(buckets: &[CountBucket]) -> Vec<i64> {
        buckets.iter().map(|b| b.count).collect()
    }

    #[test]
    fn age_uses_year_difference_then_estimate_then_zero() {
        let today = date(2024, 3, 1);
        // Only the year counts, even before the birthday.
        assert_eq!(age_in_years(Some(date(2014, 12, 31)), Some(3), today), 10);
        assert_eq!(age_in_years(None, Some(7), today), 7);
        assert_eq!(age_in_years(None, None, today), 0);
        assert_eq!(age_in_years(Some(date(2025, 1, 1)), None, today), 0);
    }

    #[test]
    fn boundary_ages_fall_in_the_lower_bucket() {
        assert_eq!(age_bucket_label(0), "0-2 ans");
        assert_eq!(age_bucket_label(2), "0-2 ans");
        assert_eq!(age_bucket_label(3), "3-5 ans");
        assert_eq!(age_bucket_label(5), "3-5 ans");
        assert_eq!(age_bucket_label(6), "6-10 ans");
        assert_eq!(age_bucket_label(10), "6-10 ans");
        assert_eq!(age_bucket_label(11), "11-15 ans");
        assert_eq!(age_bucket_label(15), "11-15 ans");
        assert_eq!(age_bucket_label(16), "16+ ans");
        assert_eq!(age_bucket_label(40), "16+ ans");
    }

    #[test]
    fn birth_dates_on_boundaries_bucket_correctly() {
        let today = date(2024, 6, 1);
        let children: Vec<Child> = [2022, 2021, 2019, 2014, 2009]
            .iter()
            .map(|y| child("M", Some(date(*y, 1, 1)), None))
            .collect();
        // ages 2, 3, 5, 10, 15
        assert_eq!(counts(&age_distribution(&children, today)), vec![1, 2, 1, 1, 0]);
    }

    #[test]
    fn gender_tally_labels() {
        let children = vec![child("M", None, Some(4)), child("F", None, Some(4)), child("F", None, Some(9))];
        let buckets = gender_tally(&children);
        assert_eq!(buckets[0].label, "Garçons");
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].label, "Filles");
        assert_eq!(buckets[1].count, 2);
    }

    #[test]
    fn empty_input_keeps_every_bucket_at_zero() {
        let today = date(2024, 6, 1);
        let stats = children_stats(&[], today);
        assert_eq!(stats.total, 0);
        assert_eq!(counts(&stats.gender), vec![0, 0]);
        assert_eq!(counts(&stats.age_groups), vec![0; 5]);
        assert_eq!(counts(&stats.parent_status), vec![0; 4]);
        assert_eq!(counts(&nutrition_tally(std::iter::empty())), vec![0; 4]);
        assert_eq!(counts(&vaccination_tally(std::iter::empty())), vec![0; 4]);
        assert!(monthly_trend(std::iter::empty()).is_empty());
    }

    #[test]
    fn unknown_statuses_go_to_the_catch_all() {
        let buckets = nutrition_tally([Some("normal"), Some("underweight"), None, Some("severely_malnourished")]);
        assert_eq!(counts(&buckets), vec![1, 0, 1, 2]);
        assert_eq!(buckets[3].key, "unknown");
    }

    #[test]
    fn vaccination_tally_counts_each_status() {
        let buckets = vaccination_tally([
            VaccinationStatus::Vaccinated,
            VaccinationStatus::NotVaccinated,
            VaccinationStatus::NotVaccinated,
            VaccinationStatus::Unknown,
        ]);
        assert_eq!(counts(&buckets), vec![1, 0, 2, 1]);
    }

    #[test]
    fn monthly_trend_sorts_then_accumulates() {
        let trend = monthly_trend([
            date(2024, 3, 5),
            date(2024, 1, 20),
            date(2024, 3, 1),
            date(2023, 12, 31),
            date(2024, 1, 2),
        ]);
        let months: Vec<&str> = trend.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["déc. 2023", "janv. 2024", "mars 2024"]);
        assert_eq!(trend.iter().map(|p| p.new_children).collect::<Vec<_>>(), vec![1, 2, 2]);
        assert_eq!(trend.iter().map(|p| p.total_children).collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn running_total_never_decreases() {
        let dates: Vec<NaiveDate> = (0..40)
            .map(|i| date(2022 + (i % 3), 1 + (i as u32 * 7) % 12, 1 + (i as u32 % 27)))
            .collect();
        let trend = monthly_trend(dates);
        assert!(trend.windows(2).all(|w| w[1].total_children >= w[0].total_children));
        assert_eq!(trend.last().unwrap().total_children, 40);
    }

    #[test]
    fn arrival_falls_back_to_creation_date() {
        let mut c = child("F", None, Some(3));
        assert_eq!(arrival_date(&c), date(2024, 1, 10));
        c.entry_date = Some(date(2023, 5, 4));
        assert_eq!(arrival_date(&c), date(2023, 5, 4));
    }

    #[test]
    fn capacity_utilization_rounds_to_one_decimal() {
        let stats = capacity_utilization(30, 20);
        assert_eq!(stats.utilization_rate, 66.7);
        assert_eq!(stats.available_places, 10);

        let over = capacity_utilization(10, 12);
        assert_eq!(over.utilization_rate, 120.0);
        assert_eq!(over.available_places, 0);

        assert_eq!(capacity_utilization(0, 5).utilization_rate, 0.0);
    }

    #[test]
    fn scope_rows_count_children_without_vaccination_as_unknown() {
        let rows = ScopeRows {
            children: vec![child("M", None, Some(1)), child("F", None, Some(2)), child("F", None, Some(3))],
            latest_nutrition: vec![("normal".into(), Some(15.0)), ("malnourished".into(), Some(12.0))],
            nutrition_records: 5,
            latest_vaccination: vec![Some("vaccinated".into())],
            health_records: 1,
            recent_diagnoses: 0,
        };
        assert_eq!(counts(&rows.vaccination()), vec![1, 0, 0, 2]);
        let nutrition = rows.nutrition();
        assert_eq!(nutrition.average_bmi, Some(13.5));
        assert_eq!(counts(&nutrition.statuses), vec![1, 1, 0, 0]);
    }
}
