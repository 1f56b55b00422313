//! Threshold rules over diagnosis and vaccination rows.
//!
//! Alerts are recomputed on every call and only persisted when an admin
//! publishes them to the notification feed.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    alert::{AlertKind, DiagnosisRow, HealthAlert, VaccinationRow},
    health::VaccinationStatus,
    notification::{NewNotification, Priority},
};
use crate::services::{metrics::HEALTH_ALERTS_COUNTER, notifications::NotificationService};

pub const OUTBREAK_WINDOW_DAYS: i64 = 30;
pub const OUTBREAK_MIN_CASES: i64 = 3;
pub const OUTBREAK_CRITICAL_CASES: i64 = 5;
pub const GAP_MIN_UNVACCINATED: i64 = 3;
pub const GAP_MIN_PERCENT: f64 = 30.0;
pub const GAP_CRITICAL_PERCENT: f64 = 50.0;

/// Groups recent diagnoses by (facility, disease) in first-seen order.
pub fn detect_outbreaks(rows: &[DiagnosisRow], today: NaiveDate) -> Vec<HealthAlert> {
    let since = today - Duration::days(OUTBREAK_WINDOW_DAYS);
    let mut groups: Vec<(Uuid, &str, &str, i64)> = Vec::new();

    for row in rows.iter().filter(|r| r.record_date >= since) {
        match groups
            .iter_mut()
            .find(|(id, _, disease, _)| *id == row.orphanage_id && *disease == row.disease_name)
        {
            Some(group) => group.3 += 1,
            None => groups.push((row.orphanage_id, row.orphanage_name.as_str(), row.disease_name.as_str(), 1)),
        }
    }

    groups
        .into_iter()
        .filter(|(_, _, _, count)| *count >= OUTBREAK_MIN_CASES)
        .map(|(orphanage_id, orphanage_name, disease, count)| HealthAlert {
            kind: AlertKind::DiseaseOutbreak,
            severity: if count >= OUTBREAK_CRITICAL_CASES {
                Priority::Critical
            } else {
                Priority::High
            },
            orphanage_id,
            orphanage_name: orphanage_name.to_string(),
            disease: Some(disease.to_string()),
            case_count: count,
            affected_percentage: None,
            message: format!("{count} cases of {disease} reported at {orphanage_name} this month"),
        })
        .collect()
}

#[derive(Debug)]
struct FacilityTally<'a> {
    orphanage_id: Uuid,
    orphanage_name: &'a str,
    children: i64,
    not_vaccinated: i64,
}

/// Rows must arrive most recent first: only the first row seen per child counts.
pub fn detect_vaccination_gaps(rows: &[VaccinationRow]) -> Vec<HealthAlert> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut facilities: Vec<FacilityTally> = Vec::new();

    for row in rows {
        if !seen.insert(row.child_id) {
            continue;
        }
        let idx = match facilities.iter().position(|f| f.orphanage_id == row.orphanage_id) {
            Some(idx) => idx,
            None => {
                facilities.push(FacilityTally {
                    orphanage_id: row.orphanage_id,
                    orphanage_name: &row.orphanage_name,
                    children: 0,
                    not_vaccinated: 0,
                });
                facilities.len() - 1
            }
        };
        let tally = &mut facilities[idx];
        tally.children += 1;
        if VaccinationStatus::from_stored(row.status.as_deref()) == VaccinationStatus::NotVaccinated {
            tally.not_vaccinated += 1;
        }
    }

    facilities
        .into_iter()
        .filter_map(|f| {
            let percent = f.not_vaccinated as f64 / f.children as f64 * 100.0;
            if percent <= GAP_MIN_PERCENT || f.not_vaccinated < GAP_MIN_UNVACCINATED {
                return None;
            }
            let rounded = (percent * 10.0).round() / 10.0;
            Some(HealthAlert {
                kind: AlertKind::VaccinationGap,
                severity: if percent > GAP_CRITICAL_PERCENT {
                    Priority::Critical
                } else {
                    Priority::High
                },
                orphanage_id: f.orphanage_id,
                orphanage_name: f.orphanage_name.to_string(),
                disease: None,
                case_count: f.not_vaccinated,
                affected_percentage: Some(rounded),
                message: format!(
                    "{} of {} children at {} are not vaccinated ({rounded:.1}%)",
                    f.not_vaccinated, f.children, f.orphanage_name
                ),
            })
        })
        .collect()
}

/// Most severe first; the sort is stable.
pub fn sort_alerts(alerts: &mut [HealthAlert]) {
    alerts.sort_by_key(|a| a.severity);
}

/// Outbreaks then gaps, ordered by severity.
pub fn derive_alerts(diagnoses: &[DiagnosisRow], vaccinations: &[VaccinationRow], today: NaiveDate) -> Vec<HealthAlert> {
    let mut alerts = detect_outbreaks(diagnoses, today);
    alerts.extend(detect_vaccination_gaps(vaccinations));
    sort_alerts(&mut alerts);
    alerts
}

pub struct AlertService;

impl AlertService {
    pub async fn derive(pool: &PgPool, today: NaiveDate) -> anyhow::Result<Vec<HealthAlert>> {
        let since = today - Duration::days(OUTBREAK_WINDOW_DAYS);

        let diagnoses = sqlx::query_as::<_, DiagnosisRow>(
            "SELECT o.id AS orphanage_id, o.name AS orphanage_name,
                    d.name AS disease_name, h.record_date
             FROM child_diseases cd
             JOIN diseases d ON d.id = cd.disease_id
             JOIN health_records h ON h.id = cd.health_record_id
             JOIN children c ON c.id = cd.child_id
             JOIN orphanages o ON o.id = c.orphanage_id
             WHERE h.record_date >= $1
             ORDER BY h.record_date DESC, cd.created_at DESC",
        )
        .bind(since)
        .fetch_all(pool)
        .await?;

        let vaccinations = sqlx::query_as::<_, VaccinationRow>(
            "SELECT o.id AS orphanage_id, o.name AS orphanage_name, h.child_id,
                    h.vaccination_status_structured ->> 'status' AS status
             FROM health_records h
             JOIN children c ON c.id = h.child_id
             JOIN orphanages o ON o.id = c.orphanage_id
             WHERE h.vaccination_status_structured IS NOT NULL
             ORDER BY h.record_date DESC, h.created_at DESC",
        )
        .fetch_all(pool)
        .await?;

        let alerts = derive_alerts(&diagnoses, &vaccinations, today);
        for alert in &alerts {
            HEALTH_ALERTS_COUNTER
                .with_label_values(&[alert.kind.as_str(), &alert.severity.to_string()])
                .inc();
        }
        Ok(alerts)
    }

    /// Writes one notification per alert per admin; returns the number of rows written.
    pub async fn publish(pool: &PgPool, alerts: &[HealthAlert]) -> anyhow::Result<u64> {
        let mut tx = pool.begin().await?;
        let mut written = 0;
        for alert in alerts {
            let title = match alert.kind {
                AlertKind::DiseaseOutbreak => "Alerte épidémique",
                AlertKind::VaccinationGap => "Couverture vaccinale insuffisante",
            };
            written += NotificationService::notify_admins(
                &mut *tx,
                &NewNotification {
                    title: title.to_string(),
                    message: alert.message.clone(),
                    notification_type: "health_alert",
                    priority: alert.severity,
                    related_id: Some(alert.orphanage_id),
                },
            )
            .await?;
        }
        tx.commit().await?;
        info!("Published {} health alert(s) as {} notification(s)", alerts.len(), written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn diagnosis(facility: Uuid, disease: &str, days_ago: i64) -> DiagnosisRow {
        DiagnosisRow {
            orphanage_id: facility,
            orphanage_name: "Maison Espoir".into(),
            disease_name: disease.into(),
            record_date: today() - Duration::days(days_ago),
        }
    }

    fn vaccination(facility: Uuid, child: Uuid, status: &str) -> VaccinationRow {
        VaccinationRow {
            orphanage_id: facility,
            orphanage_name: "Centre Bethel".into(),
            child_id: child,
            status: Some(status.into()),
        }
    }

    fn alert(severity: Priority) -> HealthAlert {
        HealthAlert {
            kind: AlertKind::DiseaseOutbreak,
            severity,
            orphanage_id: Uuid::new_v4(),
            orphanage_name: "X".into(),
            disease: None,
            case_count: 0,
            affected_percentage: None,
            message: String::new(),
        }
    }

    #[test]
    fn outbreak_thresholds() {
        let facility = Uuid::new_v4();

        let two: Vec<_> = (0..2).map(|_| diagnosis(facility, "Paludisme", 1)).collect();
        assert!(detect_outbreaks(&two, today()).is_empty());

        let three: Vec<_> = (0..3).map(|_| diagnosis(facility, "Paludisme", 1)).collect();
        let alerts = detect_outbreaks(&three, today());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Priority::High);
        assert_eq!(alerts[0].message, "3 cases of Paludisme reported at Maison Espoir this month");

        let five: Vec<_> = (0..5).map(|_| diagnosis(facility, "Paludisme", 1)).collect();
        assert_eq!(detect_outbreaks(&five, today())[0].severity, Priority::Critical);
    }

    #[test]
    fn outbreak_groups_by_facility_and_disease_within_window() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let rows = vec![
            diagnosis(a, "Rougeole", 2),
            diagnosis(b, "Rougeole", 2),
            diagnosis(a, "Rougeole", 10),
            diagnosis(a, "Choléra", 3),
            diagnosis(a, "Rougeole", 45),
        ];
        // The 45-day-old case is outside the window.
        assert!(detect_outbreaks(&rows, today()).is_empty());

        let mut rows = rows;
        rows.push(diagnosis(a, "Rougeole", 29));
        let alerts = detect_outbreaks(&rows, today());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].orphanage_id, a);
        assert_eq!(alerts[0].case_count, 3);
    }

    #[test]
    fn vaccination_gap_at_forty_percent_is_high() {
        let facility = Uuid::new_v4();
        let rows: Vec<_> = (0..10)
            .map(|i| {
                let status = if i < 4 { "not_vaccinated" } else { "vaccinated" };
                vaccination(facility, Uuid::new_v4(), status)
            })
            .collect();
        let alerts = detect_vaccination_gaps(&rows);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Priority::High);
        assert_eq!(alerts[0].case_count, 4);
        assert_eq!(alerts[0].affected_percentage, Some(40.0));
    }

    #[test]
    fn vaccination_gap_needs_three_unvaccinated_children() {
        let facility = Uuid::new_v4();
        let rows = vec![
            vaccination(facility, Uuid::new_v4(), "not_vaccinated"),
            vaccination(facility, Uuid::new_v4(), "not_vaccinated"),
            vaccination(facility, Uuid::new_v4(), "vaccinated"),
        ];
        assert!(detect_vaccination_gaps(&rows).is_empty());

        let mut rows = rows;
        rows.push(vaccination(facility, Uuid::new_v4(), "not_vaccinated"));
        let alerts = detect_vaccination_gaps(&rows);
        assert_eq!(alerts[0].severity, Priority::Critical);
    }

    #[test]
    fn only_the_first_record_per_child_counts() {
        let facility = Uuid::new_v4();
        let child = Uuid::new_v4();
        let mut rows = vec![
            vaccination(facility, child, "vaccinated"),
            vaccination(facility, child, "not_vaccinated"),
        ];
        rows.extend((0..3).map(|_| vaccination(facility, Uuid::new_v4(), "not_vaccinated")));
        rows.extend((0..4).map(|_| vaccination(facility, Uuid::new_v4(), "vaccinated")));

        let alerts = detect_vaccination_gaps(&rows);
        // 8 distinct children, 3 not vaccinated: 37.5 %
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].case_count, 3);
        assert_eq!(alerts[0].affected_percentage, Some(37.5));
    }

    #[test]
    fn alerts_are_ordered_most_severe_first() {
        let mut alerts = vec![
            alert(Priority::Low),
            alert(Priority::Critical),
            alert(Priority::Medium),
            alert(Priority::High),
        ];
        sort_alerts(&mut alerts);
        let order: Vec<Priority> = alerts.iter().map(|a| a.severity).collect();
        assert_eq!(order, vec![Priority::Critical, Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn outbreaks_precede_gaps_of_equal_severity() {
        let facility = Uuid::new_v4();
        let diagnoses: Vec<_> = (0..3).map(|_| diagnosis(facility, "Typhoïde", 0)).collect();
        let vaccinations: Vec<_> = (0..10)
            .map(|i| {
                let status = if i < 4 { "not_vaccinated" } else { "vaccinated" };
                vaccination(facility, Uuid::new_v4(), status)
            })
            .collect();
        let alerts = derive_alerts(&diagnoses, &vaccinations, today());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::DiseaseOutbreak);
        assert_eq!(alerts[1].kind, AlertKind::VaccinationGap);
    }

    #[test]
    fn empty_rows_derive_nothing() {
        assert!(derive_alerts(&[], &[], today()).is_empty());
    }
}
