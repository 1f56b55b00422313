use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::health::{
    ChildDisease, DiagnosisEntry, HealthRecord, HealthRecordPayload, HealthRecordWithDiseases,
};

const DISEASE_COLUMNS: &str = "cd.id, cd.health_record_id, cd.child_id, cd.disease_id,
    d.name AS disease_name, cd.severity, cd.notes, cd.created_at";

pub struct HealthService;

impl HealthService {
    /// Records of one child, most recent first, each with its diagnoses.
    pub async fn list(
        pool: &PgPool,
        orphanage_id: Uuid,
        child_id: Uuid,
    ) -> anyhow::Result<Vec<HealthRecordWithDiseases>> {
        let records = sqlx::query_as::<_, HealthRecord>(
            "SELECT h.* FROM health_records h
             JOIN children c ON c.id = h.child_id
             WHERE h.child_id = $1 AND c.orphanage_id = $2
             ORDER BY h.record_date DESC, h.created_at DESC",
        )
        .bind(child_id)
        .bind(orphanage_id)
        .fetch_all(pool)
        .await?;

        if records.is_empty() {
            // Distinguishes "no records yet" from "not your child".
            sqlx::query("SELECT 1 FROM children WHERE id = $1 AND orphanage_id = $2")
                .bind(child_id)
                .bind(orphanage_id)
                .fetch_one(pool)
                .await?;
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let diseases = sqlx::query_as::<_, ChildDisease>(&format!(
            "SELECT {DISEASE_COLUMNS}
             FROM child_diseases cd
             JOIN diseases d ON d.id = cd.disease_id
             WHERE cd.health_record_id = ANY($1)
             ORDER BY d.name"
        ))
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        Ok(attach_diseases(records, diseases))
    }

    /// Inserts the record and its diagnoses in one transaction.
    pub async fn create(
        pool: &PgPool,
        orphanage_id: Uuid,
        child_id: Uuid,
        payload: &HealthRecordPayload,
    ) -> anyhow::Result<HealthRecordWithDiseases> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT 1 FROM children WHERE id = $1 AND orphanage_id = $2")
            .bind(child_id)
            .bind(orphanage_id)
            .fetch_one(&mut *tx)
            .await?;

        let record = sqlx::query_as::<_, HealthRecord>(
            "INSERT INTO health_records
                (child_id, record_date, vaccination_status_structured,
                 chronic_conditions, medications, remarks)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(child_id)
        .bind(payload.record_date)
        .bind(payload.vaccination_status_structured.clone().map(Json))
        .bind(&payload.chronic_conditions)
        .bind(&payload.medications)
        .bind(&payload.remarks)
        .fetch_one(&mut *tx)
        .await?;

        let diseases = insert_diagnoses(&mut *tx, &record, &payload.diseases).await?;
        tx.commit().await?;

        Ok(HealthRecordWithDiseases { record, diseases })
    }

    /// Facility owning a health record, through its child.
    pub async fn owner(pool: &PgPool, record_id: Uuid) -> anyhow::Result<Uuid> {
        let orphanage_id: Uuid = sqlx::query_scalar(
            "SELECT c.orphanage_id FROM health_records h
             JOIN children c ON c.id = h.child_id
             WHERE h.id = $1",
        )
        .bind(record_id)
        .fetch_one(pool)
        .await?;
        Ok(orphanage_id)
    }

    /// Replaces the record fields and its whole diagnosis list (delete then
    /// reinsert) in one transaction.
    pub async fn replace(
        pool: &PgPool,
        record_id: Uuid,
        payload: &HealthRecordPayload,
    ) -> anyhow::Result<HealthRecordWithDiseases> {
        let mut tx = pool.begin().await?;

        let record = sqlx::query_as::<_, HealthRecord>(
            "UPDATE health_records
             SET record_date                   = $1,
                 vaccination_status_structured = $2,
                 chronic_conditions            = $3,
                 medications                   = $4,
                 remarks                       = $5,
                 updated_at                    = NOW()
             WHERE id = $6
             RETURNING *",
        )
        .bind(payload.record_date)
        .bind(payload.vaccination_status_structured.clone().map(Json))
        .bind(&payload.chronic_conditions)
        .bind(&payload.medications)
        .bind(&payload.remarks)
        .bind(record_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM child_diseases WHERE health_record_id = $1")
            .bind(record_id)
            .execute(&mut *tx)
            .await?;

        let diseases = insert_diagnoses(&mut *tx, &record, &payload.diseases).await?;
        tx.commit().await?;

        tracing::info!("Health record {} replaced ({} diagnosis rows)", record.id, diseases.len());
        Ok(HealthRecordWithDiseases { record, diseases })
    }

    pub async fn delete(pool: &PgPool, orphanage_id: Uuid, record_id: Uuid) -> anyhow::Result<()> {
        let result = sqlx::query(
            "DELETE FROM health_records h
             USING children c
             WHERE h.id = $1 AND c.id = h.child_id AND c.orphanage_id = $2",
        )
        .bind(record_id)
        .bind(orphanage_id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }
}

async fn insert_diagnoses(
    conn: &mut PgConnection,
    record: &HealthRecord,
    entries: &[DiagnosisEntry],
) -> anyhow::Result<Vec<ChildDisease>> {
    for entry in entries {
        sqlx::query(
            "INSERT INTO child_diseases (health_record_id, child_id, disease_id, severity, notes)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id)
        .bind(record.child_id)
        .bind(entry.disease_id)
        .bind(entry.severity.to_string())
        .bind(&entry.notes)
        .execute(&mut *conn)
        .await?;
    }

    let rows = sqlx::query_as::<_, ChildDisease>(&format!(
        "SELECT {DISEASE_COLUMNS}
         FROM child_diseases cd
         JOIN diseases d ON d.id = cd.disease_id
         WHERE cd.health_record_id = $1
         ORDER BY d.name"
    ))
    .bind(record.id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

fn attach_diseases(records: Vec<HealthRecord>, diseases: Vec<ChildDisease>) -> Vec<HealthRecordWithDiseases> {
    records
        .into_iter()
        .map(|record| {
            let diseases = diseases
                .iter()
                .filter(|d| d.health_record_id == record.id)
                .cloned()
                .collect();
            HealthRecordWithDiseases { record, diseases }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn record(date: (i32, u32, u32)) -> HealthRecord {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        HealthRecord {
            id: Uuid::new_v4(),
            child_id: Uuid::nil(),
            record_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            vaccination_status_structured: None,
            chronic_conditions: None,
            medications: None,
            remarks: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn diagnosis(record_id: Uuid, name: &str) -> ChildDisease {
        ChildDisease {
            id: Uuid::new_v4(),
            health_record_id: record_id,
            child_id: Uuid::nil(),
            disease_id: 1,
            disease_name: name.into(),
            severity: "mild".into(),
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn diagnoses_attach_to_their_record_in_order() {
        let first = record((2024, 6, 1));
        let second = record((2024, 5, 1));
        let diseases = vec![
            diagnosis(second.id, "Paludisme"),
            diagnosis(first.id, "Grippe"),
            diagnosis(second.id, "Typhoïde"),
        ];
        let merged = attach_diseases(vec![first.clone(), second.clone()], diseases);

        assert_eq!(merged[0].record.id, first.id);
        assert_eq!(merged[0].diseases.len(), 1);
        let names: Vec<&str> = merged[1].diseases.iter().map(|d| d.disease_name.as_str()).collect();
        assert_eq!(names, vec!["Paludisme", "Typhoïde"]);
    }

    #[test]
    fn record_serializes_flat_with_diseases() {
        let r = record((2024, 6, 1));
        let merged = attach_diseases(vec![r.clone()], vec![diagnosis(r.id, "Grippe")]);
        let json = serde_json::to_value(&merged[0]).unwrap();
        assert_eq!(json["record_date"], "2024-06-01");
        assert_eq!(json["diseases"][0]["disease_name"], "Grippe");
    }
}
