use sqlx::PgPool;
use uuid::Uuid;

use crate::models::nutrition::{NutritionPayload, NutritionRecord};

pub struct NutritionService;

impl NutritionService {
    pub async fn list(pool: &PgPool, orphanage_id: Uuid, child_id: Uuid) -> anyhow::Result<Vec<NutritionRecord>> {
        // Ownership check first so another facility's child answers 404, not [].
        sqlx::query("SELECT 1 FROM children WHERE id = $1 AND orphanage_id = $2")
            .bind(child_id)
            .bind(orphanage_id)
            .fetch_one(pool)
            .await?;

        let rows = sqlx::query_as::<_, NutritionRecord>(
            "SELECT * FROM nutrition_records
             WHERE child_id = $1
             ORDER BY record_date DESC, created_at DESC",
        )
        .bind(child_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// BMI is always derived from the submitted weight and height.
    pub async fn create(
        pool: &PgPool,
        orphanage_id: Uuid,
        child_id: Uuid,
        payload: &NutritionPayload,
    ) -> anyhow::Result<NutritionRecord> {
        let record = sqlx::query_as::<_, NutritionRecord>(
            "INSERT INTO nutrition_records
                (child_id, record_date, weight_kg, height_cm, bmi, nutrition_status, notes)
             SELECT c.id, $3, $4, $5, $6, $7, $8
             FROM children c
             WHERE c.id = $1 AND c.orphanage_id = $2
             RETURNING *",
        )
        .bind(child_id)
        .bind(orphanage_id)
        .bind(payload.record_date)
        .bind(payload.weight_kg)
        .bind(payload.height_cm)
        .bind(payload.bmi())
        .bind(payload.nutrition_status.to_string())
        .bind(&payload.notes)
        .fetch_one(pool)
        .await?;
        Ok(record)
    }

    pub async fn update(
        pool: &PgPool,
        orphanage_id: Uuid,
        id: Uuid,
        payload: &NutritionPayload,
    ) -> anyhow::Result<NutritionRecord> {
        let record = sqlx::query_as::<_, NutritionRecord>(
            "UPDATE nutrition_records n
             SET record_date      = $1,
                 weight_kg        = $2,
                 height_cm        = $3,
                 bmi              = $4,
                 nutrition_status = $5,
                 notes            = $6,
                 updated_at       = NOW()
             FROM children c
             WHERE n.id = $7 AND c.id = n.child_id AND c.orphanage_id = $8
             RETURNING n.*",
        )
        .bind(payload.record_date)
        .bind(payload.weight_kg)
        .bind(payload.height_cm)
        .bind(payload.bmi())
        .bind(payload.nutrition_status.to_string())
        .bind(&payload.notes)
        .bind(id)
        .bind(orphanage_id)
        .fetch_one(pool)
        .await?;
        Ok(record)
    }

    pub async fn delete(pool: &PgPool, orphanage_id: Uuid, id: Uuid) -> anyhow::Result<()> {
        let result = sqlx::query(
            "DELETE FROM nutrition_records n
             USING children c
             WHERE n.id = $1 AND c.id = n.child_id AND c.orphanage_id = $2",
        )
        .bind(id)
        .bind(orphanage_id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }
}
