use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::child::{Child, CreateChildRequest, UpdateChildRequest};

/// Every query is scoped by `orphanage_id`; a child of another facility is not found.
pub struct ChildService;

impl ChildService {
    pub async fn list(pool: &PgPool, orphanage_id: Uuid) -> anyhow::Result<Vec<Child>> {
        let children = sqlx::query_as::<_, Child>(
            "SELECT * FROM children WHERE orphanage_id = $1 ORDER BY full_name",
        )
        .bind(orphanage_id)
        .fetch_all(pool)
        .await?;
        Ok(children)
    }

    pub async fn get(pool: &PgPool, orphanage_id: Uuid, id: Uuid) -> anyhow::Result<Child> {
        let child = sqlx::query_as::<_, Child>(
            "SELECT * FROM children WHERE id = $1 AND orphanage_id = $2",
        )
        .bind(id)
        .bind(orphanage_id)
        .fetch_one(pool)
        .await?;
        Ok(child)
    }

    pub async fn create(pool: &PgPool, orphanage_id: Uuid, req: &CreateChildRequest) -> anyhow::Result<Child> {
        let child = sqlx::query_as::<_, Child>(
            "INSERT INTO children
                (orphanage_id, full_name, gender, birth_date, estimated_age, entry_date,
                 parent_status, internal_code, photo_url, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(orphanage_id)
        .bind(req.full_name.trim())
        .bind(req.gender.to_string())
        .bind(req.birth_date)
        .bind(req.estimated_age)
        .bind(req.entry_date)
        .bind(req.parent_status.to_string())
        .bind(&req.internal_code)
        .bind(&req.photo_url)
        .bind(&req.notes)
        .fetch_one(pool)
        .await?;
        Ok(child)
    }

    pub async fn update(
        pool: &PgPool,
        orphanage_id: Uuid,
        id: Uuid,
        req: &UpdateChildRequest,
    ) -> anyhow::Result<Child> {
        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, Child>(
            "SELECT * FROM children WHERE id = $1 AND orphanage_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(orphanage_id)
        .fetch_one(&mut *tx)
        .await?;
        req.check_dates_against(&current).map_err(ApiError::Validation)?;

        let child = sqlx::query_as::<_, Child>(
            "UPDATE children
             SET full_name     = COALESCE($1, full_name),
                 gender        = COALESCE($2, gender),
                 birth_date    = COALESCE($3, birth_date),
                 estimated_age = COALESCE($4, estimated_age),
                 entry_date    = COALESCE($5, entry_date),
                 parent_status = COALESCE($6, parent_status),
                 internal_code = COALESCE($7, internal_code),
                 photo_url     = COALESCE($8, photo_url),
                 notes         = COALESCE($9, notes),
                 updated_at    = NOW()
             WHERE id = $10 AND orphanage_id = $11
             RETURNING *",
        )
        .bind(req.full_name.as_deref().map(str::trim))
        .bind(req.gender.map(|g| g.to_string()))
        .bind(req.birth_date)
        .bind(req.estimated_age)
        .bind(req.entry_date)
        .bind(req.parent_status.map(|p| p.to_string()))
        .bind(&req.internal_code)
        .bind(&req.photo_url)
        .bind(&req.notes)
        .bind(id)
        .bind(orphanage_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(child)
    }

    pub async fn delete(pool: &PgPool, orphanage_id: Uuid, id: Uuid) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM children WHERE id = $1 AND orphanage_id = $2")
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
