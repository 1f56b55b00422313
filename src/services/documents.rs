use chrono::{Duration, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::document::{DocumentPayload, DocumentQuery, OrphanageDocument};

/// Legal documents are stored by URL; uploads happen in external storage.
pub struct DocumentService;

impl DocumentService {
    pub async fn list(
        pool: &PgPool,
        orphanage_id: Uuid,
        query: &DocumentQuery,
    ) -> anyhow::Result<Vec<OrphanageDocument>> {
        let docs = sqlx::query_as::<_, OrphanageDocument>(
            "SELECT * FROM orphanage_documents
             WHERE orphanage_id = $1 AND ($2::text IS NULL OR doc_type = $2)
             ORDER BY created_at DESC",
        )
        .bind(orphanage_id)
        .bind(query.doc_type.map(|t| t.to_string()))
        .fetch_all(pool)
        .await?;
        Ok(docs)
    }

    pub async fn create(
        pool: &PgPool,
        orphanage_id: Uuid,
        uploaded_by: Uuid,
        payload: &DocumentPayload,
    ) -> anyhow::Result<OrphanageDocument> {
        let doc = sqlx::query_as::<_, OrphanageDocument>(
            "INSERT INTO orphanage_documents (orphanage_id, title, doc_type, file_url, expiry_date, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(orphanage_id)
        .bind(payload.title.trim())
        .bind(payload.doc_type.to_string())
        .bind(&payload.file_url)
        .bind(payload.expiry_date)
        .bind(uploaded_by)
        .fetch_one(pool)
        .await?;
        Ok(doc)
    }

    pub async fn update(
        pool: &PgPool,
        orphanage_id: Uuid,
        id: Uuid,
        payload: &DocumentPayload,
    ) -> anyhow::Result<OrphanageDocument> {
        let doc = sqlx::query_as::<_, OrphanageDocument>(
            "UPDATE orphanage_documents
             SET title       = $1,
                 doc_type    = $2,
                 file_url    = $3,
                 expiry_date = $4,
                 updated_at  = NOW()
             WHERE id = $5 AND orphanage_id = $6
             RETURNING *",
        )
        .bind(payload.title.trim())
        .bind(payload.doc_type.to_string())
        .bind(&payload.file_url)
        .bind(payload.expiry_date)
        .bind(id)
        .bind(orphanage_id)
        .fetch_one(pool)
        .await?;
        Ok(doc)
    }

    pub async fn delete(pool: &PgPool, orphanage_id: Uuid, id: Uuid) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM orphanage_documents WHERE id = $1 AND orphanage_id = $2")
            .bind(id)
            .bind(orphanage_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    /// Documents expiring between `today` and `today + days`, already expired ones included.
    pub async fn expiring(
        pool: &PgPool,
        orphanage_id: Uuid,
        today: NaiveDate,
        days: i64,
    ) -> anyhow::Result<Vec<OrphanageDocument>> {
        let docs = sqlx::query_as::<_, OrphanageDocument>(
            "SELECT * FROM orphanage_documents
             WHERE orphanage_id = $1 AND expiry_date IS NOT NULL AND expiry_date <= $2
             ORDER BY expiry_date",
        )
        .bind(orphanage_id)
        .bind(expiry_horizon(today, days))
        .fetch_all(pool)
        .await?;
        Ok(docs)
    }
}

/// Last expiry date included in the window; `days` is clamped to 0..=365.
pub fn expiry_horizon(today: NaiveDate, days: i64) -> NaiveDate {
    today + Duration::days(days.clamp(0, 365))
}
