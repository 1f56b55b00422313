use sqlx::PgPool;

use crate::models::{
    health::Disease,
    reference::{City, Province},
};

/// Read-only lists feeding the form dropdowns.
pub struct ReferenceService;

impl ReferenceService {
    pub async fn provinces(pool: &PgPool) -> anyhow::Result<Vec<Province>> {
        let rows = sqlx::query_as::<_, Province>("SELECT id, name FROM provinces ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Cities of one province; an unknown province id is not found.
    pub async fn cities(pool: &PgPool, province_id: i32) -> anyhow::Result<Vec<City>> {
        sqlx::query("SELECT 1 FROM provinces WHERE id = $1")
            .bind(province_id)
            .fetch_one(pool)
            .await?;

        let rows = sqlx::query_as::<_, City>(
            "SELECT id, province_id, name FROM cities WHERE province_id = $1 ORDER BY name",
        )
        .bind(province_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn diseases(pool: &PgPool) -> anyhow::Result<Vec<Disease>> {
        let rows = sqlx::query_as::<_, Disease>("SELECT id, name, category FROM diseases ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}
