use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::notification::{NewNotification, Notification, NotificationQuery};

pub struct NotificationService;

impl NotificationService {
    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        query: &NotificationQuery,
    ) -> anyhow::Result<Vec<Notification>> {
        let limit = query.limit.unwrap_or(50).clamp(1, 200);
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications
             WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(user_id)
        .bind(query.unread_only.unwrap_or(false))
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Marks one notification of `user_id` as read; another user's row is not found.
    pub async fn mark_read(pool: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// One row per active admin. Accepts a pool or an open transaction.
    pub async fn notify_admins<'e, E>(executor: E, notification: &NewNotification) -> anyhow::Result<u64>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, title, message, notification_type, priority, related_id)
             SELECT id, $1, $2, $3, $4, $5 FROM users
             WHERE role = 'admin' AND is_active = TRUE",
        )
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.notification_type)
        .bind(notification.priority.to_string())
        .bind(notification.related_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
