use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    notification::{NewNotification, Priority},
    orphanage::{
        LegalStatus, Orphanage, OrphanageQuery, RegisterOrphanageRequest, ReviewDecision,
        UpdateOrphanageRequest,
    },
    user::UserRole,
};
use crate::services::{
    accounts::AccountService,
    email::EmailService,
    metrics::{REGISTRATIONS_COUNTER, REVIEWS_COUNTER},
    notifications::NotificationService,
};

pub struct OrphanageService;

impl OrphanageService {
    /// Public registration: stored as `pending`, admins are notified in the same transaction.
    pub async fn register(pool: &PgPool, req: &RegisterOrphanageRequest) -> anyhow::Result<Orphanage> {
        let mut tx = pool.begin().await?;

        let orphanage = sqlx::query_as::<_, Orphanage>(
            "INSERT INTO orphanages
                (name, province, city, address, phone, email, contact_person,
                 child_capacity, children_total, boys_count, girls_count,
                 schooling_rate, annual_disease_rate, meals_per_day)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *",
        )
        .bind(req.name.trim())
        .bind(req.province.trim())
        .bind(req.city.trim())
        .bind(&req.address)
        .bind(&req.phone)
        .bind(req.email.trim())
        .bind(req.contact_person.trim())
        .bind(req.child_capacity)
        .bind(req.children_total)
        .bind(req.boys_count)
        .bind(req.girls_count)
        .bind(req.schooling_rate)
        .bind(req.annual_disease_rate)
        .bind(req.meals_per_day)
        .fetch_one(&mut *tx)
        .await?;

        NotificationService::notify_admins(
            &mut *tx,
            &NewNotification {
                title: "Nouvelle demande d'enregistrement".into(),
                message: format!(
                    "{} ({}, {}) demande son enregistrement.",
                    orphanage.name, orphanage.city, orphanage.province
                ),
                notification_type: "orphanage_registration",
                priority: Priority::Medium,
                related_id: Some(orphanage.id),
            },
        )
        .await?;

        tx.commit().await?;
        REGISTRATIONS_COUNTER.with_label_values(&["orphanage"]).inc();
        tracing::info!("Orphanage {} registered ({})", orphanage.id, orphanage.name);
        Ok(orphanage)
    }

    pub async fn list(pool: &PgPool, query: &OrphanageQuery) -> anyhow::Result<Vec<Orphanage>> {
        let rows = sqlx::query_as::<_, Orphanage>(
            "SELECT * FROM orphanages
             WHERE ($1::text IS NULL OR province = $1)
               AND ($2::text IS NULL OR legal_status = $2)
             ORDER BY created_at DESC",
        )
        .bind(&query.province)
        .bind(query.status.map(|s| s.to_string()))
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> anyhow::Result<Orphanage> {
        let orphanage = sqlx::query_as::<_, Orphanage>("SELECT * FROM orphanages WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(orphanage)
    }

    /// Partial update; the merged counts must balance or nothing is written.
    pub async fn update(pool: &PgPool, id: Uuid, req: &UpdateOrphanageRequest) -> anyhow::Result<Orphanage> {
        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, Orphanage>("SELECT * FROM orphanages WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        req.check_counts_against(&current).map_err(ApiError::Validation)?;

        let orphanage = sqlx::query_as::<_, Orphanage>(
            "UPDATE orphanages SET
                name                = COALESCE($2, name),
                province            = COALESCE($3, province),
                city                = COALESCE($4, city),
                address             = COALESCE($5, address),
                phone               = COALESCE($6, phone),
                email               = COALESCE($7, email),
                contact_person      = COALESCE($8, contact_person),
                child_capacity      = COALESCE($9, child_capacity),
                children_total      = COALESCE($10, children_total),
                boys_count          = COALESCE($11, boys_count),
                girls_count         = COALESCE($12, girls_count),
                schooling_rate      = COALESCE($13, schooling_rate),
                annual_disease_rate = COALESCE($14, annual_disease_rate),
                meals_per_day       = COALESCE($15, meals_per_day),
                updated_at          = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.province)
        .bind(&req.city)
        .bind(&req.address)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.contact_person)
        .bind(req.child_capacity)
        .bind(req.children_total)
        .bind(req.boys_count)
        .bind(req.girls_count)
        .bind(req.schooling_rate)
        .bind(req.annual_disease_rate)
        .bind(req.meals_per_day)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(orphanage)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM orphanages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    /// Verification provisions the operator account in the same transaction;
    /// emails go out after commit and never fail the review.
    pub async fn review(
        pool: &PgPool,
        email: Option<&EmailService>,
        id: Uuid,
        decision: ReviewDecision,
        reason: Option<String>,
    ) -> anyhow::Result<Orphanage> {
        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, Orphanage>("SELECT * FROM orphanages WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        let (status, reason) = match decision {
            ReviewDecision::Verify => (LegalStatus::Verified, None),
            ReviewDecision::Reject => (LegalStatus::Rejected, reason.filter(|r| !r.trim().is_empty())),
        };

        let orphanage = sqlx::query_as::<_, Orphanage>(
            "UPDATE orphanages SET
                legal_status     = $2,
                rejection_reason = $3,
                verified_at      = CASE WHEN $2 = 'verified' THEN COALESCE(verified_at, NOW()) ELSE NULL END,
                updated_at       = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(status.to_string())
        .bind(&reason)
        .fetch_one(&mut *tx)
        .await?;

        let account = match decision {
            ReviewDecision::Verify => Some(
                AccountService::provision(
                    &mut *tx,
                    &current.email,
                    &current.contact_person,
                    UserRole::Orphelinat,
                    Some(current.id),
                )
                .await?,
            ),
            ReviewDecision::Reject => None,
        };

        tx.commit().await?;

        let decision_label = match decision {
            ReviewDecision::Verify => "verified",
            ReviewDecision::Reject => "rejected",
        };
        REVIEWS_COUNTER.with_label_values(&["orphanage", decision_label]).inc();
        tracing::info!("Orphanage {} reviewed: {}", orphanage.id, decision_label);

        if let Some(mailer) = email {
            let sent = match &account {
                Some(acc) => match &acc.temporary_password {
                    Some(password) => {
                        mailer
                            .send_account_credentials(&acc.email, &orphanage.contact_person, UserRole::Orphelinat, password)
                            .await
                    }
                    None => Ok(()),
                },
                None => {
                    mailer
                        .send_rejection(
                            &orphanage.email,
                            &orphanage.contact_person,
                            "demande d'enregistrement",
                            orphanage.rejection_reason.as_deref(),
                        )
                        .await
                }
            };
            if let Err(e) = sent {
                tracing::warn!("Review email for orphanage {} not sent: {}", orphanage.id, e);
            }
        }

        Ok(orphanage)
    }
}
