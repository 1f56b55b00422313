use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    notification::{NewNotification, Priority},
    partner::{
        CreatePartnerRequest, PartnerDecision, PartnerRequest, PartnerRequestQuery, PartnerRequestStatus,
    },
    user::UserRole,
};
use crate::services::{
    accounts::AccountService,
    email::EmailService,
    metrics::{REGISTRATIONS_COUNTER, REVIEWS_COUNTER},
    notifications::NotificationService,
};

pub struct PartnerService;

impl PartnerService {
    pub async fn submit(pool: &PgPool, req: &CreatePartnerRequest) -> anyhow::Result<PartnerRequest> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, PartnerRequest>(
            "INSERT INTO partner_requests
                (organization_name, organization_type, contact_name, email, phone, purpose)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(req.organization_name.trim())
        .bind(&req.organization_type)
        .bind(req.contact_name.trim())
        .bind(req.email.trim())
        .bind(&req.phone)
        .bind(&req.purpose)
        .fetch_one(&mut *tx)
        .await?;

        NotificationService::notify_admins(
            &mut *tx,
            &NewNotification {
                title: "Nouvelle demande de partenariat".into(),
                message: format!(
                    "{} ({}) souhaite accéder aux statistiques.",
                    request.organization_name, request.contact_name
                ),
                notification_type: "partner_request",
                priority: Priority::Low,
                related_id: Some(request.id),
            },
        )
        .await?;

        tx.commit().await?;
        REGISTRATIONS_COUNTER.with_label_values(&["partner"]).inc();
        Ok(request)
    }

    pub async fn list(pool: &PgPool, query: &PartnerRequestQuery) -> anyhow::Result<Vec<PartnerRequest>> {
        let rows = sqlx::query_as::<_, PartnerRequest>(
            "SELECT * FROM partner_requests
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC",
        )
        .bind(query.status.map(|s| s.to_string()))
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Approval provisions a `partner` account in the same transaction.
    pub async fn review(
        pool: &PgPool,
        email: Option<&EmailService>,
        id: Uuid,
        decision: PartnerDecision,
        reason: Option<String>,
    ) -> anyhow::Result<PartnerRequest> {
        let mut tx = pool.begin().await?;

        let (status, reason) = match decision {
            PartnerDecision::Approve => (PartnerRequestStatus::Approved, None),
            PartnerDecision::Reject => (PartnerRequestStatus::Rejected, reason.filter(|r| !r.trim().is_empty())),
        };

        let request = sqlx::query_as::<_, PartnerRequest>(
            "UPDATE partner_requests
             SET status = $2, rejection_reason = $3, reviewed_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(status.to_string())
        .bind(&reason)
        .fetch_one(&mut *tx)
        .await?;

        let account = match decision {
            PartnerDecision::Approve => Some(
                AccountService::provision(&mut *tx, &request.email, &request.contact_name, UserRole::Partner, None)
                    .await?,
            ),
            PartnerDecision::Reject => None,
        };

        tx.commit().await?;
        REVIEWS_COUNTER
            .with_label_values(&["partner", &status.to_string()])
            .inc();

        if let Some(mailer) = email {
            let sent = match account.as_ref().and_then(|a| a.temporary_password.as_deref()) {
                Some(password) => {
                    mailer
                        .send_account_credentials(&request.email, &request.contact_name, UserRole::Partner, password)
                        .await
                }
                None if decision == PartnerDecision::Reject => {
                    mailer
                        .send_rejection(
                            &request.email,
                            &request.contact_name,
                            "demande de partenariat",
                            request.rejection_reason.as_deref(),
                        )
                        .await
                }
                None => Ok(()),
            };
            if let Err(e) = sent {
                tracing::warn!("Review email for partner request {} not sent: {}", request.id, e);
            }
        }

        Ok(request)
    }
}
