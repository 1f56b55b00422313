use rand::Rng;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::user::{ProvisionedAccount, UserRole};

const TEMPORARY_PASSWORD_LEN: usize = 12;

pub struct AccountService;

impl AccountService {
    pub fn generate_temporary_password() -> String {
        rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(TEMPORARY_PASSWORD_LEN)
            .map(char::from)
            .collect()
    }

    /// An account already registered under the email can only be reused for the same role.
    pub fn ensure_reusable(email: &str, existing_role: &str, role: UserRole) -> Result<(), ApiError> {
        if existing_role == role.to_string() {
            return Ok(());
        }
        Err(ApiError::validation(format!(
            "L'adresse {email} appartient déjà à un compte {existing_role}; utilisez une autre adresse pour un compte {role}."
        )))
    }

    /// Creates an account with a temporary password, or reuses the account
    /// already registered under `email` when it has the same role. When
    /// `orphanage_id` is given the account is linked to it through
    /// `user_orphanages`.
    ///
    /// Runs on the caller's transaction; a role mismatch fails it.
    pub async fn provision(
        conn: &mut PgConnection,
        email: &str,
        full_name: &str,
        role: UserRole,
        orphanage_id: Option<Uuid>,
    ) -> anyhow::Result<ProvisionedAccount> {
        let existing: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, role FROM users WHERE lower(email) = lower($1)")
                .bind(email)
                .fetch_optional(&mut *conn)
                .await?;

        let (user_id, temporary_password) = match existing {
            Some((id, existing_role)) => {
                Self::ensure_reusable(email, &existing_role, role)?;
                tracing::info!("Linking existing account {} instead of provisioning", id);
                (id, None)
            }
            None => {
                let password = Self::generate_temporary_password();
                let password_hash = bcrypt::hash(&password, 12)?;
                let id: Uuid = sqlx::query_scalar(
                    "INSERT INTO users (email, full_name, role, password_hash, force_password_change)
                     VALUES ($1, $2, $3, $4, TRUE)
                     RETURNING id",
                )
                .bind(email)
                .bind(full_name)
                .bind(role.to_string())
                .bind(&password_hash)
                .fetch_one(&mut *conn)
                .await?;
                (id, Some(password))
            }
        };

        if let Some(orphanage_id) = orphanage_id {
            sqlx::query(
                "INSERT INTO user_orphanages (user_id, orphanage_id)
                 VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(orphanage_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(ProvisionedAccount {
            user_id,
            email: email.to_string(),
            temporary_password,
        })
    }
}
