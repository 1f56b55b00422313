//! Runs against a real database: `DATABASE_URL=... cargo test -- --ignored`

use chrono::NaiveDate;
use orphelinats_api::{
    db,
    error::ApiError,
    models::{
        child::{CreateChildRequest, Gender, ParentStatus, UpdateChildRequest},
        orphanage::{LegalStatus, Orphanage, RegisterOrphanageRequest, ReviewDecision, UpdateOrphanageRequest},
    },
    services::{children::ChildService, orphanages::OrphanageService},
};
use sqlx::PgPool;

async fn pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::create_pool(&database_url).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

async fn register(pool: &PgPool, email: &str) -> Orphanage {
    OrphanageService::register(
        pool,
        &RegisterOrphanageRequest {
            name: "Centre Bon Berger".into(),
            province: "Kasaï".into(),
            city: "Tshikapa".into(),
            address: None,
            phone: None,
            email: email.into(),
            contact_person: "Paul Ilunga".into(),
            child_capacity: 50,
            children_total: 20,
            boys_count: 9,
            girls_count: 11,
            schooling_rate: None,
            annual_disease_rate: None,
            meals_per_day: Some(2),
        },
    )
    .await
    .unwrap()
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@registre.example.org", uuid::Uuid::new_v4())
}

fn is_validation(err: anyhow::Error) -> bool {
    matches!(ApiError::from(err), ApiError::Validation(_))
}

#[tokio::test]
#[ignore]
async fn unbalanced_partial_update_leaves_counts_unchanged() {
    let pool = pool().await;
    let orphanage = register(&pool, &unique_email("counts")).await;

    let update = UpdateOrphanageRequest {
        boys_count: Some(99),
        ..Default::default()
    };
    let err = OrphanageService::update(&pool, orphanage.id, &update).await.unwrap_err();
    assert!(is_validation(err));

    let stored = OrphanageService::get(&pool, orphanage.id).await.unwrap();
    assert_eq!((stored.children_total, stored.boys_count, stored.girls_count), (20, 9, 11));

    let balanced = UpdateOrphanageRequest {
        children_total: Some(21),
        boys_count: Some(10),
        ..Default::default()
    };
    let updated = OrphanageService::update(&pool, orphanage.id, &balanced).await.unwrap();
    assert_eq!((updated.children_total, updated.boys_count, updated.girls_count), (21, 10, 11));

    OrphanageService::delete(&pool, orphanage.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn entry_date_before_stored_birth_date_is_rejected() {
    let pool = pool().await;
    let orphanage = register(&pool, &unique_email("dates")).await;

    let child = ChildService::create(
        &pool,
        orphanage.id,
        &CreateChildRequest {
            full_name: "Daniel Tshala".into(),
            gender: Gender::Male,
            birth_date: NaiveDate::from_ymd_opt(2017, 5, 20),
            estimated_age: None,
            entry_date: NaiveDate::from_ymd_opt(2022, 2, 1),
            parent_status: ParentStatus::TotalOrphan,
            internal_code: None,
            photo_url: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    let update = UpdateChildRequest {
        entry_date: NaiveDate::from_ymd_opt(2016, 1, 1),
        ..Default::default()
    };
    let err = ChildService::update(&pool, orphanage.id, child.id, &update).await.unwrap_err();
    assert!(is_validation(err));

    let stored = ChildService::get(&pool, orphanage.id, child.id).await.unwrap();
    assert_eq!(stored.entry_date, NaiveDate::from_ymd_opt(2022, 2, 1));

    OrphanageService::delete(&pool, orphanage.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn verification_fails_when_contact_email_belongs_to_a_partner() {
    let pool = pool().await;
    let email = unique_email("partenaire");
    sqlx::query(
        "INSERT INTO users (email, full_name, role, password_hash)
         VALUES ($1, 'Partenaire Test', 'partner', 'x')",
    )
    .bind(&email)
    .execute(&pool)
    .await
    .unwrap();

    let orphanage = register(&pool, &email).await;
    let err = OrphanageService::review(&pool, None, orphanage.id, ReviewDecision::Verify, None)
        .await
        .unwrap_err();
    assert!(is_validation(err));

    let stored = OrphanageService::get(&pool, orphanage.id).await.unwrap();
    assert_eq!(stored.legal_status, LegalStatus::Pending.to_string());
    assert!(stored.verified_at.is_none());

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_orphanages WHERE orphanage_id = $1")
        .bind(orphanage.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links, 0);

    OrphanageService::delete(&pool, orphanage.id).await.unwrap();
    sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(&email)
        .execute(&pool)
        .await
        .unwrap();
}
