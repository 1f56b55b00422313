//! Runs against a real database: `DATABASE_URL=... cargo test -- --ignored`

use chrono::NaiveDate;
use orphelinats_api::{
    db,
    models::{
        child::{CreateChildRequest, Gender, ParentStatus},
        orphanage::RegisterOrphanageRequest,
    },
    services::{children::ChildService, orphanages::OrphanageService},
};

#[tokio::test]
#[ignore]
async fn created_child_is_listed_with_identical_fields() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = db::create_pool(&database_url).await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let orphanage = OrphanageService::register(
        &pool,
        &RegisterOrphanageRequest {
            name: "Centre Test Aller-Retour".into(),
            province: "Kinshasa".into(),
            city: "Gombe".into(),
            address: None,
            phone: None,
            email: format!("test-{}@registre.example.org", uuid::Uuid::new_v4()),
            contact_person: "Jeanne Mbuyi".into(),
            child_capacity: 30,
            children_total: 0,
            boys_count: 0,
            girls_count: 0,
            schooling_rate: None,
            annual_disease_rate: None,
            meals_per_day: Some(3),
        },
    )
    .await
    .unwrap();

    let request = CreateChildRequest {
        full_name: "Grâce Kabongo".into(),
        gender: Gender::Female,
        birth_date: NaiveDate::from_ymd_opt(2018, 4, 12),
        estimated_age: None,
        entry_date: NaiveDate::from_ymd_opt(2023, 1, 9),
        parent_status: ParentStatus::PartialOrphan,
        internal_code: Some("KIN-0042".into()),
        photo_url: None,
        notes: Some("Arrivée avec sa sœur".into()),
    };
    let created = ChildService::create(&pool, orphanage.id, &request).await.unwrap();

    let listed = ChildService::list(&pool, orphanage.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    let child = &listed[0];
    assert_eq!(child.id, created.id);
    assert_eq!(child.orphanage_id, orphanage.id);
    assert_eq!(child.full_name, "Grâce Kabongo");
    assert_eq!(child.gender, "F");
    assert_eq!(child.birth_date, request.birth_date);
    assert_eq!(child.estimated_age, None);
    assert_eq!(child.entry_date, request.entry_date);
    assert_eq!(child.parent_status, "partial_orphan");
    assert_eq!(child.internal_code.as_deref(), Some("KIN-0042"));
    assert_eq!(child.notes, request.notes);

    OrphanageService::delete(&pool, orphanage.id).await.unwrap();
}
