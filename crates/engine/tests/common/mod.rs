#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{Engine, Money, NewCategoryCmd, NewUserCmd};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Engine with `alice` and `bob` registered and no default categories.
pub async fn engine_with_users() -> (Engine, DatabaseConnection) {
    let (engine, db) = engine_with_db().await;
    for username in ["alice", "bob"] {
        engine
            .register_user(NewUserCmd::new(username, "password"), &[])
            .await
            .unwrap();
    }
    (engine, db)
}

pub async fn category(engine: &Engine, owner: &str, name: &str) -> Uuid {
    engine
        .create_category(NewCategoryCmd::new(owner, name))
        .await
        .unwrap()
        .id
}

/// Whole currency units.
pub fn units(value: i64) -> Money {
    Money::new(value * 100)
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}
