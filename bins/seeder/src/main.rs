//! Database seeder for CEMS development and testing.
//!
//! Seeds the default budget categories with starter allocations.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use cems_db::entities::budgets;

/// Default budget categories with their monthly allocations (whole units).
const DEFAULT_BUDGETS: &[(&str, i64)] = &[
    ("Fuel", 10_000),
    ("Travel", 20_000),
    ("Meals", 5_000),
    ("Lodging", 15_000),
    ("Supplies", 3_000),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = cems_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding budget categories...");
    seed_budgets(&db).await;

    println!("Seeding complete!");
}

/// Seeds the default budget categories, skipping existing ones.
async fn seed_budgets(db: &DatabaseConnection) {
    for (category, allocated) in DEFAULT_BUDGETS {
        let existing = budgets::Entity::find()
            .filter(budgets::Column::Category.eq(*category))
            .one(db)
            .await
            .ok()
            .flatten();

        if existing.is_some() {
            println!("  Budget '{category}' already exists, skipping...");
            continue;
        }

        let now = Utc::now().into();
        let row = budgets::ActiveModel {
            id: Set(Uuid::new_v4()),
            category: Set((*category).to_string()),
            allocated: Set(Decimal::from(*allocated)),
            spent: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };

        if let Err(e) = row.insert(db).await {
            eprintln!("Failed to insert budget '{category}': {e}");
        } else {
            println!("  Created budget: {category} (allocated {allocated})");
        }
    }
}
