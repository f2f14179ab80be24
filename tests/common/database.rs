//! Test database setup and management
#![allow(dead_code)]

use rnd_nutrition::orm::{
    change_log_ingredients, formulation_change_logs, formulations, has_roles, items, naming_series,
    uoms,
};
use sea_orm::{
    entity::*, ActiveValue::NotSet, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
    Set,
};
use std::env;

/// Connect to `TEST_DATABASE_URL` and prepare an empty schema.
///
/// Returns `None` when no test database is configured so database tests
/// can be skipped on machines without one.
pub async fn setup_test_database() -> Option<DatabaseConnection> {
    let url = match env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            log::warn!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        }
    };

    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to test database");
    create_tables(&db).await.expect("Failed to create tables");
    cleanup_tables(&db).await.expect("Failed to clean tables");
    Some(db)
}

async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = vec![
        schema.create_table_from_entity(formulations::Entity),
        schema.create_table_from_entity(items::Entity),
        schema.create_table_from_entity(uoms::Entity),
        schema.create_table_from_entity(has_roles::Entity),
        schema.create_table_from_entity(naming_series::Entity),
        schema.create_table_from_entity(formulation_change_logs::Entity),
        schema.create_table_from_entity(change_log_ingredients::Entity),
    ];
    for statement in statements.iter_mut() {
        db.execute(backend.build(&*statement.if_not_exists())).await?;
    }
    Ok(())
}

/// Remove all rows, children first
pub async fn cleanup_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    change_log_ingredients::Entity::delete_many().exec(db).await?;
    formulation_change_logs::Entity::delete_many().exec(db).await?;
    naming_series::Entity::delete_many().exec(db).await?;
    has_roles::Entity::delete_many().exec(db).await?;
    uoms::Entity::delete_many().exec(db).await?;
    items::Entity::delete_many().exec(db).await?;
    formulations::Entity::delete_many().exec(db).await?;
    Ok(())
}

pub async fn create_formulation(
    db: &DatabaseConnection,
    name: &str,
    display_name: &str,
    purpose: &str,
) -> Result<formulations::Model, DbErr> {
    formulations::ActiveModel {
        name: Set(name.to_string()),
        formulation_name: Set(display_name.to_string()),
        purpose: Set(Some(purpose.to_string())),
        status: Set(Some("Draft".to_string())),
    }
    .insert(db)
    .await
}

pub async fn create_item(
    db: &DatabaseConnection,
    code: &str,
    display_name: &str,
) -> Result<items::Model, DbErr> {
    items::ActiveModel {
        item_code: Set(code.to_string()),
        item_name: Set(display_name.to_string()),
        item_group: Set(Some("Raw Material".to_string())),
        stock_uom: Set(Some("Kg".to_string())),
    }
    .insert(db)
    .await
}

pub async fn create_uom(db: &DatabaseConnection, name: &str) -> Result<uoms::Model, DbErr> {
    uoms::ActiveModel {
        uom_name: Set(name.to_string()),
        must_be_whole_number: Set(false),
    }
    .insert(db)
    .await
}

pub async fn grant_role(
    db: &DatabaseConnection,
    user: &str,
    role: &str,
) -> Result<has_roles::Model, DbErr> {
    has_roles::ActiveModel {
        id: NotSet,
        parent: Set(user.to_string()),
        role: Set(role.to_string()),
    }
    .insert(db)
    .await
}
