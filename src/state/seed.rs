use anyhow::Result;
use mongodb::{Database, bson::DateTime};
use std::{env, time::SystemTime};

use crate::models::{User, UserRole};

use super::users::hash_pin;

pub(super) async fn is_database_empty(db: &Database) -> Result<bool> {
    let users_coll = db.collection::<User>("users");
    let count = users_coll.estimated_document_count().await?;
    Ok(count == 0)
}

pub(super) async fn ensure_collections(db: &Database) -> Result<()> {
    let existing = db.list_collection_names().await?;
    for name in ["users", "sessions", "routes", "customers", "orders"] {
        if !existing.iter().any(|n| n == name) {
            db.create_collection(name).await?;
        }
    }
    Ok(())
}

/// Seeds the initial admin account so a fresh deployment can log in.
/// PIN comes from ADMIN_PIN (default "1234"); change it after first login.
pub(super) async fn seed_default_admin(db: &Database) -> Result<()> {
    let pin = env::var("ADMIN_PIN").unwrap_or_else(|_| "1234".to_string());
    let users_coll = db.collection::<User>("users");
    users_coll
        .insert_one(User {
            id: None,
            username: "admin".to_string(),
            display_name: "Administrator".to_string(),
            display_name_lc: "administrator".to_string(),
            pin_hash: hash_pin(&pin),
            role: UserRole::Admin,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
        })
        .await?;
    Ok(())
}
