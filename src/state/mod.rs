// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;
use mongodb::{Client, Collection};
use std::env;

use crate::models::{Customer, DeliveryRoute, Order, Session, User};

mod seed;
mod users;
mod registry;
mod customers;
mod orders;
mod query;
mod import;

pub use users::*;
pub use registry::*;
pub use customers::*;
pub use orders::*;
pub use query::*;
pub use import::*;

pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 24; // 1 day
pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_IMPORT_ERRORS: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub users: Collection<User>,
    pub sessions: Collection<Session>,
    pub routes: Collection<DeliveryRoute>,
    pub customers: Collection<Customer>,
    pub orders: Collection<Order>,
}

pub async fn init_state() -> Result<AppState> {
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| "reparto".to_string());

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&db_name);

    seed::ensure_collections(&db).await?;

    // Only seed when the database is effectively empty (no users).
    if seed::is_database_empty(&db).await? {
        seed::seed_default_admin(&db).await?;
    }

    Ok(AppState {
        users: db.collection::<User>("users"),
        sessions: db.collection::<Session>("sessions"),
        routes: db.collection::<DeliveryRoute>("routes"),
        customers: db.collection::<Customer>("customers"),
        orders: db.collection::<Order>("orders"),
    })
}
