// Reference registry: delivery routes and the sales-executive directory.
// Lookups return Ok(None) for not-found; callers decide whether that is fatal.

use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::errors::{AppError, AppResult};
use crate::models::{DeliveryRoute, User, UserRole};

use super::AppState;

/// Route names are compared and stored trimmed + upper-cased.
pub fn normalize_route_name(name: &str) -> String {
    name.trim().to_uppercase()
}

pub async fn find_route_by_name(
    state: &AppState,
    name: &str,
) -> AppResult<Option<DeliveryRoute>> {
    state
        .routes
        .find_one(doc! { "name": normalize_route_name(name) })
        .await
        .map_err(Into::into)
}

pub async fn get_route_by_id(state: &AppState, id: &ObjectId) -> AppResult<Option<DeliveryRoute>> {
    state
        .routes
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn list_routes(state: &AppState) -> AppResult<Vec<DeliveryRoute>> {
    let mut cursor = state.routes.find(doc! {}).sort(doc! { "name": 1 }).await?;
    let mut items = Vec::new();
    while let Some(route) = cursor.try_next().await? {
        items.push(route);
    }
    Ok(items)
}

pub async fn list_active_routes(state: &AppState) -> AppResult<Vec<DeliveryRoute>> {
    let mut cursor = state
        .routes
        .find(doc! { "is_active": true })
        .sort(doc! { "name": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(route) = cursor.try_next().await? {
        items.push(route);
    }
    Ok(items)
}

/// Case-insensitive exact match on display name, used by CSV import to map
/// the SalesExecutive column to a username.
pub async fn find_sales_executive_by_display_name(
    state: &AppState,
    name: &str,
) -> AppResult<Option<User>> {
    state
        .users
        .find_one(doc! {
            "display_name_lc": name.trim().to_lowercase(),
            "role": UserRole::User.as_str(),
        })
        .await
        .map_err(Into::into)
}

pub async fn create_route(state: &AppState, name: &str) -> AppResult<ObjectId> {
    let name = normalize_route_name(name);
    if name.is_empty() {
        return Err(AppError::Validation("route name is required".into()));
    }
    if state.routes.find_one(doc! { "name": &name }).await?.is_some() {
        return Err(AppError::Conflict(format!("route \"{name}\" already exists")));
    }

    let res = state
        .routes
        .insert_one(DeliveryRoute {
            id: None,
            name,
            is_active: true,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Validation("route insert missing _id".into()))
}

pub async fn update_route(
    state: &AppState,
    id: &ObjectId,
    name: &str,
    is_active: bool,
) -> AppResult<()> {
    let name = normalize_route_name(name);
    if name.is_empty() {
        return Err(AppError::Validation("route name is required".into()));
    }
    if state
        .routes
        .find_one(doc! { "name": &name, "_id": { "$ne": id } })
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!("route \"{name}\" already exists")));
    }

    let res = state
        .routes
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "name": name, "is_active": is_active } },
        )
        .await?;
    if res.matched_count == 0 {
        return Err(AppError::NotFound("route not found".into()));
    }
    Ok(())
}

/// Deletion is refused while any customer or order still references the
/// route; the guard lives here because the store has no foreign keys.
pub async fn delete_route(state: &AppState, id: &ObjectId) -> AppResult<()> {
    if state.routes.find_one(doc! { "_id": id }).await?.is_none() {
        return Err(AppError::NotFound("route not found".into()));
    }

    let customer_count = state
        .customers
        .count_documents(doc! { "route_id": id })
        .await?;
    let order_count = state.orders.count_documents(doc! { "route_id": id }).await?;
    if customer_count > 0 || order_count > 0 {
        return Err(AppError::Conflict(format!(
            "route is referenced by {customer_count} customer(s) and {order_count} order(s)"
        )));
    }

    state.routes.delete_one(doc! { "_id": id }).await?;
    Ok(())
}
