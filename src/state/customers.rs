// Customer ledger: CRUD with global case-insensitive name uniqueness and
// best-effort propagation of denormalized fields onto orders.

use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::errors::{AppError, AppResult};
use crate::models::{Customer, UserRole};

use super::AppState;
use super::registry::get_route_by_id;

pub async fn list_customers(state: &AppState) -> AppResult<Vec<Customer>> {
    let mut cursor = state
        .customers
        .find(doc! {})
        .sort(doc! { "name_lc": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(customer) = cursor.try_next().await? {
        items.push(customer);
    }
    Ok(items)
}

pub async fn get_customer_by_id(state: &AppState, id: &ObjectId) -> AppResult<Option<Customer>> {
    state
        .customers
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_customer(
    state: &AppState,
    name: &str,
    route_id: &ObjectId,
    sales_executive: &str,
    standard_price: f64,
    premium_price: f64,
    phone: Option<String>,
) -> AppResult<ObjectId> {
    let name = name.trim();
    validate_customer_fields(name, standard_price, premium_price)?;
    ensure_active_route(state, route_id).await?;
    ensure_sales_executive(state, sales_executive).await?;

    if state
        .customers
        .find_one(doc! { "name_lc": name.to_lowercase() })
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "customer \"{name}\" already exists"
        )));
    }

    let res = state
        .customers
        .insert_one(Customer {
            id: None,
            name: name.to_string(),
            name_lc: name.to_lowercase(),
            route_id: route_id.clone(),
            sales_executive: sales_executive.to_string(),
            standard_price,
            premium_price,
            phone: clean_phone(phone),
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
            updated_at: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Validation("customer insert missing _id".into()))
}

pub async fn update_customer(
    state: &AppState,
    id: &ObjectId,
    name: &str,
    route_id: &ObjectId,
    sales_executive: &str,
    standard_price: f64,
    premium_price: f64,
    phone: Option<String>,
) -> AppResult<Customer> {
    let existing = state
        .customers
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("customer not found".into()))?;

    let name = name.trim();
    validate_customer_fields(name, standard_price, premium_price)?;
    ensure_active_route(state, route_id).await?;
    ensure_sales_executive(state, sales_executive).await?;

    if state
        .customers
        .find_one(doc! { "name_lc": name.to_lowercase(), "_id": { "$ne": id } })
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "customer \"{name}\" already exists"
        )));
    }

    state
        .customers
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "name": name,
                "name_lc": name.to_lowercase(),
                "route_id": route_id,
                "sales_executive": sales_executive,
                "standard_price": standard_price,
                "premium_price": premium_price,
                "phone": clean_phone(phone.clone()),
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;

    let executive_changed = existing.sales_executive != sales_executive;
    let route_changed = &existing.route_id != route_id;
    if executive_changed || route_changed {
        spawn_order_propagation(
            state,
            id,
            executive_changed.then(|| sales_executive.to_string()),
            route_changed.then(|| route_id.clone()),
        );
    }

    state
        .customers
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("customer not found".into()))
}

/// Refused while orders still reference the customer; hard delete otherwise.
pub async fn delete_customer(state: &AppState, id: &ObjectId) -> AppResult<()> {
    if state.customers.find_one(doc! { "_id": id }).await?.is_none() {
        return Err(AppError::NotFound("customer not found".into()));
    }

    let order_count = state
        .orders
        .count_documents(doc! { "customer_id": id })
        .await?;
    if order_count > 0 {
        return Err(AppError::Conflict(format!(
            "customer is referenced by {order_count} order(s)"
        )));
    }

    state.customers.delete_one(doc! { "_id": id }).await?;
    Ok(())
}

/// Rewrites the denormalized executive/route copies on all of the
/// customer's orders. One attempt, no retry; the triggering request has
/// already returned, so failures are only logged. Until the task lands,
/// order documents may briefly show the previous values.
pub(super) fn spawn_order_propagation(
    state: &AppState,
    customer_id: &ObjectId,
    new_executive: Option<String>,
    new_route_id: Option<ObjectId>,
) {
    let orders = state.orders.clone();
    let customer_id = customer_id.clone();
    tokio::spawn(async move {
        let mut set = doc! {};
        if let Some(executive) = &new_executive {
            set.insert("sales_executive", executive);
        }
        if let Some(route_id) = &new_route_id {
            set.insert("route_id", route_id);
        }
        if set.is_empty() {
            return;
        }
        match orders
            .update_many(doc! { "customer_id": &customer_id }, doc! { "$set": set })
            .await
        {
            Ok(res) => tracing::debug!(
                customer = %customer_id,
                modified = res.modified_count,
                "propagated customer change to orders"
            ),
            Err(err) => tracing::warn!(
                customer = %customer_id,
                error = %err,
                "failed to propagate customer change to orders"
            ),
        }
    });
}

fn validate_customer_fields(name: &str, standard_price: f64, premium_price: f64) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::Validation("customer name is required".into()));
    }
    if standard_price < 0.0 || premium_price < 0.0 {
        return Err(AppError::Validation("prices cannot be negative".into()));
    }
    Ok(())
}

async fn ensure_active_route(state: &AppState, route_id: &ObjectId) -> AppResult<()> {
    match get_route_by_id(state, route_id).await? {
        Some(route) if route.is_active => Ok(()),
        Some(_) => Err(AppError::Validation("route is inactive".into())),
        None => Err(AppError::Validation("route not found".into())),
    }
}

async fn ensure_sales_executive(state: &AppState, username: &str) -> AppResult<()> {
    let found = state
        .users
        .find_one(doc! { "username": username, "role": UserRole::User.as_str() })
        .await?;
    if found.is_none() {
        return Err(AppError::Validation(format!(
            "sales executive \"{username}\" not found"
        )));
    }
    Ok(())
}

fn clean_phone(phone: Option<String>) -> Option<String> {
    phone.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
