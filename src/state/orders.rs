// Order ledger: creation with the per-day duplicate guard, admin edits,
// and unconditional bulk deletes.

use chrono::{Duration, TimeZone, Utc};
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::errors::{AppError, AppResult};
use crate::models::{Customer, Order, User, Vehicle};

use super::AppState;
use super::query::{PricedOrder, get_priced_order};

/// Full calendar-day span of `date`: [00:00:00.000, 23:59:59.999].
pub(super) fn day_bounds(date: DateTime) -> (DateTime, DateTime) {
    let day = date.to_chrono().date_naive();
    let start = Utc.from_utc_datetime(&day.and_hms_milli_opt(0, 0, 0, 0).unwrap());
    let end = Utc.from_utc_datetime(&day.and_hms_milli_opt(23, 59, 59, 999).unwrap());
    (DateTime::from_chrono(start), DateTime::from_chrono(end))
}

pub async fn get_order_by_id(state: &AppState, id: &ObjectId) -> AppResult<Option<Order>> {
    state
        .orders
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_order(
    state: &AppState,
    caller: &User,
    date: DateTime,
    customer_id: &ObjectId,
    vehicle: Vehicle,
    standard_qty: f64,
    premium_qty: f64,
) -> AppResult<PricedOrder> {
    validate_quantities(standard_qty, premium_qty)?;

    let customer = state
        .customers
        .find_one(doc! { "_id": customer_id })
        .await?
        .ok_or_else(|| AppError::NotFound("customer not found".into()))?;

    ensure_no_order_for_day(state, customer_id, date, None).await?;

    let created_by = caller
        .id
        .clone()
        .ok_or_else(|| AppError::Validation("caller user missing _id".into()))?;

    let res = state
        .orders
        .insert_one(Order {
            id: None,
            date,
            customer_id: customer_id.clone(),
            route_id: customer.route_id.clone(),
            sales_executive: customer.sales_executive.clone(),
            vehicle,
            standard_qty,
            premium_qty,
            created_by,
            created_by_username: caller.username.clone(),
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
            updated_at: None,
        })
        .await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Validation("order insert missing _id".into()))?;

    get_priced_order(state, &id).await
}

pub async fn update_order(
    state: &AppState,
    id: &ObjectId,
    date: DateTime,
    customer_id: &ObjectId,
    vehicle: Vehicle,
    standard_qty: f64,
    premium_qty: f64,
) -> AppResult<PricedOrder> {
    validate_quantities(standard_qty, premium_qty)?;

    let existing = state
        .orders
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".into()))?;

    let customer_changed = &existing.customer_id != customer_id;
    let day_changed = day_bounds(existing.date).0 != day_bounds(date).0;
    if customer_changed || day_changed {
        ensure_no_order_for_day(state, customer_id, date, Some(id)).await?;
    }

    // Moving the order to another customer re-snapshots its route and
    // executive from that customer.
    let snapshot: Option<Customer> = if customer_changed {
        Some(
            state
                .customers
                .find_one(doc! { "_id": customer_id })
                .await?
                .ok_or_else(|| AppError::NotFound("customer not found".into()))?,
        )
    } else {
        None
    };
    let route_id = snapshot
        .as_ref()
        .map(|c| c.route_id.clone())
        .unwrap_or(existing.route_id);
    let sales_executive = snapshot
        .as_ref()
        .map(|c| c.sales_executive.clone())
        .unwrap_or(existing.sales_executive);

    state
        .orders
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "date": date,
                "customer_id": customer_id,
                "route_id": route_id,
                "sales_executive": sales_executive,
                "vehicle": vehicle.as_str(),
                "standard_qty": standard_qty,
                "premium_qty": premium_qty,
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;

    get_priced_order(state, id).await
}

pub async fn delete_order(state: &AppState, id: &ObjectId) -> AppResult<()> {
    let res = state.orders.delete_one(doc! { "_id": id }).await?;
    if res.deleted_count == 0 {
        return Err(AppError::NotFound("order not found".into()));
    }
    Ok(())
}

/// Deletes every order dated strictly before `days` days ago. Single batch,
/// no undo.
pub async fn bulk_delete_older_than(state: &AppState, days: u32) -> AppResult<u64> {
    let cutoff = DateTime::from_chrono(Utc::now() - Duration::days(days as i64));
    let res = state
        .orders
        .delete_many(doc! { "date": { "$lt": cutoff } })
        .await?;
    Ok(res.deleted_count)
}

/// Deletes every order dated within the last `days` days. Single batch,
/// no undo.
pub async fn bulk_delete_within_last(state: &AppState, days: u32) -> AppResult<u64> {
    let cutoff = DateTime::from_chrono(Utc::now() - Duration::days(days as i64));
    let res = state
        .orders
        .delete_many(doc! { "date": { "$gte": cutoff } })
        .await?;
    Ok(res.deleted_count)
}

fn validate_quantities(standard_qty: f64, premium_qty: f64) -> AppResult<()> {
    if standard_qty < 0.0 || premium_qty < 0.0 {
        return Err(AppError::Validation("quantities cannot be negative".into()));
    }
    if standard_qty + premium_qty <= 0.0 {
        return Err(AppError::Validation(
            "order needs at least one non-zero quantity".into(),
        ));
    }
    Ok(())
}

/// Check-then-insert duplicate guard. The check and the write are not
/// atomic; two concurrent creations for the same customer and day can both
/// pass. Accepted gap for a single-operator deployment.
async fn ensure_no_order_for_day(
    state: &AppState,
    customer_id: &ObjectId,
    date: DateTime,
    exclude: Option<&ObjectId>,
) -> AppResult<()> {
    let (start, end) = day_bounds(date);
    let mut filter = doc! {
        "customer_id": customer_id,
        "date": { "$gte": start, "$lte": end },
    };
    if let Some(id) = exclude {
        filter.insert("_id", doc! { "$ne": id });
    }
    if state.orders.find_one(filter).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "an order for this customer already exists on {}",
            date.to_chrono().format("%Y-%m-%d")
        )));
    }
    Ok(())
}
