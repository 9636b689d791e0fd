// Order endpoints: role-scoped listing with summary, admin mutations,
// age-based purge, and CSV export.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::errors::{AppError, AppResult};
use crate::session::SessionUser;
use crate::state::{
    AppState, OrderFilter, OrderListing, PricedOrder, bulk_delete_older_than,
    bulk_delete_within_last, create_order, delete_order, export_orders_csv, get_priced_order,
    list_orders, update_order,
};

use super::helpers::{parse_date_field, parse_object_id, parse_vehicle, require_admin};

#[derive(Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    route_id: Option<String>,
    #[serde(default)]
    vehicle: Option<String>,
    #[serde(default)]
    sales_executive: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    page: Option<u64>,
    #[serde(default)]
    page_size: Option<u64>,
}

#[derive(Deserialize)]
pub struct OrderForm {
    pub date: String,
    pub customer_id: String,
    pub vehicle: String,
    pub standard_qty: f64,
    pub premium_qty: f64,
}

#[derive(Deserialize)]
pub struct PurgeRequest {
    pub mode: String,
    pub days: u32,
}

fn order_filter(query: OrderListQuery) -> AppResult<OrderFilter> {
    let mut filter = OrderFilter::default();
    if let Some(date) = query.date.as_deref().filter(|v| !v.trim().is_empty()) {
        filter.date = Some(parse_date_field(date, "date")?);
    }
    if let Some(route_id) = query.route_id.as_deref().filter(|v| !v.trim().is_empty()) {
        filter.route_id = Some(parse_object_id(route_id, "route")?);
    }
    if let Some(vehicle) = query.vehicle.as_deref().filter(|v| !v.trim().is_empty()) {
        filter.vehicle = Some(parse_vehicle(vehicle)?);
    }
    filter.sales_executive = query.sales_executive;
    filter.search = query.search;
    if let Some(page) = query.page {
        filter.page = page;
    }
    if let Some(page_size) = query.page_size {
        filter.page_size = page_size;
    }
    Ok(filter)
}

pub async fn orders_index(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<OrderListing>> {
    let filter = order_filter(query)?;
    let listing = list_orders(&state, session.user(), &filter).await?;
    Ok(Json(listing))
}

pub async fn orders_show(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<PricedOrder>> {
    let object_id = parse_object_id(&id, "order")?;
    let order = get_priced_order(&state, &object_id).await?;
    if !session.is_admin() && order.sales_executive != session.username() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(order))
}

pub async fn orders_create(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<OrderForm>,
) -> AppResult<(StatusCode, Json<PricedOrder>)> {
    let date = parse_date_field(&form.date, "date")?;
    let customer_id = parse_object_id(&form.customer_id, "customer")?;
    let vehicle = parse_vehicle(&form.vehicle)?;

    let order = create_order(
        &state,
        session.user(),
        date,
        &customer_id,
        vehicle,
        form.standard_qty,
        form.premium_qty,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn orders_update(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<OrderForm>,
) -> AppResult<Json<PricedOrder>> {
    require_admin(&session)?;

    let object_id = parse_object_id(&id, "order")?;
    let date = parse_date_field(&form.date, "date")?;
    let customer_id = parse_object_id(&form.customer_id, "customer")?;
    let vehicle = parse_vehicle(&form.vehicle)?;

    let order = update_order(
        &state,
        &object_id,
        date,
        &customer_id,
        vehicle,
        form.standard_qty,
        form.premium_qty,
    )
    .await?;
    Ok(Json(order))
}

pub async fn orders_delete(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&session)?;
    let object_id = parse_object_id(&id, "order")?;
    delete_order(&state, &object_id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn orders_purge(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PurgeRequest>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&session)?;
    let deleted = match body.mode.as_str() {
        "older_than" => bulk_delete_older_than(&state, body.days).await?,
        "within_last" => bulk_delete_within_last(&state, body.days).await?,
        other => {
            return Err(AppError::Validation(format!(
                "invalid purge mode \"{other}\" (use older_than or within_last)"
            )));
        }
    };
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

pub async fn orders_export(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Response> {
    let filter = order_filter(query)?;
    let csv = export_orders_csv(&state, session.user(), &filter).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"orders.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
