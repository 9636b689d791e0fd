// Customer endpoints: listing, admin CRUD, and bulk CSV import.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{AppError, AppResult};
use crate::models::Customer;
use crate::session::SessionUser;
use crate::state::{
    AppState, ImportSummary, create_customer, delete_customer, import_customers_csv,
    list_customers, list_routes, update_customer,
};

use super::helpers::{parse_object_id, require_admin};

#[derive(Serialize)]
pub struct CustomerView {
    pub id: String,
    pub name: String,
    pub route_id: String,
    pub route_name: String,
    pub sales_executive: String,
    pub standard_price: f64,
    pub premium_price: f64,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct CustomerForm {
    pub name: String,
    pub route_id: String,
    pub sales_executive: String,
    pub standard_price: f64,
    pub premium_price: f64,
    #[serde(default)]
    pub phone: Option<String>,
}

fn view(customer: Customer, route_names: &HashMap<String, String>) -> CustomerView {
    let route_id = customer.route_id.to_hex();
    CustomerView {
        id: customer.id.map(|i| i.to_hex()).unwrap_or_default(),
        name: customer.name,
        route_name: route_names.get(&route_id).cloned().unwrap_or_default(),
        route_id,
        sales_executive: customer.sales_executive,
        standard_price: customer.standard_price,
        premium_price: customer.premium_price,
        phone: customer.phone,
    }
}

async fn route_name_map(state: &AppState) -> AppResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    for route in list_routes(state).await? {
        if let Some(id) = route.id {
            map.insert(id.to_hex(), route.name);
        }
    }
    Ok(map)
}

pub async fn customers_index(
    _session: SessionUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<CustomerView>>> {
    let route_names = route_name_map(&state).await?;
    let customers = list_customers(&state).await?;
    Ok(Json(
        customers
            .into_iter()
            .map(|c| view(c, &route_names))
            .collect(),
    ))
}

pub async fn customers_create(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<CustomerForm>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    require_admin(&session)?;
    let route_id = parse_object_id(&form.route_id, "route")?;
    let id = create_customer(
        &state,
        &form.name,
        &route_id,
        form.sales_executive.trim(),
        form.standard_price,
        form.premium_price,
        form.phone,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_hex() })),
    ))
}

pub async fn customers_update(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<CustomerForm>,
) -> AppResult<Json<CustomerView>> {
    require_admin(&session)?;
    let object_id = parse_object_id(&id, "customer")?;
    let route_id = parse_object_id(&form.route_id, "route")?;
    let customer = update_customer(
        &state,
        &object_id,
        &form.name,
        &route_id,
        form.sales_executive.trim(),
        form.standard_price,
        form.premium_price,
        form.phone,
    )
    .await?;
    let route_names = route_name_map(&state).await?;
    Ok(Json(view(customer, &route_names)))
}

pub async fn customers_delete(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&session)?;
    let object_id = parse_object_id(&id, "customer")?;
    delete_customer(&state, &object_id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Multipart upload; the CSV is read from the `file` field (or the first
/// field when unnamed).
pub async fn customers_import(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    require_admin(&session)?;

    let mut text: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid upload: {e}")))?
    {
        let is_file = matches!(field.name(), Some("file") | None);
        if is_file && text.is_none() {
            text = Some(
                field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable upload: {e}")))?,
            );
        }
    }
    let text = text.ok_or_else(|| AppError::Validation("missing file field".into()))?;

    let summary = import_customers_csv(&state, &text).await?;
    Ok(Json(summary))
}
