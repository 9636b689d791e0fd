// Delivery-route endpoints: lookup list plus admin CRUD with the
// referential delete guard.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::AppResult;
use crate::session::SessionUser;
use crate::state::{AppState, create_route, delete_route, list_routes, update_route};

use super::helpers::{parse_object_id, require_admin};

#[derive(Serialize)]
pub struct RouteView {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct RouteForm {
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

pub async fn routes_index(
    _session: SessionUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<RouteView>>> {
    let routes = list_routes(&state).await?;
    Ok(Json(
        routes
            .into_iter()
            .map(|r| RouteView {
                id: r.id.map(|i| i.to_hex()).unwrap_or_default(),
                name: r.name,
                is_active: r.is_active,
            })
            .collect(),
    ))
}

pub async fn routes_create(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<RouteForm>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    require_admin(&session)?;
    let id = create_route(&state, &form.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_hex() })),
    ))
}

pub async fn routes_update(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<RouteForm>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&session)?;
    let object_id = parse_object_id(&id, "route")?;
    update_route(&state, &object_id, &form.name, form.is_active).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn routes_delete(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&session)?;
    let object_id = parse_object_id(&id, "route")?;
    delete_route(&state, &object_id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
