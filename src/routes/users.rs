// User endpoints: sales-executive directory and admin user creation.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{AppError, AppResult};
use crate::models::UserRole;
use crate::session::SessionUser;
use crate::state::{AppState, create_user, list_sales_executives};

use super::helpers::require_admin;

#[derive(Serialize)]
pub struct SalesExecutiveView {
    pub username: String,
    pub display_name: String,
}

#[derive(Deserialize)]
pub struct UserForm {
    pub username: String,
    pub display_name: String,
    pub pin: String,
    #[serde(default)]
    pub role: Option<String>,
}

pub async fn sales_executives_index(
    _session: SessionUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<SalesExecutiveView>>> {
    let executives = list_sales_executives(&state).await?;
    Ok(Json(
        executives
            .into_iter()
            .map(|u| SalesExecutiveView {
                username: u.username,
                display_name: u.display_name,
            })
            .collect(),
    ))
}

pub async fn users_create(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<UserForm>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    require_admin(&session)?;
    let role = match form.role.as_deref() {
        None | Some("user") => UserRole::User,
        Some("admin") => UserRole::Admin,
        Some(other) => {
            return Err(AppError::Validation(format!("invalid role \"{other}\"")));
        }
    };
    let id = create_user(&state, &form.username, &form.display_name, &form.pin, role).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_hex() })),
    ))
}
