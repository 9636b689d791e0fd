// routes/login.rs
// POST /login { "username": "...", "pin": "1234" } -> { "ok": true|false }

use axum::{
    extract::{Json, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::session::{SESSION_COOKIE_NAME, SessionUser};
use crate::state::{AppState, SESSION_TTL_SECONDS, create_session, delete_session, find_user, verify_pin};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub pin: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    match find_user(&state, body.username.trim()).await {
        Ok(Some(user)) if verify_pin(&user, &body.pin) => {
            match create_session(&state, &user.username).await {
                Ok(token) => {
                    let mut response = (
                        StatusCode::OK,
                        Json(serde_json::json!({
                            "ok": true,
                            "username": user.username,
                            "display_name": user.display_name,
                            "role": user.role.as_str(),
                        })),
                    )
                        .into_response();
                    if let Ok(header_value) = HeaderValue::from_str(&format!(
                        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                        SESSION_COOKIE_NAME, token, SESSION_TTL_SECONDS
                    )) {
                        response.headers_mut().append(SET_COOKIE, header_value);
                    }
                    response
                }
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": format!("session error: {e}") })),
                )
                    .into_response(),
            }
        }
        Ok(_) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "ok": false })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("db error: {e}") })),
        )
            .into_response(),
    }
}

pub async fn logout(
    session: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Response {
    let _ = delete_session(&state, session.token()).await;
    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response();
    if let Ok(header_value) = HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE_NAME
    )) {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
    response
}
