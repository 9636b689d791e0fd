// User directory and cookie-token sessions.

use data_encoding::HEXLOWER;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use sha1::{Digest, Sha1};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{Session, User, UserRole};

use super::{AppState, SESSION_TTL_SECONDS};

pub fn hash_pin(pin: &str) -> String {
    HEXLOWER.encode(&Sha1::digest(pin.as_bytes()))
}

pub fn verify_pin(user: &User, pin: &str) -> bool {
    user.pin_hash == hash_pin(pin)
}

pub async fn find_user(state: &AppState, username: &str) -> AppResult<Option<User>> {
    state
        .users
        .find_one(doc! { "username": username })
        .await
        .map_err(Into::into)
}

pub async fn get_user_by_id(state: &AppState, id: &ObjectId) -> AppResult<Option<User>> {
    state
        .users
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

/// Sales executives are the non-admin users; listed for filter dropdowns
/// and order assignment.
pub async fn list_sales_executives(state: &AppState) -> AppResult<Vec<User>> {
    let mut cursor = state
        .users
        .find(doc! { "role": UserRole::User.as_str() })
        .sort(doc! { "display_name": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(user) = cursor.try_next().await? {
        items.push(user);
    }
    Ok(items)
}

pub async fn create_user(
    state: &AppState,
    username: &str,
    display_name: &str,
    pin: &str,
    role: UserRole,
) -> AppResult<ObjectId> {
    let username = username.trim();
    let display_name = display_name.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }
    if display_name.is_empty() {
        return Err(AppError::Validation("display name is required".into()));
    }
    if pin.len() < 4 || pin.len() > 6 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("PIN must be 4 to 6 digits".into()));
    }

    if find_user(state, username).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "username \"{username}\" is already taken"
        )));
    }

    let res = state
        .users
        .insert_one(User {
            id: None,
            username: username.to_string(),
            display_name: display_name.to_string(),
            display_name_lc: display_name.to_lowercase(),
            pin_hash: hash_pin(pin),
            role,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Validation("user insert missing _id".into()))
}

pub async fn create_session(state: &AppState, username: &str) -> AppResult<String> {
    let _ = state
        .sessions
        .delete_many(doc! { "username": username })
        .await;

    let token = Uuid::new_v4().simple().to_string();
    let expires_at =
        DateTime::from_system_time(SystemTime::now() + Duration::from_secs(SESSION_TTL_SECONDS));

    state
        .sessions
        .insert_one(Session {
            id: None,
            token: token.clone(),
            username: username.to_string(),
            expires_at,
        })
        .await?;

    Ok(token)
}

pub async fn find_user_by_session(state: &AppState, token: &str) -> AppResult<Option<User>> {
    if let Some(session) = state.sessions.find_one(doc! { "token": token }).await? {
        if session.expires_at.to_system_time() <= SystemTime::now() {
            // Remove expired session, ignore result
            let _ = state.sessions.delete_one(doc! { "token": token }).await;
            return Ok(None);
        }
        find_user(state, &session.username).await
    } else {
        Ok(None)
    }
}

pub async fn delete_session(state: &AppState, token: &str) -> AppResult<()> {
    let _ = state.sessions.delete_one(doc! { "token": token }).await?;
    Ok(())
}
