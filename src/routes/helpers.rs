use chrono::{NaiveDate, TimeZone, Utc};
use mongodb::bson::{DateTime, oid::ObjectId};
use std::str::FromStr;

use crate::errors::{AppError, AppResult};
use crate::models::Vehicle;
use crate::session::SessionUser;

pub(super) fn require_admin(session: &SessionUser) -> AppResult<()> {
    if !session.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub(super) fn parse_object_id(value: &str, label: &str) -> AppResult<ObjectId> {
    ObjectId::from_str(value.trim())
        .map_err(|_| AppError::Validation(format!("invalid {label} id")))
}

/// Accepts a bare day ("2024-05-01") or a full RFC3339 timestamp.
pub(super) fn parse_date_field(value: &str, label: &str) -> AppResult<DateTime> {
    let trimmed = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap());
        return Ok(DateTime::from_chrono(midnight));
    }
    DateTime::parse_rfc3339_str(trimmed).map_err(|_| {
        AppError::Validation(format!("invalid {label} (use YYYY-MM-DD or RFC3339)"))
    })
}

pub(super) fn parse_vehicle(value: &str) -> AppResult<Vehicle> {
    Vehicle::parse(value)
        .ok_or_else(|| AppError::Validation(format!("invalid vehicle \"{value}\"")))
}
