// models.rs
// Domain models for the delivery back-office MongoDB collections.

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// User roles for authorization. Sales executives carry the `user` role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

/// Vehicles a delivery round can go out on. Fixed set; every order stores one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Vehicle {
    Van,
    Truck,
    Bike,
    Auto,
}

impl Vehicle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vehicle::Van => "van",
            Vehicle::Truck => "truck",
            Vehicle::Bike => "bike",
            Vehicle::Auto => "auto",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "van" => Some(Vehicle::Van),
            "truck" => Some(Vehicle::Truck),
            "bike" => Some(Vehicle::Bike),
            "auto" => Some(Vehicle::Auto),
            _ => None,
        }
    }
}

/// Delivery route reference document. `name` is stored trimmed and
/// upper-cased; uniqueness is enforced under that normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRoute {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub is_active: bool,
    pub created_at: Option<DateTime>,
}

/// User document. `display_name_lc` is the stored lower-case key used for
/// the case-insensitive display-name lookup during CSV import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub display_name: String,
    pub display_name_lc: String,
    pub pin_hash: String,
    pub role: UserRole,
    pub created_at: Option<DateTime>,
}

/// Session document linking a cookie token to a user and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub token: String,
    pub username: String,
    pub expires_at: DateTime,
}

/// Customer document. `name_lc` is the stored lower-case key enforcing
/// global case-insensitive name uniqueness. Unit prices are the live source
/// of truth for order totals; orders never store money.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub name_lc: String,
    pub route_id: ObjectId,
    pub sales_executive: String,
    pub standard_price: f64,
    pub premium_price: f64,
    pub phone: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// Order document. `route_id` and `sales_executive` are copied from the
/// customer at creation time; customer updates overwrite the copies through
/// a best-effort propagation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub date: DateTime,
    pub customer_id: ObjectId,
    pub route_id: ObjectId,
    pub sales_executive: String,
    pub vehicle: Vehicle,
    pub standard_qty: f64,
    pub premium_qty: f64,
    pub created_by: ObjectId,
    pub created_by_username: String,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}
