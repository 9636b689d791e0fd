// Bulk customer CSV import. File-level problems (empty file, unknown
// routes) abort with nothing written; row-level problems skip the row and
// are reported back, bounded to the first few messages.

use mongodb::bson::{DateTime, doc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::SystemTime;

use crate::errors::{AppError, AppResult};
use crate::models::{Customer, DeliveryRoute};

use super::customers::spawn_order_propagation;
use super::registry::{find_route_by_name, find_sales_executive_by_display_name, normalize_route_name};
use super::{AppState, MAX_IMPORT_ERRORS};

// Header names are case-sensitive. Green/Orange are the legacy labels for
// the standard/premium prices, kept for compatibility with existing sheets.
#[derive(Debug, Deserialize)]
struct CustomerCsvRow {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Route")]
    route: Option<String>,
    #[serde(rename = "SalesExecutive")]
    sales_executive: Option<String>,
    #[serde(rename = "GreenPrice")]
    green_price: Option<String>,
    #[serde(rename = "OrangePrice")]
    orange_price: Option<String>,
    #[serde(rename = "Phone")]
    phone: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub imported: u64,
    pub updated: u64,
    pub failed: u64,
    pub errors: Vec<String>,
}

impl ImportSummary {
    fn fail(&mut self, message: String) {
        self.failed += 1;
        if self.errors.len() < MAX_IMPORT_ERRORS {
            self.errors.push(message);
        }
    }
}

/// Sequential row loop: each row is validated, then upserted by
/// case-insensitive name (existing customers are updated in place, new ones
/// created). Row numbers in failure messages are 1-based over data rows.
pub async fn import_customers_csv(state: &AppState, text: &str) -> AppResult<ImportSummary> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("CSV file is empty".into()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let rows: Vec<Result<CustomerCsvRow, csv::Error>> = reader.deserialize().collect();
    if rows.is_empty() {
        return Err(AppError::Validation("CSV file is empty".into()));
    }

    let routes = resolve_routes(state, &rows).await?;

    let mut summary = ImportSummary::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, row) in rows.into_iter().enumerate() {
        let n = idx + 1;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                summary.fail(format!("row {n}: {err}"));
                continue;
            }
        };

        let Some(name) = field(&row.name) else {
            summary.fail(format!("row {n}: Name is required"));
            continue;
        };
        let Some(route_name) = field(&row.route) else {
            summary.fail(format!("row {n} ({name}): Route is required"));
            continue;
        };
        let Some(executive_name) = field(&row.sales_executive) else {
            summary.fail(format!("row {n} ({name}): SalesExecutive is required"));
            continue;
        };

        let standard_price = match required_price(&row.green_price, "GreenPrice") {
            Ok(value) => value,
            Err(reason) => {
                summary.fail(format!("row {n} ({name}): {reason}"));
                continue;
            }
        };
        let premium_price = match required_price(&row.orange_price, "OrangePrice") {
            Ok(value) => value,
            Err(reason) => {
                summary.fail(format!("row {n} ({name}): {reason}"));
                continue;
            }
        };

        let executive = match find_sales_executive_by_display_name(state, &executive_name).await? {
            Some(user) => user,
            None => {
                summary.fail(format!(
                    "row {n} ({name}): unknown sales executive \"{executive_name}\""
                ));
                continue;
            }
        };

        let name_lc = name.to_lowercase();
        if !seen.insert(name_lc.clone()) {
            summary.fail(format!("row {n} ({name}): duplicate of an earlier row"));
            continue;
        }

        let Some(route) = routes.get(&normalize_route_name(&route_name)) else {
            // Pre-validated above; a miss here means the row spelled the
            // route differently from every resolved name.
            summary.fail(format!("row {n} ({name}): unknown route \"{route_name}\""));
            continue;
        };

        let phone = field(&row.phone);

        match state.customers.find_one(doc! { "name_lc": &name_lc }).await? {
            Some(existing) => {
                let Some(existing_id) = existing.id.clone() else {
                    summary.fail(format!("row {n} ({name}): customer record missing _id"));
                    continue;
                };
                state
                    .customers
                    .update_one(
                        doc! { "_id": &existing_id },
                        doc! { "$set": {
                            "sales_executive": &executive.username,
                            "standard_price": standard_price,
                            "premium_price": premium_price,
                            "phone": phone.clone(),
                            "updated_at": DateTime::from_system_time(SystemTime::now()),
                        } },
                    )
                    .await?;
                if existing.sales_executive != executive.username {
                    spawn_order_propagation(
                        state,
                        &existing_id,
                        Some(executive.username.clone()),
                        None,
                    );
                }
                summary.updated += 1;
            }
            None => {
                let Some(route_id) = route.id.clone() else {
                    summary.fail(format!("row {n} ({name}): route record missing _id"));
                    continue;
                };
                state
                    .customers
                    .insert_one(Customer {
                        id: None,
                        name: name.clone(),
                        name_lc,
                        route_id,
                        sales_executive: executive.username.clone(),
                        standard_price,
                        premium_price,
                        phone,
                        created_at: Some(DateTime::from_system_time(SystemTime::now())),
                        updated_at: None,
                    })
                    .await?;
                summary.imported += 1;
            }
        }
    }

    Ok(summary)
}

/// Every distinct route named in the file must resolve to an active route
/// before any row is written; a partial import on a bad route set is worse
/// than no import.
async fn resolve_routes(
    state: &AppState,
    rows: &[Result<CustomerCsvRow, csv::Error>],
) -> AppResult<HashMap<String, DeliveryRoute>> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for row in rows.iter().flatten() {
        if let Some(route) = field(&row.route) {
            names.insert(normalize_route_name(&route));
        }
    }

    let mut resolved = HashMap::new();
    let mut missing = Vec::new();
    for name in names {
        match find_route_by_name(state, &name).await? {
            Some(route) if route.is_active => {
                resolved.insert(name, route);
            }
            _ => missing.push(name),
        }
    }

    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "unknown or inactive route(s): {}",
            missing.join(", ")
        )));
    }
    Ok(resolved)
}

fn field(value: &Option<String>) -> Option<String> {
    value.as_ref().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn required_price(raw: &Option<String>, label: &str) -> Result<f64, String> {
    let Some(raw) = field(raw) else {
        return Err(format!("{label} is required"));
    };
    let value = parse_price(&raw).ok_or_else(|| format!("invalid {label} \"{raw}\""))?;
    if value < 0.0 {
        return Err(format!("{label} cannot be negative"));
    }
    Ok(value)
}

/// Accepts values like "₹45.50", "$1,200", "45". Currency symbols and
/// thousands separators are stripped before parsing.
fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
