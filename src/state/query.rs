// Order query engine: role-scoped filtering, customer/route join, pricing,
// pagination, and aggregate summaries. All read paths price orders here so
// totals can never drift between the list, single fetch, and export.

use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::errors::{AppError, AppResult};
use crate::models::{Customer, Order, User, Vehicle};

use super::orders::day_bounds;
use super::{AppState, DEFAULT_PAGE_SIZE};

/// Placeholder shown when an order's customer no longer exists.
pub const DELETED_CUSTOMER_NAME: &str = "Customer Deleted";

/// Filter set for order listings and exports. `page`/`page_size` are ignored
/// by the export path.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub date: Option<DateTime>,
    pub route_id: Option<ObjectId>,
    pub vehicle: Option<Vehicle>,
    pub sales_executive: Option<String>,
    pub search: Option<String>,
    pub page: u64,
    pub page_size: u64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        OrderFilter {
            date: None,
            route_id: None,
            vehicle: None,
            sales_executive: None,
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// An order joined to its customer and route, with totals computed from the
/// customer's current prices. Orders never store money; this struct is the
/// only place totals come from.
#[derive(Debug, Clone, Serialize)]
pub struct PricedOrder {
    pub id: String,
    pub date: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub route_id: String,
    pub route_name: String,
    pub sales_executive: String,
    pub vehicle: &'static str,
    pub standard_qty: f64,
    pub premium_qty: f64,
    pub standard_price: f64,
    pub premium_price: f64,
    pub standard_total: f64,
    pub premium_total: f64,
    pub total: f64,
    pub created_by_username: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderSummary {
    pub total_orders: u64,
    pub standard_qty: f64,
    pub premium_qty: f64,
    pub total_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct OrderListing {
    pub orders: Vec<PricedOrder>,
    pub pagination: Pagination,
    pub summary: OrderSummary,
}

/// Totals derive from the customer's current unit prices at read time, so
/// editing a price re-prices every past order of that customer on the next
/// read. A missing customer prices to zero.
pub fn order_totals(order: &Order, customer: Option<&Customer>) -> (f64, f64, f64) {
    match customer {
        Some(c) => {
            let standard = order.standard_qty * c.standard_price;
            let premium = order.premium_qty * c.premium_price;
            (standard, premium, standard + premium)
        }
        None => (0.0, 0.0, 0.0),
    }
}

fn datetime_to_string(dt: &DateTime) -> String {
    dt.try_to_rfc3339_string()
        .unwrap_or_else(|_| dt.to_string())
}

fn priced_order(order: Order, customer: Option<&Customer>, route_name: String) -> PricedOrder {
    let (standard_total, premium_total, total) = order_totals(&order, customer);
    PricedOrder {
        id: order.id.map(|i| i.to_hex()).unwrap_or_default(),
        date: datetime_to_string(&order.date),
        customer_id: order.customer_id.to_hex(),
        customer_name: customer
            .map(|c| c.name.clone())
            .unwrap_or_else(|| DELETED_CUSTOMER_NAME.to_string()),
        customer_phone: customer.and_then(|c| c.phone.clone()),
        route_id: order.route_id.to_hex(),
        route_name,
        sales_executive: order.sales_executive,
        vehicle: order.vehicle.as_str(),
        standard_qty: order.standard_qty,
        premium_qty: order.premium_qty,
        standard_price: customer.map(|c| c.standard_price).unwrap_or(0.0),
        premium_price: customer.map(|c| c.premium_price).unwrap_or(0.0),
        standard_total,
        premium_total,
        total,
        created_by_username: order.created_by_username,
        created_at: order.created_at.as_ref().map(datetime_to_string),
    }
}

/// Mongo predicate from the direct-filterable fields. Non-admin callers get
/// `sales_executive` pinned to their own username, whatever filter value
/// they supplied.
fn scoped_predicate(caller: &User, filter: &OrderFilter) -> Document {
    let mut predicate = doc! {};
    if let Some(date) = filter.date {
        let (start, end) = day_bounds(date);
        predicate.insert("date", doc! { "$gte": start, "$lte": end });
    }
    if let Some(route_id) = &filter.route_id {
        predicate.insert("route_id", route_id);
    }
    if let Some(vehicle) = filter.vehicle {
        predicate.insert("vehicle", vehicle.as_str());
    }
    if caller.role.is_admin() {
        if let Some(executive) = &filter.sales_executive {
            if !executive.trim().is_empty() {
                predicate.insert("sales_executive", executive.trim());
            }
        }
    } else {
        predicate.insert("sales_executive", caller.username.as_str());
    }
    predicate
}

/// Two-pass join: fetch the filtered orders, batch-fetch the customers and
/// routes they reference, then assemble priced rows in memory. The search
/// filter runs post-join because it matches joined customer fields.
async fn fetch_priced_orders(
    state: &AppState,
    caller: &User,
    filter: &OrderFilter,
) -> AppResult<Vec<PricedOrder>> {
    let mut cursor = state
        .orders
        .find(scoped_predicate(caller, filter))
        .sort(doc! { "date": -1, "created_at": -1 })
        .await?;
    let mut orders: Vec<Order> = Vec::new();
    while let Some(order) = cursor.try_next().await? {
        orders.push(order);
    }

    let customer_ids: Vec<ObjectId> = orders
        .iter()
        .map(|o| o.customer_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let mut customers: HashMap<ObjectId, Customer> = HashMap::new();
    if !customer_ids.is_empty() {
        let mut cursor = state
            .customers
            .find(doc! { "_id": { "$in": &customer_ids } })
            .await?;
        while let Some(customer) = cursor.try_next().await? {
            if let Some(id) = customer.id.clone() {
                customers.insert(id, customer);
            }
        }
    }

    let route_ids: Vec<ObjectId> = orders
        .iter()
        .map(|o| o.route_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let mut route_names: HashMap<ObjectId, String> = HashMap::new();
    if !route_ids.is_empty() {
        let mut cursor = state
            .routes
            .find(doc! { "_id": { "$in": &route_ids } })
            .await?;
        while let Some(route) = cursor.try_next().await? {
            if let Some(id) = route.id.clone() {
                route_names.insert(id, route.name);
            }
        }
    }

    let mut rows: Vec<PricedOrder> = orders
        .into_iter()
        .map(|order| {
            let customer = customers.get(&order.customer_id);
            let route_name = route_names
                .get(&order.route_id)
                .cloned()
                .unwrap_or_default();
            priced_order(order, customer, route_name)
        })
        .collect();

    if let Some(search) = &filter.search {
        let needle = search.trim().to_lowercase();
        if !needle.is_empty() {
            rows.retain(|row| {
                row.customer_name.to_lowercase().contains(&needle)
                    || row
                        .customer_phone
                        .as_deref()
                        .map(|p| p.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            });
        }
    }

    Ok(rows)
}

/// One filtered set, two outputs: the requested page and a summary over the
/// entire set. The summary is exact, not a page-local approximation.
pub async fn list_orders(
    state: &AppState,
    caller: &User,
    filter: &OrderFilter,
) -> AppResult<OrderListing> {
    let rows = fetch_priced_orders(state, caller, filter).await?;

    let mut summary = OrderSummary {
        total_orders: rows.len() as u64,
        ..OrderSummary::default()
    };
    for row in &rows {
        summary.standard_qty += row.standard_qty;
        summary.premium_qty += row.premium_qty;
        summary.total_amount += row.total;
    }

    let page_size = if filter.page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        filter.page_size
    };
    let page = filter.page.max(1);
    let total = rows.len() as u64;
    let total_pages = total.div_ceil(page_size);

    let orders: Vec<PricedOrder> = rows
        .into_iter()
        .skip(((page - 1) * page_size) as usize)
        .take(page_size as usize)
        .collect();

    Ok(OrderListing {
        orders,
        pagination: Pagination {
            total,
            page,
            page_size,
            total_pages,
        },
        summary,
    })
}

/// Single-order read path; prices through the same join as the listing.
pub async fn get_priced_order(state: &AppState, id: &ObjectId) -> AppResult<PricedOrder> {
    let order = state
        .orders
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".into()))?;

    let customer = state
        .customers
        .find_one(doc! { "_id": &order.customer_id })
        .await?;
    let route_name = state
        .routes
        .find_one(doc! { "_id": &order.route_id })
        .await?
        .map(|r| r.name)
        .unwrap_or_default();

    Ok(priced_order(order, customer.as_ref(), route_name))
}

/// CSV export over the same scoping and filters as the listing, unpaginated.
/// The creator column is admin-only.
pub async fn export_orders_csv(
    state: &AppState,
    caller: &User,
    filter: &OrderFilter,
) -> AppResult<String> {
    let rows = fetch_priced_orders(state, caller, filter).await?;
    let include_creator = caller.role.is_admin();

    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        let mut header = vec![
            "Date",
            "Customer",
            "Route",
            "SalesExecutive",
            "Vehicle",
            "GreenQty",
            "OrangeQty",
            "GreenTotal",
            "OrangeTotal",
            "Total",
        ];
        if include_creator {
            header.push("CreatedBy");
        }
        writer.write_record(&header)?;

        for row in rows {
            let date = row.date.get(..10).unwrap_or(&row.date).to_string();
            let mut record = vec![
                date,
                row.customer_name,
                row.route_name,
                row.sales_executive,
                row.vehicle.to_string(),
                row.standard_qty.to_string(),
                row.premium_qty.to_string(),
                format!("{:.2}", row.standard_total),
                format!("{:.2}", row.premium_total),
                format!("{:.2}", row.total),
            ];
            if include_creator {
                record.push(row.created_by_username);
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
