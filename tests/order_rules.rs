#[path = "common/mod.rs"]
mod common;

use chrono::{Duration, TimeZone, Utc};
use mongodb::bson::{DateTime, doc, oid::ObjectId};

use repartodev::errors::AppError;
use repartodev::models::Vehicle;
use repartodev::state::{
    DELETED_CUSTOMER_NAME, bulk_delete_older_than, bulk_delete_within_last, create_order,
    get_priced_order, update_customer, update_order,
};

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime {
    DateTime::from_chrono(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
}

#[tokio::test]
async fn second_order_for_same_customer_and_day_conflicts() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let admin = common::admin_user(&state).await;
    let route_id = common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;
    let customer_id =
        common::seed_customer(&state, "Acme", &route_id, "ravi", 45.0, 52.0, None).await;

    create_order(&state, &admin, at(2026, 7, 1, 6), &customer_id, Vehicle::Van, 4.0, 0.0)
        .await
        .unwrap();

    // Any other timestamp within the same calendar day must be rejected.
    let err = create_order(&state, &admin, at(2026, 7, 1, 22), &customer_id, Vehicle::Van, 1.0, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // The next day is fine.
    create_order(&state, &admin, at(2026, 7, 2, 6), &customer_id, Vehicle::Van, 4.0, 0.0)
        .await
        .unwrap();

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn order_with_both_quantities_zero_is_rejected() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let admin = common::admin_user(&state).await;
    let route_id = common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;
    let customer_id =
        common::seed_customer(&state, "Acme", &route_id, "ravi", 45.0, 52.0, None).await;

    let err = create_order(&state, &admin, at(2026, 7, 1, 6), &customer_id, Vehicle::Van, 0.0, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn totals_follow_the_customers_current_prices() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let admin = common::admin_user(&state).await;
    let route_id = common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;
    let customer_id =
        common::seed_customer(&state, "Acme", &route_id, "ravi", 45.0, 52.0, None).await;

    let order = create_order(&state, &admin, at(2026, 7, 1, 6), &customer_id, Vehicle::Van, 4.0, 2.0)
        .await
        .unwrap();
    assert_eq!(order.standard_total, 4.0 * 45.0);
    assert_eq!(order.premium_total, 2.0 * 52.0);
    assert_eq!(order.total, 4.0 * 45.0 + 2.0 * 52.0);

    // Editing the customer's price re-prices the order on the next read
    // without touching the order document.
    update_customer(&state, &customer_id, "Acme", &route_id, "ravi", 50.0, 52.0, None)
        .await
        .unwrap();

    let order_id = ObjectId::parse_str(&order.id).unwrap();
    let repriced = get_priced_order(&state, &order_id).await.unwrap();
    assert_eq!(repriced.standard_total, 4.0 * 50.0);
    assert_eq!(repriced.total, 4.0 * 50.0 + 2.0 * 52.0);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn orders_for_a_vanished_customer_price_to_zero() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let admin = common::admin_user(&state).await;
    let route_id = common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;
    let customer_id =
        common::seed_customer(&state, "Acme", &route_id, "ravi", 45.0, 52.0, None).await;

    let order = create_order(&state, &admin, at(2026, 7, 1, 6), &customer_id, Vehicle::Van, 4.0, 2.0)
        .await
        .unwrap();

    // The ledger refuses to delete a referenced customer; remove the
    // document directly to simulate the dangling-reference case.
    state
        .customers
        .delete_one(doc! { "_id": &customer_id })
        .await
        .unwrap();

    let order_id = ObjectId::parse_str(&order.id).unwrap();
    let priced = get_priced_order(&state, &order_id).await.unwrap();
    assert_eq!(priced.customer_name, DELETED_CUSTOMER_NAME);
    assert_eq!(priced.standard_total, 0.0);
    assert_eq!(priced.premium_total, 0.0);
    assert_eq!(priced.total, 0.0);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn moving_an_order_to_another_customer_resnapshots_fields() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let admin = common::admin_user(&state).await;
    let north = common::seed_route(&state, "North").await;
    let south = common::seed_route(&state, "South").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;
    common::seed_executive(&state, "meena", "Meena Shah").await;
    let acme = common::seed_customer(&state, "Acme", &north, "ravi", 45.0, 52.0, None).await;
    let globex = common::seed_customer(&state, "Globex", &south, "meena", 40.0, 50.0, None).await;

    let order = create_order(&state, &admin, at(2026, 7, 1, 6), &acme, Vehicle::Van, 4.0, 0.0)
        .await
        .unwrap();
    let order_id = ObjectId::parse_str(&order.id).unwrap();

    let moved = update_order(&state, &order_id, at(2026, 7, 1, 6), &globex, Vehicle::Van, 4.0, 0.0)
        .await
        .unwrap();
    assert_eq!(moved.sales_executive, "meena");
    assert_eq!(moved.route_name, "SOUTH");
    assert_eq!(moved.standard_total, 4.0 * 40.0);

    // Moving back onto a customer that already has an order that day
    // conflicts.
    create_order(&state, &admin, at(2026, 7, 1, 8), &acme, Vehicle::Van, 1.0, 0.0)
        .await
        .unwrap();
    let err = update_order(&state, &order_id, at(2026, 7, 1, 6), &acme, Vehicle::Van, 4.0, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn bulk_deletes_report_counts() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let admin = common::admin_user(&state).await;
    let route_id = common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;
    let customer_id =
        common::seed_customer(&state, "Acme", &route_id, "ravi", 45.0, 52.0, None).await;

    let today = Utc::now();
    let old = DateTime::from_chrono(today - Duration::days(40));
    let recent = DateTime::from_chrono(today - Duration::days(2));

    create_order(&state, &admin, old, &customer_id, Vehicle::Van, 1.0, 0.0)
        .await
        .unwrap();
    create_order(&state, &admin, recent, &customer_id, Vehicle::Van, 1.0, 0.0)
        .await
        .unwrap();

    assert_eq!(bulk_delete_older_than(&state, 30).await.unwrap(), 1);
    assert_eq!(bulk_delete_within_last(&state, 7).await.unwrap(), 1);
    assert_eq!(bulk_delete_older_than(&state, 30).await.unwrap(), 0);

    common::teardown(Some(ctx)).await;
}
