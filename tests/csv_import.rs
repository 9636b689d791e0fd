#[path = "common/mod.rs"]
mod common;

use chrono::{TimeZone, Utc};
use mongodb::bson::DateTime;

use repartodev::errors::AppError;
use repartodev::models::Vehicle;
use repartodev::state::{
    OrderFilter, create_order, export_orders_csv, get_customer_by_id, import_customers_csv,
    list_customers,
};

const HEADER: &str = "Name,Route,SalesExecutive,GreenPrice,OrangePrice,Phone";

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime {
    DateTime::from_chrono(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
}

#[tokio::test]
async fn unknown_route_aborts_the_whole_file() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;

    let csv = format!(
        "{HEADER}\nAcme,North,Ravi Kumar,45,52,98765\nGlobex,Westside,Ravi Kumar,40,50,12345\n"
    );
    let err = import_customers_csv(&state, &csv).await.unwrap_err();
    match err {
        AppError::Validation(msg) => assert!(msg.contains("WESTSIDE"), "message was: {msg}"),
        other => panic!("expected Validation, got {other:?}"),
    }

    // Nothing at all may have been written, including the valid first row.
    assert!(list_customers(&state).await.unwrap().is_empty());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn empty_file_is_a_file_level_error() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();

    let err = import_customers_csv(&state, "").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    let err = import_customers_csv(&state, &format!("{HEADER}\n"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {err:?}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn bad_rows_fail_individually_and_are_named() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;

    let mut csv = String::from(HEADER);
    csv.push('\n');
    // Row 1 is missing its name; rows 2..=10 are fine.
    csv.push_str(",North,Ravi Kumar,45,52,111\n");
    for i in 2..=10 {
        csv.push_str(&format!("Customer {i},North,Ravi Kumar,45,52,{i}{i}{i}\n"));
    }

    let summary = import_customers_csv(&state, &csv).await.unwrap();
    assert_eq!(summary.imported + summary.updated, 9);
    assert_eq!(summary.failed, 1);
    assert!(
        summary.errors[0].contains("row 1"),
        "errors were: {:?}",
        summary.errors
    );

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn negative_prices_unknown_executives_and_dupes_fail_their_rows() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;

    let csv = format!(
        "{HEADER}\n\
         Acme,North,Ravi Kumar,\"₹1,200\",52.50,111\n\
         Globex,North,Ravi Kumar,-5,50,222\n\
         Initech,North,Nobody Known,45,52,333\n\
         ACME,North,Ravi Kumar,99,99,444\n"
    );
    let summary = import_customers_csv(&state, &csv).await.unwrap();
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.failed, 3);
    assert!(summary.errors.iter().any(|e| e.contains("negative")));
    assert!(summary.errors.iter().any(|e| e.contains("Nobody Known")));
    assert!(summary.errors.iter().any(|e| e.contains("duplicate")));

    // Currency symbols and separators are stripped on the way in.
    let customers = list_customers(&state).await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].standard_price, 1200.0);
    assert_eq!(customers[0].premium_price, 52.5);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn reimporting_an_existing_name_updates_in_place() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let route_id = common::seed_route(&state, "North").await;
    common::seed_executive(&state, "ravi", "Ravi Kumar").await;
    common::seed_executive(&state, "meena", "Meena Shah").await;
    let customer_id =
        common::seed_customer(&state, "Acme", &route_id, "ravi", 45.0, 52.0, Some("111")).await;

    let csv = format!("{HEADER}\nACME,North,Meena Shah,60,70,999\n");
    let summary = import_customers_csv(&state, &csv).await.unwrap();
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.failed, 0);

    let customers = list_customers(&state).await.unwrap();
    assert_eq!(customers.len(), 1, "upsert must not create a duplicate");

    let customer = get_customer_by_id(&state, &customer_id).await.unwrap().unwrap();
    assert_eq!(customer.sales_executive, "meena");
    assert_eq!(customer.standard_price, 60.0);
    assert_eq!(customer.premium_price, 70.0);
    assert_eq!(customer.phone.as_deref(), Some("999"));
    // The stored name keeps its original casing.
    assert_eq!(customer.name, "Acme");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn export_is_role_scoped_and_prices_rows() {
    let ctx = match common::setup_state().await {
        Some(s) => s,
        None => return,
    };
    let state = ctx.state.clone();
    let admin = common::admin_user(&state).await;
    let route_id = common::seed_route(&state, "North").await;
    let ravi = common::seed_executive(&state, "ravi", "Ravi Kumar").await;
    common::seed_executive(&state, "meena", "Meena Shah").await;
    let acme = common::seed_customer(&state, "Acme", &route_id, "ravi", 45.0, 52.0, None).await;
    let globex = common::seed_customer(&state, "Globex", &route_id, "meena", 40.0, 50.0, None).await;

    create_order(&state, &admin, at(2026, 7, 1, 6), &acme, Vehicle::Van, 4.0, 2.0)
        .await
        .unwrap();
    create_order(&state, &admin, at(2026, 7, 1, 6), &globex, Vehicle::Bike, 1.0, 0.0)
        .await
        .unwrap();

    let filter = OrderFilter::default();

    let admin_csv = export_orders_csv(&state, &admin, &filter).await.unwrap();
    assert!(admin_csv.starts_with("Date,Customer,Route,SalesExecutive,Vehicle"));
    assert!(admin_csv.contains("CreatedBy"));
    assert!(admin_csv.contains("Acme"));
    assert!(admin_csv.contains("Globex"));
    // 4×45 + 2×52 = 284
    assert!(admin_csv.contains("284.00"), "csv was: {admin_csv}");

    let exec_csv = export_orders_csv(&state, &ravi, &filter).await.unwrap();
    assert!(!exec_csv.contains("CreatedBy"));
    assert!(exec_csv.contains("Acme"));
    assert!(!exec_csv.contains("Globex"), "csv was: {exec_csv}");

    common::teardown(Some(ctx)).await;
}
