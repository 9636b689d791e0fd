// main.rs
// Axum server wiring: initializes MongoDB state, builds the router, and
// serves on :8080.
//
// Endpoints:
// - POST /login, /logout                 -> cookie sessions
// - GET/POST /api/orders                 -> role-scoped listing / creation
// - GET/PUT/DELETE /api/orders/{id}      -> single order (mutations admin)
// - GET  /api/orders/export              -> CSV export, same filters as list
// - POST /api/orders/purge               -> age-based bulk delete (admin)
// - /api/customers(, /{id}, /import)     -> customer ledger + CSV import
// - /api/routes(, /{id})                 -> route registry
// - GET /api/sales-executives, POST /api/users

use axum::{
    Router, middleware,
    routing::{get, post},
};
use dotenvy::dotenv;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use repartodev::{routes, session, state};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("repartodev=info")),
        )
        .init();

    let state = Arc::new(
        state::init_state()
            .await
            .expect("failed to initialize MongoDB state"),
    );

    let protected = Router::new()
        .route("/logout", post(routes::logout))
        .route(
            "/api/orders",
            get(routes::orders_index).post(routes::orders_create),
        )
        .route("/api/orders/export", get(routes::orders_export))
        .route("/api/orders/purge", post(routes::orders_purge))
        .route(
            "/api/orders/{id}",
            get(routes::orders_show)
                .put(routes::orders_update)
                .delete(routes::orders_delete),
        )
        .route(
            "/api/customers",
            get(routes::customers_index).post(routes::customers_create),
        )
        .route("/api/customers/import", post(routes::customers_import))
        .route(
            "/api/customers/{id}",
            axum::routing::put(routes::customers_update).delete(routes::customers_delete),
        )
        .route(
            "/api/routes",
            get(routes::routes_index).post(routes::routes_create),
        )
        .route(
            "/api/routes/{id}",
            axum::routing::put(routes::routes_update).delete(routes::routes_delete),
        )
        .route("/api/sales-executives", get(routes::sales_executives_index))
        .route("/api/users", post(routes::users_create))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let app = Router::new()
        .route("/login", post(routes::login))
        .merge(protected)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
