// routes/mod.rs
// Public re-exports of all route handlers.

mod helpers;

pub mod login;
pub mod orders;
pub mod customers;
pub mod delivery_routes;
pub mod users;

pub use login::{login, logout};
pub use orders::{
    orders_create, orders_delete, orders_export, orders_index, orders_purge, orders_show,
    orders_update,
};
pub use customers::{
    customers_create, customers_delete, customers_import, customers_index, customers_update,
};
pub use delivery_routes::{routes_create, routes_delete, routes_index, routes_update};
pub use users::{sales_executives_index, users_create};
