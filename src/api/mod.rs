//! API endpoint modules.

pub mod dashboard;
pub mod health;
pub mod openapi;

pub use dashboard::configure_routes as configure_dashboard_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
