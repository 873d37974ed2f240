// HTTP layer - the axum adapter the chat bot talks to.

#[path = "api_error.rs"]
pub mod api_error;

#[path = "brainrot_routes.rs"]
pub mod brainrot_routes;

pub use brainrot_routes::router;
