pub mod handlers;
pub mod rate_limit;
pub mod routes;

pub use routes::create_api_router;
