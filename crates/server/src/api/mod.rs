pub mod catalog;
pub mod handlers;
pub mod middleware;
pub mod profiles;
pub mod providers;
pub mod routes;
pub mod search;

pub use routes::create_router;
