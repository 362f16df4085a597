pub mod error;
pub mod handlers;
pub mod middleware;
pub mod monitor;
pub mod resorts;
pub mod routes;
pub mod runs;
pub mod scrape;
pub mod status;

pub use error::ApiError;
pub use routes::create_router;
