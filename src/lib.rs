pub mod agents;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod storage;
mod templates;

pub use routes::router;
