//! # Web Server
//!
//! - [`server`]: [`ServerCore`], which runs codec work off the async runtime
//! - [`routes`]: axum router exposing embed / extract / capacity endpoints

pub mod routes;
pub mod server;

pub use routes::router;
pub use server::ServerCore;
