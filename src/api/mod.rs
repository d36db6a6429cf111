//! Capture backend API integration.
//!
//! Provides the client for listing connections and the connection model.

pub mod client;
pub mod models;

pub use client::{ApiError, ConnectionsClient};
pub use models::{Connection, ConnectionStatus};
