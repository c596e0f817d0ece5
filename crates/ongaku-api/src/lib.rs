//! HTTP client for the status backend, plus the interactive login flow.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use client::StatusClient;
pub use error::ApiError;
