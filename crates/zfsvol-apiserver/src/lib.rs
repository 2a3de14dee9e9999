//! zfsvol API Server - Docker volume plugin endpoint
//!
//! This crate provides:
//! - Axum-based HTTP server on a unix socket
//! - Socket activation support
//! - `/Plugin.Activate` and `/VolumeDriver.*` handlers

pub mod activation;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod protocol;
pub mod response;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use error::{ApiError, Result};
pub use server::{ApiServer, Config, DEFAULT_SOCKET_PATH};
pub use state::AppState;
