//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection (client certificate already verified)
//!     → server.rs (Axum setup, middleware, chain handler)
//!     → dpi decides forward/drop
//!     → routing layer consumes one chain-header hop and relays
//!     → upstream response copied back to the caller
//! ```

pub mod server;

pub use server::{build_router, AppState, HttpServer};
