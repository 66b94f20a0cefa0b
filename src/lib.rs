//! Zero-trust service-function chain hop with deep packet inspection.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  SFC ROUTER (one hop)             │
//!                    │                                                   │
//!   mTLS request     │  ┌─────────┐   ┌──────────────────────────────┐  │
//!   ─────────────────┼─▶│  net    │──▶│            dpi               │  │
//!   (client cert     │  │ TLS 1.3 │   │ normalizer → detector →      │  │
//!    verified)       │  │ mutual  │   │ policy → forward / drop      │  │
//!                    │  └─────────┘   └──────────────┬───────────────┘  │
//!                    │                               │ forward           │
//!                    │                               ▼                   │
//!                    │                ┌──────────────────────────────┐   │
//!                    │                │           routing            │   │
//!                    │                │ sfp header: consume one hop, │   │
//!   mTLS (or plain)  │                │ rewrite rest, relay via the  │   │
//!   ─────────────────┼──────────────◀─│ scheme-matching transport    │   │
//!   to next hop      │                └──────────────────────────────┘   │
//!                    │                                                   │
//!                    │  config · observability (logging, metrics)        │
//!                    └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod dpi;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod observability;

pub use config::RouterConfig;
pub use dpi::{Dpi, EnforcementPolicy};
pub use http::HttpServer;
pub use net::TlsIdentity;
pub use routing::Forwarder;
