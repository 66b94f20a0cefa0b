//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, env-filterable)
//!     → metrics.rs (counters, histograms)
//!
//! The DPI additionally emits one audit event per inspected request on
//! the `audit` target (decision, hit flags, matched signatures/fields).
//!
//! Consumers:
//!     → Log aggregation (stdout, remote)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
