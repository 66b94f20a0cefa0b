//! Chain routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inspected request (forward = true)
//!     → chain.rs (consume first hop from the sfp header,
//!                 rewrite header to the remainder)
//!     → forwarder.rs (relay to the resolved hop over the transport
//!                     matching its scheme: mTLS for https, plain for http)
//!     → upstream response copied verbatim back to the caller
//! ```
//!
//! # Design Decisions
//! - The chain header is mutated exactly once per hop
//! - A request without a usable chain header is a protocol error and gets
//!   an explicit error response, never a silent drop
//! - Next-hop transports are built once at startup; the connection pool is
//!   the only shared mutable state and is internally synchronized

pub mod chain;
pub mod forwarder;

pub use chain::{resolve_next_hop, ChainError, NextHop, CHAIN_HEADER};
pub use forwarder::{ForwardError, Forwarder};
