//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     PEM files on disk
//!         → identity.rs (server-role and client-role TlsIdentity)
//!         → tls.rs (TLS 1.3-pinned server config, client auth required)
//!         → frozen for the process lifetime
//!
//! Incoming TLS connection
//!     → handshake verifies the caller's certificate against the
//!       server-role CA pool (rejection happens here, pre-HTTP)
//!     → hand off to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Two named identities, constructed independently, so each can be
//!   tested and rotated on its own
//! - Identities are immutable values passed by reference, never globals
//! - Authentication failure is a transport-layer rejection, not an
//!   application-layer drop

pub mod identity;
pub mod tls;

pub use identity::{IdentityError, IdentityRole, TlsIdentity};
