//! Inbound TLS configuration.
//!
//! The listener accepts TLS 1.3 only, with no negotiation down to older
//! versions, and requires a client certificate chained to the server-role
//! CA pool. A caller that cannot present one is rejected during the
//! handshake, before any request bytes are read.

use rustls::server::WebPkiClientVerifier;
use rustls::ServerConfig;

use crate::net::identity::TlsIdentity;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to build client certificate verifier: {0}")]
    Verifier(#[from] rustls::server::VerifierBuilderError),
    #[error("invalid server certificate or key: {0}")]
    Certificate(#[from] rustls::Error),
}

/// Build the mutually-authenticated, TLS 1.3-pinned server configuration
/// from the server-role identity.
pub fn server_config(identity: &TlsIdentity) -> Result<ServerConfig, TlsError> {
    let verifier = WebPkiClientVerifier::builder(identity.roots()).build()?;

    let config = ServerConfig::builder_with_protocol_versions(&[&rustls::version::TLS13])
        .with_client_cert_verifier(verifier)
        .with_single_cert(identity.cert_chain(), identity.key())?;

    Ok(config)
}
