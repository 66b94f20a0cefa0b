//! TLS identity loading.
//!
//! A `TlsIdentity` is an (X.509 certificate chain, private key, trusted-CA
//! pool) triple loaded once from PEM files at startup. The router holds two
//! independently-constructed instances: the server-role identity presented
//! to upstream callers (with the CA pool used to authenticate them) and the
//! client-role identity presented to the next hop (with the CA pool used to
//! authenticate it). Both are immutable for the process lifetime and shared
//! read-only across connections.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::RootCertStore;

use crate::config::IdentityConfig;

/// Which side of the hop this identity serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRole {
    /// Shown to upstream callers; its CA pool authenticates them.
    Server,
    /// Shown to the next hop; its CA pool authenticates that hop.
    Client,
}

impl fmt::Display for IdentityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityRole::Server => write!(f, "server"),
            IdentityRole::Client => write!(f, "client"),
        }
    }
}

/// Errors loading an identity. All of these are fatal at startup: the
/// process must not begin serving with a partially-initialized trust
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{role} identity: failed to read {path}: {source}")]
    Read {
        role: IdentityRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{role} identity: invalid PEM in {path}: {source}")]
    InvalidPem {
        role: IdentityRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{role} identity: no certificates found in {path}")]
    NoCertificates { role: IdentityRole, path: PathBuf },
    #[error("{role} identity: no private key found in {path}")]
    NoPrivateKey { role: IdentityRole, path: PathBuf },
    #[error("{role} identity: no usable CA certificates in {path}")]
    EmptyCaPool { role: IdentityRole, path: PathBuf },
}

/// One TLS identity: certificate chain, private key, and trusted-CA pool.
pub struct TlsIdentity {
    role: IdentityRole,
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    roots: Arc<RootCertStore>,
}

impl fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsIdentity")
            .field("role", &self.role)
            .field("certs", &self.cert_chain.len())
            .field("ca_roots", &self.roots.len())
            .finish_non_exhaustive()
    }
}

impl TlsIdentity {
    /// Load an identity from the configured PEM files.
    pub fn load(role: IdentityRole, config: &IdentityConfig) -> Result<Self, IdentityError> {
        let cert_pem = read(role, &config.cert_path)?;
        let cert_chain = rustls_pemfile::certs(&mut cert_pem.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| IdentityError::InvalidPem {
                role,
                path: config.cert_path.clone(),
                source,
            })?;
        if cert_chain.is_empty() {
            return Err(IdentityError::NoCertificates { role, path: config.cert_path.clone() });
        }

        let key_pem = read(role, &config.key_path)?;
        let key = rustls_pemfile::private_key(&mut key_pem.as_slice())
            .map_err(|source| IdentityError::InvalidPem {
                role,
                path: config.key_path.clone(),
                source,
            })?
            .ok_or_else(|| IdentityError::NoPrivateKey { role, path: config.key_path.clone() })?;

        let ca_pem = read(role, &config.ca_path)?;
        let ca_certs = rustls_pemfile::certs(&mut ca_pem.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| IdentityError::InvalidPem {
                role,
                path: config.ca_path.clone(),
                source,
            })?;
        let mut roots = RootCertStore::empty();
        let (added, _) = roots.add_parsable_certificates(ca_certs);
        if added == 0 {
            return Err(IdentityError::EmptyCaPool { role, path: config.ca_path.clone() });
        }

        tracing::debug!(
            role = %role,
            certs = cert_chain.len(),
            ca_roots = added,
            "identity loaded"
        );

        Ok(Self { role, cert_chain, key, roots: Arc::new(roots) })
    }

    pub fn role(&self) -> IdentityRole {
        self.role
    }

    /// Owned copy of the certificate chain, for rustls config construction.
    pub fn cert_chain(&self) -> Vec<CertificateDer<'static>> {
        self.cert_chain.clone()
    }

    /// Owned copy of the private key, for rustls config construction.
    pub fn key(&self) -> PrivateKeyDer<'static> {
        self.key.clone_key()
    }

    /// The trusted-CA pool for peers authenticated under this identity.
    pub fn roots(&self) -> Arc<RootCertStore> {
        self.roots.clone()
    }
}

fn read(role: IdentityRole, path: &Path) -> Result<Vec<u8>, IdentityError> {
    fs::read(path).map_err(|source| IdentityError::Read {
        role,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_certificate_file_is_a_load_error() {
        let config = IdentityConfig {
            cert_path: "/nonexistent/server.crt".into(),
            key_path: "/nonexistent/server.key".into(),
            ca_path: "/nonexistent/ca.crt".into(),
        };
        let err = TlsIdentity::load(IdentityRole::Server, &config).unwrap_err();
        assert!(matches!(err, IdentityError::Read { role: IdentityRole::Server, .. }));
    }
}
