//! Service-function-chain header protocol.
//!
//! The `sfp` request header carries the remaining ordered hop list as a
//! comma-separated sequence of absolute URLs. Each hop consumes exactly
//! the first element and rewrites the header to the comma-joined rest;
//! once the list is exhausted the header is removed entirely, never left
//! as an empty string.

use axum::http::header::HeaderName;
use axum::http::{HeaderMap, HeaderValue};
use url::Url;

/// Chain-routing header name (case-insensitive per HTTP).
pub const CHAIN_HEADER: HeaderName = HeaderName::from_static("sfp");

/// Chain protocol violations. All of these are client-visible errors: a
/// request without a usable chain header cannot be routed anywhere and is
/// rejected explicitly instead of silently dropped.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("missing sfp chain header")]
    Missing,
    #[error("sfp chain header is not valid ASCII")]
    NotAscii,
    #[error("empty hop in sfp chain header")]
    EmptyHop,
    #[error("invalid next-hop url {hop:?}: {source}")]
    InvalidHop {
        hop: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported next-hop scheme {scheme:?} in {hop:?}")]
    UnsupportedScheme { hop: String, scheme: String },
}

/// The resolved next hop for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextHop {
    pub url: Url,
}

impl NextHop {
    pub fn is_tls(&self) -> bool {
        self.url.scheme() == "https"
    }
}

/// Consume the first hop from the chain header, rewriting the header to
/// the remaining list in place.
///
/// Given `sfp: A,B,C` the next hop is `A` and the header becomes `B,C`;
/// given `sfp: A` the next hop is `A` and the header is removed.
pub fn resolve_next_hop(headers: &mut HeaderMap) -> Result<NextHop, ChainError> {
    let value = headers.get(&CHAIN_HEADER).ok_or(ChainError::Missing)?;
    let value = value.to_str().map_err(|_| ChainError::NotAscii)?.to_string();

    let mut hops = value.split(',').map(str::trim);
    let first = hops.next().unwrap_or("");
    if first.is_empty() {
        return Err(ChainError::EmptyHop);
    }

    let url = Url::parse(first).map_err(|source| ChainError::InvalidHop {
        hop: first.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ChainError::UnsupportedScheme {
                hop: first.to_string(),
                scheme: scheme.to_string(),
            })
        }
    }

    // The header is mutated exactly once per hop: rewritten to the
    // remainder, or removed when this was the final hop. The rewritten
    // value is validated before the map is touched, so a failure never
    // drops the remaining hops silently.
    let remaining = hops.collect::<Vec<_>>().join(",");
    let rewritten = if remaining.is_empty() {
        None
    } else {
        Some(HeaderValue::from_str(&remaining).map_err(|_| ChainError::NotAscii)?)
    };

    headers.remove(&CHAIN_HEADER);
    if let Some(value) = rewritten {
        headers.insert(CHAIN_HEADER, value);
    }

    Ok(NextHop { url })
}
