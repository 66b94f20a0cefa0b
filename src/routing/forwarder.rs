//! Outbound request relay.
//!
//! # Responsibilities
//! - Hold the two outbound transports: mutually-authenticated TLS for
//!   `https` next hops, plain HTTP for `http` next hops
//! - Pool outbound connections with a bounded per-host idle budget and a
//!   short idle timeout (this hop may sit in a high-fan-out chain)
//! - Relay the request target byte-for-byte: dot segments and percent
//!   escapes in the path and query reach the next hop exactly as
//!   transmitted, with no re-encoding or normalization
//! - Relay the upstream response verbatim; responses are never inspected

use std::fmt;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{
    HeaderName, CONNECTION, CONTENT_LENGTH, HOST, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
};
use axum::http::request::Parts;
use axum::http::uri::Uri;
use axum::http::{HeaderMap, Request, Response};
use http_body_util::Full;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::config::ForwarderConfig;
use crate::net::identity::TlsIdentity;
use crate::routing::chain::NextHop;

/// Connection-scoped headers that must not be relayed between hops.
const HOP_BY_HOP_HEADERS: &[HeaderName] = &[
    CONNECTION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to build outbound tls configuration: {0}")]
    Tls(#[source] rustls::Error),
    #[error("next hop {hop} requires TLS but no client-role identity is configured")]
    NoClientIdentity { hop: Url },
    #[error("cannot build upstream uri for hop {hop}: {source}")]
    UpstreamUri {
        hop: Url,
        #[source]
        source: axum::http::Error,
    },
    #[error("upstream request to {hop} failed: {source}")]
    Upstream {
        hop: Url,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

/// Single-host reverse-proxy core: picks the transport matching the next
/// hop's scheme and relays one request.
pub struct Forwarder {
    /// Plain transport for `http` next hops. No TLS material attached.
    plain: Client<HttpConnector, Full<Bytes>>,
    /// Mutually-authenticated transport for `https` next hops: presents
    /// the client-role certificate and validates the peer against the
    /// client-role CA pool. Absent when no client identity is configured.
    tls: Option<Client<HttpsConnector<HttpConnector>, Full<Bytes>>>,
}

impl fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forwarder")
            .field("tls", &self.tls.is_some())
            .finish_non_exhaustive()
    }
}

impl Forwarder {
    /// Build both outbound transports.
    ///
    /// `client_identity` may be omitted for hops whose entire downstream
    /// chain is plaintext; forwarding to an `https` hop will then fail
    /// explicitly per request.
    pub fn new(
        config: &ForwarderConfig,
        client_identity: Option<&TlsIdentity>,
    ) -> Result<Self, ForwardError> {
        let plain = client_builder(config).build(http_connector(config, true));

        let tls = match client_identity {
            Some(identity) => {
                let tls_config = rustls::ClientConfig::builder_with_protocol_versions(&[
                    &rustls::version::TLS13,
                ])
                .with_root_certificates(identity.roots())
                .with_client_auth_cert(identity.cert_chain(), identity.key())
                .map_err(ForwardError::Tls)?;

                let connector = hyper_rustls::HttpsConnectorBuilder::new()
                    .with_tls_config(tls_config)
                    .https_only()
                    .enable_http1()
                    .wrap_connector(http_connector(config, false));

                Some(client_builder(config).build(connector))
            }
            None => None,
        };

        Ok(Self { plain, tls })
    }

    /// Relay one request to the resolved next hop and hand back the
    /// upstream response with its body streamed through.
    pub async fn forward(
        &self,
        hop: &NextHop,
        parts: &Parts,
        body: Bytes,
    ) -> Result<Response<Body>, ForwardError> {
        let uri = upstream_uri(&hop.url, &parts.uri).map_err(|source| {
            ForwardError::UpstreamUri { hop: hop.url.clone(), source }
        })?;

        let mut headers = parts.headers.clone();
        strip_connection_headers(&mut headers);
        // Host and Content-Length follow the upstream URI and the buffered
        // body; the originals must not leak through.
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);

        let mut request = Request::new(Full::new(body));
        *request.method_mut() = parts.method.clone();
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;

        let response = match (hop.is_tls(), &self.tls) {
            (false, _) => self.plain.request(request).await,
            (true, Some(tls)) => tls.request(request).await,
            (true, None) => {
                return Err(ForwardError::NoClientIdentity { hop: hop.url.clone() })
            }
        }
        .map_err(|source| ForwardError::Upstream { hop: hop.url.clone(), source })?;

        let (mut response_parts, upstream_body) = response.into_parts();
        strip_connection_headers(&mut response_parts.headers);
        Ok(Response::from_parts(response_parts, Body::new(upstream_body)))
    }
}

/// Rebuild the request target against the hop address.
///
/// The request's path and query are copied over untouched. A hop URL
/// carrying its own path gets it prefixed, and its query merged, the way
/// single-host reverse proxies conventionally rewrite targets.
fn upstream_uri(hop: &Url, original: &Uri) -> Result<Uri, axum::http::Error> {
    let authority = match (hop.host_str().unwrap_or_default(), hop.port()) {
        (host, Some(port)) => format!("{host}:{port}"),
        (host, None) => host.to_string(),
    };

    let path = single_joining_slash(hop.path(), original.path());
    let path_and_query = match merge_query(hop.query(), original.query()) {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };

    Uri::builder()
        .scheme(hop.scheme())
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
}

fn single_joining_slash(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

fn merge_query(base: Option<&str>, request: Option<&str>) -> Option<String> {
    match (base, request) {
        (None, None) => None,
        (Some(b), None) => Some(b.to_string()),
        (None, Some(r)) => Some(r.to_string()),
        (Some(b), Some(r)) => Some(format!("{b}&{r}")),
    }
}

fn client_builder(config: &ForwarderConfig) -> hyper_util::client::legacy::Builder {
    let mut builder = Client::builder(TokioExecutor::new());
    builder
        .pool_max_idle_per_host(config.max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs));
    builder
}

fn http_connector(config: &ForwarderConfig, enforce_http: bool) -> HttpConnector {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
    connector.enforce_http(enforce_http);
    connector
}

fn strip_connection_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use crate::routing::chain::NextHop;

    fn forwarder_without_client_identity() -> Forwarder {
        Forwarder::new(&ForwarderConfig::default(), None).unwrap()
    }

    #[test]
    fn connection_scoped_headers_are_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("x-keep", HeaderValue::from_static("yes"));

        strip_connection_headers(&mut headers);

        assert!(headers.get(CONNECTION).is_none());
        assert!(headers.get(TRANSFER_ENCODING).is_none());
        assert_eq!(headers.get("x-keep").unwrap(), "yes");
    }

    #[test]
    fn traversal_path_is_relayed_without_normalization() {
        let hop = Url::parse("http://next-sf:8080").unwrap();
        let original: Uri = "/files/../../etc/passwd".parse().unwrap();

        let uri = upstream_uri(&hop, &original).unwrap();
        assert_eq!(uri.to_string(), "http://next-sf:8080/files/../../etc/passwd");
    }

    #[test]
    fn percent_escapes_are_relayed_as_transmitted() {
        let hop = Url::parse("http://next-sf:8080").unwrap();
        let original: Uri = "/files/..%2f..%2fetc%2fpasswd?q=..%2f".parse().unwrap();

        let uri = upstream_uri(&hop, &original).unwrap();
        assert_eq!(
            uri.to_string(),
            "http://next-sf:8080/files/..%2f..%2fetc%2fpasswd?q=..%2f"
        );
    }

    #[test]
    fn hop_base_path_is_prefixed_to_the_request_path() {
        let hop = Url::parse("http://next-sf:8080/base/").unwrap();
        let original: Uri = "/x?a=1".parse().unwrap();

        let uri = upstream_uri(&hop, &original).unwrap();
        assert_eq!(uri.to_string(), "http://next-sf:8080/base/x?a=1");
    }

    #[test]
    fn hop_and_request_queries_are_merged() {
        let hop = Url::parse("http://next-sf:8080/svc?fixed=1").unwrap();
        let original: Uri = "/x?a=2".parse().unwrap();

        let uri = upstream_uri(&hop, &original).unwrap();
        assert_eq!(uri.to_string(), "http://next-sf:8080/svc/x?fixed=1&a=2");
    }

    #[tokio::test]
    async fn https_hop_without_client_identity_is_rejected() {
        let forwarder = forwarder_without_client_identity();
        let hop = NextHop { url: Url::parse("https://next-sf:9443").unwrap() };
        let parts = axum::http::Request::builder()
            .uri("/x")
            .body(Body::empty())
            .unwrap()
            .into_parts()
            .0;

        let err = forwarder.forward(&hop, &parts, Bytes::new()).await.unwrap_err();
        assert!(matches!(err, ForwardError::NoClientIdentity { .. }));
    }
}
