//! Request normalization for inspection.
//!
//! # Responsibilities
//! - Extract the inspectable surface of a request: URL, body, header
//!   values, cookie values
//! - Best-effort percent-decode and lower-case each piece
//! - Never drop data: a failed decode falls back to the raw value
//!
//! The produced field order is fixed: slot 0 = URL (path + query), slot 1 =
//! body, then all non-cookie header values, then all cookie values. The
//! body is deliberately NOT percent-decoded so signatures written against
//! raw payload bytes still match it as transmitted.

use axum::http::header::COOKIE;
use axum::http::request::Parts;
use percent_encoding::percent_decode_str;

/// Outcome of a best-effort decode.
///
/// Keeps the fallback-on-failure behavior explicit instead of signalling it
/// through sentinel values; callers log on `succeeded == false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub value: String,
    pub succeeded: bool,
}

/// Ordered, lower-cased field set extracted from one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    fields: Vec<String>,
}

impl NormalizedRequest {
    /// All fields in inspection order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Slot 0: normalized URL (decoded path + query, lower-cased).
    pub fn url(&self) -> &str {
        &self.fields[0]
    }

    /// Slot 1: normalized body (lower-cased, not percent-decoded).
    pub fn body(&self) -> &str {
        &self.fields[1]
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Percent-decode a URL path component. `+` is left untouched.
pub fn decode_path(raw: &str) -> Decoded {
    match percent_decode_str(raw).decode_utf8() {
        Ok(value) => Decoded { value: value.into_owned(), succeeded: true },
        Err(_) => Decoded { value: raw.to_string(), succeeded: false },
    }
}

/// Percent-decode a query-style component. `+` becomes a space first
/// (form-encoding semantics), matching how queries, header values and
/// cookie values are conventionally encoded.
pub fn decode_query(raw: &str) -> Decoded {
    let unplused = raw.replace('+', " ");
    match percent_decode_str(&unplused).decode_utf8() {
        Ok(value) => Decoded { value: value.into_owned(), succeeded: true },
        // Fall back to the raw input, not the `+`-substituted form.
        Err(_) => Decoded { value: raw.to_string(), succeeded: false },
    }
}

fn decode_logged(raw: &str, what: &str, decode: fn(&str) -> Decoded) -> String {
    let decoded = decode(raw);
    if !decoded.succeeded {
        tracing::warn!(target: "dpi", kind = what, value = %decoded.value, "decode failed, using raw value");
    }
    decoded.value
}

/// Extract and canonicalize the inspectable fields of a request.
///
/// `body` must be the fully buffered request body; the caller keeps the
/// same bytes for forwarding, so inspection never consumes the request.
/// Nothing in here is fatal: every decode failure degrades to the raw
/// value plus a log entry.
pub fn normalize(parts: &Parts, body: &[u8]) -> NormalizedRequest {
    // Slot 0: path + query, each decoded best-effort, concatenated and
    // lower-cased. A fragment never appears in a server-received
    // request-target, so there is nothing to append for it.
    let path = decode_logged(parts.uri.path(), "url-path", decode_path);
    let query = decode_logged(parts.uri.query().unwrap_or(""), "url-query", decode_query);
    let url = format!("{}{}", path, query).to_lowercase();

    // Slot 1: body, lower-cased only. Not percent-decoded so signatures
    // match the payload as transmitted.
    let body = String::from_utf8_lossy(body).to_lowercase();

    // Header values, cookie header excluded (cookies are handled below).
    let mut header_fields = Vec::new();
    for (name, value) in parts.headers.iter() {
        if *name == COOKIE {
            continue;
        }
        let raw = String::from_utf8_lossy(value.as_bytes());
        header_fields.push(decode_logged(&raw, "header", decode_query).to_lowercase());
    }

    // Cookie values from every Cookie header. Malformed pairs are skipped,
    // quoted values unquoted, matching common cookie-parsing behavior.
    let mut cookie_fields = Vec::new();
    for value in parts.headers.get_all(COOKIE) {
        let raw = String::from_utf8_lossy(value.as_bytes());
        for pair in raw.split(';') {
            let Some((_, cookie_value)) = pair.trim().split_once('=') else {
                continue;
            };
            let cookie_value = cookie_value.trim().trim_matches('"');
            cookie_fields.push(decode_logged(cookie_value, "cookie", decode_query).to_lowercase());
        }
    }

    let mut fields = Vec::with_capacity(2 + header_fields.len() + cookie_fields.len());
    fields.push(url);
    fields.push(body);
    fields.extend(header_fields);
    fields.extend(cookie_fields);

    NormalizedRequest { fields }
}
