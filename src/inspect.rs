//! Request inspection helpers.
//!
//! Extracts the normalized signals the verdict page needs from an inbound
//! HTTP request: query parameters, the requested language code, and the
//! client's apparent IP address behind an optional reverse-proxy chain.

use actix_web::{HttpRequest, web};
use std::collections::HashMap;
use thiserror::Error;

/// Language served when the request carries no usable `lang` parameter.
pub const DEFAULT_LANG: &str = "en_US";

/// Failures while resolving the client's apparent address.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Neither `X-Forwarded-For` nor a peer address was available.
    #[error("no remote address on connection")]
    NoRemoteAddr,
}

/// Decoded query parameters of a request. Repeated parameters keep the
/// last occurrence.
fn query_map(req: &HttpRequest) -> HashMap<String, String> {
    web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default()
}

/// Returns true iff the named query parameter exists and is non-empty.
pub fn is_param_set(req: &HttpRequest, param: &str) -> bool {
    query_map(req).get(param).is_some_and(|v| !v.is_empty())
}

/// Returns the requested language code.
///
/// The `lang` query parameter is passed through verbatim when present and
/// non-empty; there is no validation against the locale catalog. Unknown
/// codes reach the translation layer unchanged, which no-ops on them.
pub fn lang(req: &HttpRequest) -> String {
    match query_map(req).get("lang") {
        Some(v) if !v.is_empty() => v.clone(),
        _ => DEFAULT_LANG.to_string(),
    }
}

/// Parses a query parameter as an integer.
///
/// On success returns the parsed value together with a `&name=value`
/// fragment ready to be re-embedded in generated pagination links. On a
/// missing or malformed parameter returns the caller's default and an
/// empty fragment, silently.
pub fn get_qs(query: &HashMap<String, String>, param: &str, default: i64) -> (i64, String) {
    match query.get(param).map(|raw| (raw, raw.parse::<i64>())) {
        Some((raw, Ok(num))) => (num, format!("&{param}={raw}")),
        _ => (default, String::new()),
    }
}

/// Resolves the client's apparent IP address.
///
/// When `X-Forwarded-For` is present the *last* entry wins: the reverse
/// proxy appends the true remote address as the final hop, so earlier
/// entries are client-supplied and untrusted. Without the header, the
/// connection's peer address is used; a connection with no peer address
/// is surfaced as an error for the handler to judge.
pub fn get_host(req: &HttpRequest) -> Result<String, InspectError> {
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        && !forwarded.is_empty()
    {
        let last = forwarded.split(',').next_back().unwrap_or(forwarded);
        return Ok(last.trim().to_string());
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .ok_or(InspectError::NoRemoteAddr)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
