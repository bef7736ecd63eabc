//! Response header composition
//!
//! Pure functions over [`http::HeaderMap`]: given config snapshots and the
//! derived surrogate keys, compute the cache-control/surrogate-control
//! headers and (when the CORS edge module is enabled) the CORS headers an
//! outbound response should carry.
//!
//! Both functions are non-destructive where it matters: `Cache-Control`
//! is only a default, and CORS headers are never touched if the response
//! already carries its own.

use std::collections::BTreeSet;

use http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, VARY,
};
use regex::Regex;
use tracing::warn;

use crate::config::{CdnConfig, CorsModuleConfig, OriginMode};

/// Cache tag header consumed by the CDN
pub const SURROGATE_KEY: HeaderName = HeaderName::from_static("surrogate-key");

/// CDN-facing cache lifetime header (stripped before reaching browsers)
pub const SURROGATE_CONTROL: HeaderName = HeaderName::from_static("surrogate-control");

/// Apply surrogate and cache headers for a response carrying the given keys.
///
/// - `Surrogate-Key`: space-joined keys, only when non-empty
/// - `Surrogate-Control`: `max-age=<default_ttl>` plus the stale windows
///   when nonzero; only when `default_ttl > 0`
/// - `Cache-Control`: `public, max-age=<cache_ttl or default_ttl>`, set
///   only when the response doesn't already have one
pub fn apply_surrogate_headers(
    headers: &mut HeaderMap,
    cdn: &CdnConfig,
    keys: &BTreeSet<String>,
) {
    if !keys.is_empty() {
        let joined = keys.iter().cloned().collect::<Vec<_>>().join(" ");
        match HeaderValue::from_str(&joined) {
            Ok(value) => {
                headers.insert(SURROGATE_KEY, value);
            }
            Err(_) => warn!("Surrogate keys contain non-header-safe characters, skipping"),
        }
    }

    if cdn.default_ttl > 0 {
        let mut parts = vec![format!("max-age={}", cdn.default_ttl)];
        if cdn.stale_while_revalidate > 0 {
            parts.push(format!("stale-while-revalidate={}", cdn.stale_while_revalidate));
        }
        if cdn.stale_if_error > 0 {
            parts.push(format!("stale-if-error={}", cdn.stale_if_error));
        }
        if let Ok(value) = HeaderValue::from_str(&parts.join(", ")) {
            headers.insert(SURROGATE_CONTROL, value);
        }
    }

    if !headers.contains_key(CACHE_CONTROL) {
        let ttl = if cdn.cache_ttl > 0 {
            cdn.cache_ttl
        } else {
            cdn.default_ttl
        };
        if ttl > 0 {
            if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl)) {
                headers.insert(CACHE_CONTROL, value);
            }
        }
    }
}

/// Apply CORS headers from the edge module configuration.
///
/// Acts only when the module is enabled, the request carried an `Origin`,
/// and the response has no CORS headers of its own. Origin resolution:
/// `Anyone` allows everyone with `*`; `Regex` matches
/// `^https?://<allowed_origins_regex>` against the request origin and
/// echoes the origin on match. An invalid regex is logged and treated as
/// no match.
pub fn apply_cors_headers(
    headers: &mut HeaderMap,
    module: &CorsModuleConfig,
    request_origin: Option<&str>,
) {
    if !module.enabled {
        return;
    }

    let origin = match request_origin {
        Some(o) if !o.is_empty() => o,
        _ => return,
    };

    // A response that already speaks CORS is left alone
    if headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN)
        || headers.contains_key(ACCESS_CONTROL_ALLOW_METHODS)
        || headers.contains_key(ACCESS_CONTROL_ALLOW_HEADERS)
    {
        return;
    }

    let allowed_origin = match module.origin_mode {
        OriginMode::Anyone => Some("*".to_string()),
        OriginMode::Regex => {
            if module.allowed_origins_regex.is_empty() {
                None
            } else {
                let pattern = format!("^https?://{}", module.allowed_origins_regex);
                match Regex::new(&pattern) {
                    Ok(re) if re.is_match(origin) => Some(origin.to_string()),
                    Ok(_) => None,
                    Err(e) => {
                        warn!(
                            "Invalid CORS allowed_origins_regex {:?}: {}",
                            module.allowed_origins_regex, e
                        );
                        None
                    }
                }
            }
        }
    };

    let Some(allowed_origin) = allowed_origin else {
        return;
    };

    match HeaderValue::from_str(&allowed_origin) {
        Ok(value) => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        Err(_) => {
            warn!("Origin {:?} is not header-safe, skipping CORS headers", origin);
            return;
        }
    }

    if !module.allowed_methods.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&module.allowed_methods) {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, value);
        }
    }

    if !module.allowed_headers.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&module.allowed_headers) {
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, value);
        }
    }

    append_vary(headers, "Origin");
}

/// Compose every outbound header in one pass.
///
/// Convenience for serving layers that don't care about the split:
/// surrogate/cache headers first, then CORS.
pub fn apply_response_headers(
    headers: &mut HeaderMap,
    cdn: &CdnConfig,
    module: &CorsModuleConfig,
    request_origin: Option<&str>,
    keys: &BTreeSet<String>,
) {
    apply_surrogate_headers(headers, cdn, keys);
    apply_cors_headers(headers, module, request_origin);
}

/// Merge a token into the `Vary` header without duplicating it
fn append_vary(headers: &mut HeaderMap, token: &str) {
    let existing: Vec<String> = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if existing.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        return;
    }

    let mut tokens = existing;
    tokens.push(token.to_string());
    if let Ok(value) = HeaderValue::from_str(&tokens.join(", ")) {
        headers.insert(VARY, value);
    }
}
