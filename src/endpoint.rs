//! Cluster entry point resolution.
//!
//! Every generated hosts line points at the address of the API server the
//! kubeconfig targets. A literal IP in the cluster URL is used as-is; a
//! hostname is resolved once at startup and the first answer wins.

use std::net::IpAddr;

use crate::error::{Error, Result};

/// Extracts the hostname from a cluster URL host component.
///
/// `http::Uri::host` keeps IPv6 literals bracketed (`[::1]`); the brackets
/// are stripped so the result parses as an [`IpAddr`].
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] if `host` is `None` or empty.
pub fn endpoint_host(url: &str, host: Option<&str>) -> Result<String> {
    let host = host
        .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::InvalidEndpoint(url.to_string()))?;
    Ok(host.to_string())
}

/// Resolves `host` to a single address.
///
/// # Errors
///
/// Returns [`Error::Resolve`] if the lookup fails and
/// [`Error::NoAddress`] if it returns nothing.
pub async fn resolve_host(host: &str) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        tracing::debug!(host = %host, "Cluster endpoint is an IP literal");
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|source| Error::Resolve {
            host: host.to_string(),
            source,
        })?;

    let ip = addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| Error::NoAddress {
            host: host.to_string(),
        })?;

    tracing::info!(host = %host, address = %ip, "Resolved cluster endpoint");
    Ok(ip)
}
