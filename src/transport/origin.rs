//! Request origin extraction.

use http::HeaderMap;
use std::net::IpAddr;

/// Header carrying the proxy chain, client first.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Returns the address a request originated from.
///
/// The first entry of `X-Forwarded-For` wins when it parses as an IP
/// address; otherwise the directly connected `peer` is used.
///
/// # Examples
///
/// ```
/// use http::HeaderMap;
/// use std::net::IpAddr;
/// use taskledger::transport::origin_address;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
/// let peer: IpAddr = "10.0.0.1".parse().unwrap();
///
/// assert_eq!(
///     origin_address(&headers, Some(peer)),
///     Some("203.0.113.9".parse().unwrap())
/// );
/// ```
#[must_use]
pub fn origin_address(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or(peer)
}
