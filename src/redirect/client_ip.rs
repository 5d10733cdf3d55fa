//! Client address attribution for recorded clicks

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// First hop of `X-Forwarded-For` when it holds an address, otherwise the peer address
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    forwarded_for(headers).unwrap_or_else(|| peer.ip())
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = xff.split(',').next()?.trim();
    parse_hop(first)
}

/// Accepts bare addresses as well as `v4:port` and `[v6]:port` forms
fn parse_hop(hop: &str) -> Option<IpAddr> {
    if let Ok(ip) = hop.parse::<IpAddr>() {
        return Some(ip);
    }
    hop.parse::<SocketAddr>().ok().map(|addr| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 7], 50123))
    }

    fn headers_with_xff(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn no_header_uses_peer() {
        assert_eq!(client_ip(&HeaderMap::new(), peer()), peer().ip());
    }

    #[test]
    fn first_hop_wins() {
        let headers = headers_with_xff("203.0.113.9, 198.51.100.2, 10.0.0.1");
        assert_eq!(client_ip(&headers, peer()), "203.0.113.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn ipv6_and_port_forms() {
        let headers = headers_with_xff("2001:db8::1");
        assert_eq!(client_ip(&headers, peer()), "2001:db8::1".parse::<IpAddr>().unwrap());

        let headers = headers_with_xff("[2001:db8::2]:443, 10.0.0.1");
        assert_eq!(client_ip(&headers, peer()), "2001:db8::2".parse::<IpAddr>().unwrap());

        let headers = headers_with_xff("198.51.100.4:8080");
        assert_eq!(client_ip(&headers, peer()), "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn garbage_first_hop_falls_back_to_peer() {
        let headers = headers_with_xff("unknown, 203.0.113.9");
        assert_eq!(client_ip(&headers, peer()), peer().ip());

        let headers = headers_with_xff("");
        assert_eq!(client_ip(&headers, peer()), peer().ip());
    }
}
