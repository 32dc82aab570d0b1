//! Device fingerprint (C5): a deterministic per-client identifier derived
//! from request signals, used to bind access tokens and refresh tokens to
//! the device that requested them.

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default)]
pub struct RequestSignals {
    pub user_agent: String,
    pub peer_ip: String,
    pub accept_language: String,
    pub accept_encoding: String,
}

/// First three octets of an IPv4 address, or the first six colon-separated
/// groups of an IPv6 address. Anything else (unparseable) passes through
/// untouched so the fingerprint still incorporates *something* stable.
fn partial_ip(ip: &str) -> String {
    if ip.contains('.') {
        let octets: Vec<&str> = ip.split('.').collect();
        octets.iter().take(3).cloned().collect::<Vec<_>>().join(".")
    } else if ip.contains(':') {
        let groups: Vec<&str> = ip.split(':').collect();
        groups.iter().take(6).cloned().collect::<Vec<_>>().join(":")
    } else {
        ip.to_string()
    }
}

/// `sha256(user_agent || "|" || partial_ip || "|" || accept_language || "|"
/// || accept_encoding)`. Missing headers yield empty segments.
pub fn compute(signals: &RequestSignals) -> String {
    let material = format!(
        "{}|{}|{}|{}",
        signals.user_agent,
        partial_ip(&signals.peer_ip),
        signals.accept_language,
        signals.accept_encoding,
    );
    let digest = Sha256::digest(material.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Proxy-aware peer extraction: `X-Forwarded-For` (first entry), then
/// `X-Real-IP`, then the raw socket peer.
pub fn extract_peer_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    socket_peer: &str,
) -> String {
    if let Some(xff) = forwarded_for {
        if let Some(first) = xff.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    if let Some(ip) = real_ip {
        if !ip.trim().is_empty() {
            return ip.trim().to_string();
        }
    }
    socket_peer.to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_signals_same_fingerprint() {
        let signals = RequestSignals {
            user_agent: "curl/8.0".to_string(),
            peer_ip: "203.0.113.42".to_string(),
            accept_language: "en-US".to_string(),
            accept_encoding: "gzip".to_string(),
        };
        assert_eq!(compute(&signals), compute(&signals));
    }

    #[test]
    fn different_ip_changes_fingerprint() {
        let mut signals = RequestSignals {
            user_agent: "curl/8.0".to_string(),
            peer_ip: "203.0.113.42".to_string(),
            accept_language: "en-US".to_string(),
            accept_encoding: "gzip".to_string(),
        };
        let a = compute(&signals);
        signals.peer_ip = "198.51.100.7".to_string();
        let b = compute(&signals);
        assert_ne!(a, b);
    }

    #[test]
    fn ipv4_partial_ignores_last_octet() {
        assert_eq!(partial_ip("203.0.113.42"), "203.0.113");
        assert_eq!(partial_ip("203.0.113.99"), "203.0.113");
    }

    #[test]
    fn forwarded_for_takes_priority() {
        let peer = extract_peer_ip(Some("1.2.3.4, 5.6.7.8"), Some("9.9.9.9"), "10.0.0.1");
        assert_eq!(peer, "1.2.3.4");
    }

    #[test]
    fn falls_back_to_real_ip_then_socket() {
        assert_eq!(extract_peer_ip(None, Some("9.9.9.9"), "10.0.0.1"), "9.9.9.9");
        assert_eq!(extract_peer_ip(None, None, "10.0.0.1"), "10.0.0.1");
    }
}
