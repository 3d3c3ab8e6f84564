//! Rate-limit key derivation.
//!
//! Clients inside an exempt range share a single "unlimited" key that the
//! limiter never counts. Everyone else is keyed by their address.

use std::net::IpAddr;

use crate::error::GatewayError;
use crate::security::ip_ranges::IpRangeSet;

/// Key value reserved for exempt clients.
pub const UNLIMITED_KEY: &str = "unlimited";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LimitKey {
    Unlimited,
    Client(String),
}

impl LimitKey {
    pub fn as_str(&self) -> &str {
        match self {
            LimitKey::Unlimited => UNLIMITED_KEY,
            LimitKey::Client(addr) => addr,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, LimitKey::Unlimited)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LimitKeyResolver {
    exempt: IpRangeSet,
}

impl LimitKeyResolver {
    pub fn new(exempt: IpRangeSet) -> Self {
        Self { exempt }
    }

    /// Derive the key for a textual client address.
    pub fn resolve(&self, client_addr: &str) -> Result<LimitKey, GatewayError> {
        let ip = client_addr
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| GatewayError::InvalidAddress(client_addr.to_string()))?;

        if let Some(range) = self.exempt.first_match(ip) {
            tracing::debug!(client = %ip, range = %range, "Client in exempt range");
            return Ok(LimitKey::Unlimited);
        }
        Ok(LimitKey::Client(ip.to_string()))
    }

    /// Like [`resolve`](Self::resolve) but never fails: an unparseable
    /// address is logged and used verbatim as its own key.
    pub fn resolve_or_fallback(&self, client_addr: &str) -> LimitKey {
        match self.resolve(client_addr) {
            Ok(key) => key,
            Err(err) => {
                tracing::error!(error = %err, "Falling back to raw client address as rate limit key");
                LimitKey::Client(client_addr.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> LimitKeyResolver {
        LimitKeyResolver::new(IpRangeSet::parse(&["35.191.0.0/16", "130.211.0.0/22"]).unwrap())
    }

    #[test]
    fn test_exempt_client_is_unlimited() {
        let key = resolver().resolve("35.191.4.4").unwrap();
        assert_eq!(key, LimitKey::Unlimited);
        assert_eq!(key.as_str(), "unlimited");
    }

    #[test]
    fn test_regular_client_keyed_by_address() {
        let key = resolver().resolve("203.0.113.9").unwrap();
        assert_eq!(key, LimitKey::Client("203.0.113.9".into()));
    }

    #[test]
    fn test_key_is_the_checked_address() {
        let key = resolver().resolve(" 203.0.113.9 ").unwrap();
        assert_eq!(key, LimitKey::Client("203.0.113.9".into()));
        assert_eq!(
            resolver().resolve("2001:DB8:0::1").unwrap().as_str(),
            "2001:db8::1"
        );
        assert_eq!(resolver().resolve(" 35.191.4.4").unwrap(), LimitKey::Unlimited);
    }

    #[test]
    fn test_invalid_address_is_error() {
        let err = resolver().resolve("not-an-ip").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidAddress(ref a) if a == "not-an-ip"));
    }

    #[test]
    fn test_fallback_uses_raw_address() {
        assert_eq!(
            resolver().resolve_or_fallback("unix-socket"),
            LimitKey::Client("unix-socket".into())
        );
        assert_eq!(resolver().resolve_or_fallback(""), LimitKey::Client(String::new()));
    }
}
