//! Health-check bypass for trusted monitoring traffic.
//!
//! Precedence is literal and asymmetric:
//! 1. the configured health path + method always runs the gate
//! 2. otherwise the configured user agent from a monitoring range skips it
//! 3. everything else runs the gate

use std::net::IpAddr;

use axum::http::Method;

use crate::config::HealthCheckConfig;
use crate::security::ip_ranges::IpRangeSet;

/// The request facts the bypass looks at.
#[derive(Debug, Clone, Copy)]
pub struct Probe<'a> {
    pub path: &'a str,
    pub method: &'a Method,
    pub user_agent: &'a str,
    pub client_addr: &'a str,
}

#[derive(Debug, Clone)]
pub struct HealthCheckBypass {
    path: String,
    method: Method,
    user_agent: String,
    monitoring_ranges: IpRangeSet,
}

impl HealthCheckBypass {
    pub fn new(path: impl Into<String>, method: Method, user_agent: impl Into<String>, monitoring_ranges: IpRangeSet) -> Self {
        Self {
            path: path.into(),
            method,
            user_agent: user_agent.into(),
            monitoring_ranges,
        }
    }

    pub fn from_config(config: &HealthCheckConfig) -> Result<Self, String> {
        let method = config
            .method
            .parse::<Method>()
            .map_err(|e| format!("health_check.method: {e}"))?;
        let ranges = IpRangeSet::parse(&config.monitoring_ranges)
            .map_err(|e| format!("health_check.monitoring_ranges: {e}"))?;
        Ok(Self::new(&config.path, method, &config.user_agent, ranges))
    }

    /// Whether the wrapped gate should be skipped for this request.
    pub fn should_skip(&self, probe: &Probe<'_>) -> bool {
        if probe.path == self.path && *probe.method == self.method {
            return false;
        }
        probe.user_agent == self.user_agent && self.from_monitoring_range(probe.client_addr)
    }

    /// Run `gate` unless the request is trusted monitoring traffic.
    ///
    /// Returns `None` when the gate was skipped.
    pub fn guard<R>(&self, probe: &Probe<'_>, gate: impl FnOnce() -> R) -> Option<R> {
        if self.should_skip(probe) {
            None
        } else {
            Some(gate())
        }
    }

    fn from_monitoring_range(&self, client_addr: &str) -> bool {
        client_addr
            .parse::<IpAddr>()
            .map(|ip| self.monitoring_ranges.contains(ip))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITOR_UA: &str = "GoogleHC/1.0";

    fn bypass() -> HealthCheckBypass {
        HealthCheckBypass::new(
            "/healthz",
            Method::GET,
            MONITOR_UA,
            IpRangeSet::parse(&["35.191.0.0/16"]).unwrap(),
        )
    }

    fn probe<'a>(path: &'a str, method: &'a Method, ua: &'a str, ip: &'a str) -> Probe<'a> {
        Probe {
            path,
            method,
            user_agent: ua,
            client_addr: ip,
        }
    }

    #[test]
    fn test_health_path_always_runs_gate() {
        let bypass = bypass();
        let get = Method::GET;
        // Also satisfies the UA + IP condition; path precedence wins.
        let p = probe("/healthz", &get, MONITOR_UA, "35.191.0.1");
        assert_eq!(bypass.guard(&p, || 7), Some(7));
    }

    #[test]
    fn test_monitoring_traffic_skips_gate() {
        let bypass = bypass();
        let get = Method::GET;
        let p = probe("/anything", &get, MONITOR_UA, "35.191.200.1");
        assert_eq!(bypass.guard(&p, || 7), None);
    }

    #[test]
    fn test_health_path_with_other_method_can_skip() {
        let bypass = bypass();
        let post = Method::POST;
        let p = probe("/healthz", &post, MONITOR_UA, "35.191.0.1");
        assert!(bypass.should_skip(&p));
    }

    #[test]
    fn test_requires_both_user_agent_and_range() {
        let bypass = bypass();
        let get = Method::GET;
        assert!(!bypass.should_skip(&probe("/x", &get, "curl/8.0", "35.191.0.1")));
        assert!(!bypass.should_skip(&probe("/x", &get, MONITOR_UA, "8.8.8.8")));
        assert!(!bypass.should_skip(&probe("/x", &get, MONITOR_UA, "garbage")));
    }

    #[test]
    fn test_gate_not_invoked_when_skipped() {
        let bypass = bypass();
        let get = Method::GET;
        let p = probe("/x", &get, MONITOR_UA, "35.191.0.1");
        let mut called = false;
        bypass.guard(&p, || called = true);
        assert!(!called);
    }
}
