//! Converter configuration.
//!
//! Every field has a default, so a JSON file only needs to name the values
//! it changes.

use serde::{Deserialize, Serialize};

use crate::parser::VLESS_SCHEME;
use crate::validator::SidPolicy;

/// Default health-check target for latency probes.
pub const DEFAULT_HEALTH_CHECK_URL: &str = "http://www.gstatic.com/generate_204";

/// Default probe interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Default latency tolerance in milliseconds.
pub const DEFAULT_TOLERANCE_MS: u32 = 50;

/// Default number of endpoints substituted into an empty group.
pub const DEFAULT_FALLBACK_CAP: usize = 25;

/// Default number of raw endpoints listed in the manual menu.
pub const DEFAULT_MENU_CAP: usize = 50;

/// DNS block of the emitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DnsSettings {
    pub enable: bool,
    pub enhanced_mode: String,
    pub fake_ip_range: String,
    pub nameserver: Vec<String>,
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            enable: true,
            enhanced_mode: "fake-ip".to_string(),
            fake_ip_range: "198.18.0.1/16".to_string(),
            nameserver: vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()],
        }
    }
}

/// Global settings copied verbatim into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GlobalSettings {
    pub mixed_port: u16,
    pub allow_lan: bool,
    pub mode: String,
    pub log_level: String,
    pub external_controller: String,
    pub dns: DnsSettings,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            mixed_port: 7890,
            allow_lan: true,
            mode: "rule".to_string(),
            log_level: "info".to_string(),
            external_controller: "127.0.0.1:9090".to_string(),
            dns: DnsSettings::default(),
        }
    }
}

/// Configuration for a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Descriptor scheme prefix; other lines are ignored.
    pub scheme: String,
    /// How to treat non-hex reality short ids.
    pub sid_policy: SidPolicy,
    /// Cap on fallback members substituted into an empty group.
    pub fallback_cap: usize,
    /// Cap on raw endpoint names listed in the manual menu.
    pub menu_cap: usize,
    /// Health-check URL for groups without their own.
    pub health_check_url: String,
    /// Probe interval for groups without their own.
    pub poll_interval_secs: u64,
    /// Latency tolerance for groups without their own.
    pub tolerance_ms: u32,
    /// Client fingerprint used when a reality descriptor carries none.
    pub default_fingerprint: String,
    /// Static document settings.
    pub global: GlobalSettings,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            scheme: VLESS_SCHEME.to_string(),
            sid_policy: SidPolicy::default(),
            fallback_cap: DEFAULT_FALLBACK_CAP,
            menu_cap: DEFAULT_MENU_CAP,
            health_check_url: DEFAULT_HEALTH_CHECK_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            tolerance_ms: DEFAULT_TOLERANCE_MS,
            default_fingerprint: "chrome".to_string(),
            global: GlobalSettings::default(),
        }
    }
}

impl ConverterConfig {
    /// Parses a JSON configuration; absent keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the short id policy.
    pub fn with_sid_policy(mut self, policy: SidPolicy) -> Self {
        self.sid_policy = policy;
        self
    }

    /// Sets the fallback cap.
    pub fn with_fallback_cap(mut self, cap: usize) -> Self {
        self.fallback_cap = cap;
        self
    }

    /// Sets the manual menu cap.
    pub fn with_menu_cap(mut self, cap: usize) -> Self {
        self.menu_cap = cap;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = ConverterConfig::default();
        assert_eq!(config.scheme, "vless://");
        assert_eq!(config.menu_cap, 50);
        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.sid_policy, SidPolicy::Reject);
        assert_eq!(config.global.mixed_port, 7890);
        assert_eq!(config.global.dns.nameserver, vec!["8.8.8.8", "1.1.1.1"]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ConverterConfig::from_json(
            r#"{"menu_cap": 10, "sid_policy": "sanitize", "global": {"mixed-port": 7891}}"#,
        )
        .unwrap();
        assert_eq!(config.menu_cap, 10);
        assert_eq!(config.sid_policy, SidPolicy::Sanitize);
        assert_eq!(config.global.mixed_port, 7891);
        assert!(config.global.allow_lan);
        assert_eq!(config.fallback_cap, DEFAULT_FALLBACK_CAP);
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(ConverterConfig::from_json(r#"{"sid_policy": "ignore"}"#).is_err());
    }

    #[test]
    fn builders_override() {
        let config = ConverterConfig::default()
            .with_menu_cap(5)
            .with_fallback_cap(3)
            .with_sid_policy(SidPolicy::Sanitize);
        assert_eq!(config.menu_cap, 5);
        assert_eq!(config.fallback_cap, 3);
        assert_eq!(config.sid_policy, SidPolicy::Sanitize);
    }
}
