//! Structured proxy endpoint records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Transport used when a descriptor carries no `type` parameter.
pub const DEFAULT_TRANSPORT: &str = "tcp";

/// Query key holding the reality short id.
pub const SHORT_ID_KEY: &str = "sid";

/// Security layer requested by a descriptor's `security` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Plain transport.
    #[default]
    None,
    /// Standard TLS.
    Tls,
    /// Reality TLS obfuscation (requires a short id and public key).
    Reality,
    /// Any other value, kept verbatim.
    Other(String),
}

impl SecurityMode {
    /// Maps a `security` query value to a mode.
    pub fn from_param(value: &str) -> Self {
        match value {
            "" | "none" => Self::None,
            "tls" => Self::Tls,
            "reality" => Self::Reality,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the query value for this mode, if it has one.
    pub fn as_param(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Tls => Some("tls"),
            Self::Reality => Some("reality"),
            Self::Other(value) => Some(value),
        }
    }

    /// Returns true for modes that wrap the stream in TLS.
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls | Self::Reality)
    }
}

/// One parsed proxy descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Opaque credential (the vless user id).
    pub id: String,
    /// Server host name or address, without IPv6 brackets.
    pub host: String,
    /// Server port (never zero).
    pub port: u16,
    /// Human label; falls back to `host`.
    pub display_name: String,
    /// Transport network (`tcp`, `ws`, `grpc`, ...).
    pub transport: String,
    /// Security layer.
    pub security: SecurityMode,
    /// Remaining query parameters, first occurrence of each key.
    pub extras: BTreeMap<String, String>,
}

impl Endpoint {
    /// Returns an extra parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }

    /// Returns the reality short id, if present.
    pub fn short_id(&self) -> Option<&str> {
        self.param(SHORT_ID_KEY)
    }

    /// Returns `host:port`, bracketing IPv6 literals.
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Serializes the endpoint back into descriptor form under `scheme`.
    pub fn to_uri(&self, scheme: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("type", &self.transport);
        if let Some(security) = self.security.as_param() {
            query.append_pair("security", security);
        }
        for (key, value) in &self.extras {
            query.append_pair(key, value);
        }

        format!(
            "{}{}@{}?{}#{}",
            scheme,
            self.id,
            self.authority(),
            query.finish(),
            urlencoding::encode(&self.display_name)
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.authority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_mode_round_trips_params() {
        assert_eq!(SecurityMode::from_param("reality"), SecurityMode::Reality);
        assert_eq!(SecurityMode::from_param(""), SecurityMode::None);
        assert_eq!(
            SecurityMode::from_param("xtls").as_param(),
            Some("xtls")
        );
        assert!(SecurityMode::Reality.is_tls());
        assert!(!SecurityMode::None.is_tls());
    }

    #[test]
    fn authority_brackets_ipv6() {
        let endpoint = Endpoint {
            id: "id".to_string(),
            host: "2001:db8::1".to_string(),
            port: 443,
            display_name: "v6".to_string(),
            transport: DEFAULT_TRANSPORT.to_string(),
            security: SecurityMode::None,
            extras: BTreeMap::new(),
        };
        assert_eq!(endpoint.authority(), "[2001:db8::1]:443");
        assert_eq!(endpoint.to_string(), "v6 ([2001:db8::1]:443)");
    }
}
