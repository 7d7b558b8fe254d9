//! Clash configuration document.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::GlobalSettings;
use crate::endpoint::{Endpoint, SecurityMode};
use crate::error::Result;
use crate::groups::SelectionGroup;

/// Reality parameters of a proxy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RealityOpts {
    /// Server public key (`pbk`).
    pub public_key: String,
    /// Validated short id; empty when absent.
    pub short_id: String,
}

/// Websocket transport parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WsOpts {
    /// Request path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Extra request headers (`Host`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

/// gRPC transport parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrpcOpts {
    /// gRPC service name (`serviceName`).
    pub grpc_service_name: String,
}

/// One entry of the `proxies` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashProxy {
    /// Display name; group members refer to it.
    pub name: String,
    /// Protocol, always `vless`.
    #[serde(rename = "type")]
    pub kind: String,
    pub server: String,
    pub port: u16,
    /// Credential.
    pub uuid: String,
    /// Transport network.
    pub network: String,
    pub udp: bool,
    /// Set for tls and reality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    /// TLS server name (`sni`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servername: Option<String>,
    /// ALPN protocols, tls only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpn: Option<Vec<String>>,
    /// Reality parameters, reality only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reality_opts: Option<RealityOpts>,
    /// XTLS flow control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    /// uTLS fingerprint (`fp`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_fingerprint: Option<String>,
    /// Websocket settings for `network: ws`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_opts: Option<WsOpts>,
    /// gRPC settings for `network: grpc`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_opts: Option<GrpcOpts>,
}

impl ClashProxy {
    /// Maps an endpoint to a vless proxy entry.
    ///
    /// `default_fingerprint` is used for reality endpoints without `fp`.
    pub fn from_endpoint(endpoint: &Endpoint, default_fingerprint: &str) -> Self {
        let owned = |key: &str| endpoint.param(key).map(str::to_string);

        let mut proxy = Self {
            name: endpoint.display_name.clone(),
            kind: "vless".to_string(),
            server: endpoint.host.clone(),
            port: endpoint.port,
            uuid: endpoint.id.clone(),
            network: endpoint.transport.clone(),
            udp: true,
            tls: None,
            servername: None,
            alpn: None,
            reality_opts: None,
            flow: None,
            client_fingerprint: None,
            ws_opts: None,
            grpc_opts: None,
        };

        match endpoint.security {
            SecurityMode::Reality => {
                proxy.tls = Some(true);
                proxy.servername = Some(owned("sni").unwrap_or_default());
                proxy.reality_opts = Some(RealityOpts {
                    public_key: owned("pbk").unwrap_or_default(),
                    short_id: endpoint.short_id().unwrap_or_default().to_string(),
                });
                proxy.flow = owned("flow");
                proxy.client_fingerprint =
                    Some(owned("fp").unwrap_or_else(|| default_fingerprint.to_string()));
            }
            SecurityMode::Tls => {
                proxy.tls = Some(true);
                proxy.servername = owned("sni");
                proxy.flow = owned("flow");
                proxy.client_fingerprint = owned("fp");
                proxy.alpn = endpoint
                    .param("alpn")
                    .map(|a| a.split(',').map(str::to_string).collect());
            }
            SecurityMode::None | SecurityMode::Other(_) => {}
        }

        match endpoint.transport.as_str() {
            "ws" => {
                proxy.ws_opts = Some(WsOpts {
                    path: owned("path"),
                    headers: owned("host").map(|h| BTreeMap::from([("Host".to_string(), h)])),
                });
            }
            "grpc" => {
                proxy.grpc_opts = owned("serviceName").map(|name| GrpcOpts {
                    grpc_service_name: name,
                });
            }
            _ => {}
        }

        proxy
    }
}

/// Matcher kind of a routing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Domain or any subdomain.
    DomainSuffix,
    /// Destination address country or LAN.
    Geoip,
    /// Catch-all; takes no pattern.
    Match,
}

impl RuleKind {
    /// Returns the matcher keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DomainSuffix => "DOMAIN-SUFFIX",
            Self::Geoip => "GEOIP",
            Self::Match => "MATCH",
        }
    }
}

/// Built-in direct target.
pub const DIRECT: &str = "DIRECT";

/// A routing rule, rendered as `KIND,pattern,target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    pub kind: RuleKind,
    /// Absent for the catch-all.
    pub pattern: Option<String>,
    /// Group or built-in target name.
    pub target: String,
}

impl MatchRule {
    /// Creates a rule with a pattern.
    pub fn new(kind: RuleKind, pattern: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: Some(pattern.into()),
            target: target.into(),
        }
    }

    /// Creates the catch-all rule.
    pub fn catch_all(target: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Match,
            pattern: None,
            target: target.into(),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pattern {
            Some(pattern) => write!(f, "{},{},{}", self.kind.as_str(), pattern, self.target),
            None => write!(f, "{},{}", self.kind.as_str(), self.target),
        }
    }
}

impl Serialize for MatchRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Static rules: origin domains and addresses go to the origin group,
/// LAN goes direct, everything else to `default_group`.
pub fn default_rules(origin_group: &str, default_group: &str) -> Vec<MatchRule> {
    vec![
        MatchRule::new(RuleKind::DomainSuffix, "ru", origin_group),
        MatchRule::new(RuleKind::DomainSuffix, "su", origin_group),
        MatchRule::new(RuleKind::DomainSuffix, "xn--p1ai", origin_group),
        MatchRule::new(RuleKind::Geoip, "LAN", DIRECT),
        MatchRule::new(RuleKind::Geoip, "RU", origin_group),
        MatchRule::catch_all(default_group),
    ]
}

/// The emitted configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashDocument {
    /// Top-level settings, emitted inline.
    #[serde(flatten)]
    pub global: GlobalSettings,
    /// Proxies in input order.
    pub proxies: Vec<ClashProxy>,
    /// Groups in output order, menu first.
    pub proxy_groups: Vec<SelectionGroup>,
    /// Rules, catch-all last.
    pub rules: Vec<MatchRule>,
}

impl ClashDocument {
    /// Returns the group with the given name.
    pub fn group(&self, name: &str) -> Option<&SelectionGroup> {
        self.proxy_groups.iter().find(|g| g.name == name)
    }

    /// Serializes the document as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
