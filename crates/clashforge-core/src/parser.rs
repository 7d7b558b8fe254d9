//! Descriptor parser.
//!
//! Accepts `scheme://<credential>@<host>:<port>?<query>[#<fragment>]` and
//! fails closed on every structural problem. A failure only ever drops the
//! line it came from.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::endpoint::{Endpoint, SecurityMode, DEFAULT_TRANSPORT};
use crate::error::ParseError;

/// Scheme prefix recognised by default.
pub const VLESS_SCHEME: &str = "vless://";

/// Parser for one descriptor scheme.
#[derive(Debug, Clone)]
pub struct DescriptorParser {
    scheme: String,
}

impl DescriptorParser {
    /// Creates a parser for the given scheme prefix (e.g. `vless://`).
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }

    /// Returns the scheme prefix.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns true if the line carries this parser's scheme.
    pub fn accepts(&self, line: &str) -> bool {
        line.starts_with(&self.scheme)
    }

    /// Parses one descriptor line.
    pub fn parse(&self, line: &str) -> Result<Endpoint, ParseError> {
        let body = line
            .strip_prefix(&self.scheme)
            .ok_or_else(|| ParseError::MissingScheme(self.scheme.clone()))?;

        let (id, rest) = body
            .split_once('@')
            .ok_or(ParseError::MissingCredentialSeparator)?;
        let (server, query_and_name) = rest.split_once('?').ok_or(ParseError::MissingQuery)?;
        let (host, port) = split_host_port(server)?;

        let (query, display_name) = match query_and_name.split_once('#') {
            Some((query, fragment)) => {
                let name = urlencoding::decode(fragment)
                    .map_err(|e| ParseError::InvalidDisplayName(e.to_string()))?;
                (query, Some(name.into_owned()))
            }
            None => (query_and_name, None),
        };

        let mut extras = parse_query(query);
        let transport = extras
            .remove("type")
            .unwrap_or_else(|| DEFAULT_TRANSPORT.to_string());
        let security = extras
            .remove("security")
            .map(|s| SecurityMode::from_param(&s))
            .unwrap_or_default();

        Ok(Endpoint {
            id: id.to_string(),
            display_name: display_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| host.clone()),
            host,
            port,
            transport,
            security,
            extras,
        })
    }
}

impl Default for DescriptorParser {
    fn default() -> Self {
        Self::new(VLESS_SCHEME)
    }
}

/// Parses a `vless://` descriptor with the default parser.
pub fn parse_descriptor(line: &str) -> Result<Endpoint, ParseError> {
    DescriptorParser::default().parse(line)
}

fn split_host_port(server: &str) -> Result<(String, u16), ParseError> {
    let (host, port) = server
        .rsplit_once(':')
        .ok_or_else(|| ParseError::MissingPort(server.to_string()))?;

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(ParseError::EmptyHost);
    }

    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| ParseError::InvalidPort(port.to_string()))?;

    Ok((host.to_string(), port))
}

/// Form-decodes the query, keeping the first non-blank value of each key.
fn parse_query(query: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}
