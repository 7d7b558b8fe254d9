//! Field validation for reality endpoints.
//!
//! The reality short id must be hexadecimal and at most
//! [`MAX_SHORT_ID_LEN`] characters long. Over-long ids are truncated.
//! Ids containing other characters are handled according to [`SidPolicy`].

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::endpoint::{Endpoint, SecurityMode, SHORT_ID_KEY};
use crate::error::ValidationError;

/// Maximum short id length in hex characters.
pub const MAX_SHORT_ID_LEN: usize = 16;

static SHORT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]*$").expect("valid short id regex"));

/// How to treat a short id containing non-hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidPolicy {
    /// Drop the whole endpoint.
    #[default]
    Reject,
    /// Keep the endpoint and clear the short id.
    Sanitize,
}

impl SidPolicy {
    /// Returns the policy as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Sanitize => "sanitize",
        }
    }
}

impl fmt::Display for SidPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SidPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "sanitize" => Ok(Self::Sanitize),
            other => Err(format!("unknown sid policy {other:?} (expected reject or sanitize)")),
        }
    }
}

/// A change applied to an accepted endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidAdjustment {
    /// The id was longer than the cap and was cut down.
    Truncated {
        /// Length before truncation.
        original_len: usize,
    },
    /// The id was not hexadecimal and was removed.
    Cleared,
}

/// An endpoint that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    /// The (possibly normalized) endpoint.
    pub endpoint: Endpoint,
    /// What was changed, if anything.
    pub adjustment: Option<SidAdjustment>,
}

/// Validates security-sensitive fields of parsed endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValidator {
    policy: SidPolicy,
}

impl FieldValidator {
    /// Creates a validator with the given policy.
    pub fn new(policy: SidPolicy) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    pub fn policy(&self) -> SidPolicy {
        self.policy
    }

    /// Validates an endpoint, returning it normalized or rejected.
    pub fn validate(&self, mut endpoint: Endpoint) -> Result<Validated, ValidationError> {
        if endpoint.security != SecurityMode::Reality {
            return Ok(Validated {
                endpoint,
                adjustment: None,
            });
        }

        let Some(raw) = endpoint.extras.remove(SHORT_ID_KEY) else {
            return Ok(Validated {
                endpoint,
                adjustment: None,
            });
        };

        let sid = raw.trim();
        let mut adjustment = None;

        if !SHORT_ID_PATTERN.is_match(sid) {
            match self.policy {
                SidPolicy::Reject => {
                    return Err(ValidationError::InvalidShortId {
                        name: endpoint.display_name,
                        sid: raw,
                    });
                }
                SidPolicy::Sanitize => {
                    return Ok(Validated {
                        endpoint,
                        adjustment: Some(SidAdjustment::Cleared),
                    });
                }
            }
        }

        // Hex digits are ASCII, so byte slicing is safe here.
        let sid = if sid.len() > MAX_SHORT_ID_LEN {
            adjustment = Some(SidAdjustment::Truncated {
                original_len: sid.len(),
            });
            &sid[..MAX_SHORT_ID_LEN]
        } else {
            sid
        };

        if !sid.is_empty() {
            endpoint
                .extras
                .insert(SHORT_ID_KEY.to_string(), sid.to_string());
        }

        Ok(Validated {
            endpoint,
            adjustment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_descriptor;

    fn reality(sid: &str) -> Endpoint {
        parse_descriptor(&format!(
            "vless://id@h:443?security=reality&pbk=K&sid={sid}#node"
        ))
        .unwrap()
    }

    #[test]
    fn accepts_short_hex_id() {
        let result = FieldValidator::default().validate(reality("abc123")).unwrap();
        assert_eq!(result.endpoint.short_id(), Some("abc123"));
        assert_eq!(result.adjustment, None);
    }

    #[test]
    fn accepts_mixed_case_hex() {
        let result = FieldValidator::default().validate(reality("DeadBEEF")).unwrap();
        assert_eq!(result.endpoint.short_id(), Some("DeadBEEF"));
    }

    #[test]
    fn accepts_missing_id() {
        let endpoint =
            parse_descriptor("vless://id@h:443?security=reality&pbk=K&sid=#node").unwrap();
        let result = FieldValidator::default().validate(endpoint).unwrap();
        assert_eq!(result.endpoint.short_id(), None);
        assert_eq!(result.adjustment, None);
    }

    #[test]
    fn truncates_seventeen_characters() {
        let result = FieldValidator::default()
            .validate(reality("0123456789abcdef0"))
            .unwrap();
        assert_eq!(result.endpoint.short_id(), Some("0123456789abcdef"));
        assert_eq!(
            result.adjustment,
            Some(SidAdjustment::Truncated { original_len: 17 })
        );
    }

    #[test]
    fn sixteen_characters_unchanged() {
        let result = FieldValidator::default()
            .validate(reality("0123456789abcdef"))
            .unwrap();
        assert_eq!(result.endpoint.short_id(), Some("0123456789abcdef"));
        assert_eq!(result.adjustment, None);
    }

    #[test]
    fn trims_whitespace() {
        let result = FieldValidator::default().validate(reality("+ab12+")).unwrap();
        assert_eq!(result.endpoint.short_id(), Some("ab12"));
    }

    #[test]
    fn rejects_non_hex_by_default() {
        let err = FieldValidator::default()
            .validate(reality("abcxyz"))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidShortId {
                name: "node".to_string(),
                sid: "abcxyz".to_string(),
            }
        );
    }

    #[test]
    fn sanitize_clears_non_hex() {
        let result = FieldValidator::new(SidPolicy::Sanitize)
            .validate(reality("zz"))
            .unwrap();
        assert_eq!(result.endpoint.short_id(), None);
        assert_eq!(result.adjustment, Some(SidAdjustment::Cleared));
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("reject".parse::<SidPolicy>(), Ok(SidPolicy::Reject));
        assert_eq!("Sanitize".parse::<SidPolicy>(), Ok(SidPolicy::Sanitize));
        assert!("drop".parse::<SidPolicy>().is_err());
        assert_eq!(SidPolicy::Sanitize.to_string(), "sanitize");
    }

    #[test]
    fn ignores_non_reality_endpoints() {
        let endpoint =
            parse_descriptor("vless://id@h:443?security=tls&sid=not-hex#node").unwrap();
        let result = FieldValidator::default().validate(endpoint).unwrap();
        assert_eq!(result.endpoint.short_id(), Some("not-hex"));
    }
}
