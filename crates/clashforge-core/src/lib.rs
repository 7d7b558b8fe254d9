//! Clashforge Core - turns proxy descriptors into a Clash configuration.
//!
//! ## Pipeline
//!
//! ```text
//! line → DescriptorParser → FieldValidator → KeywordClassifier
//!                                                   │
//!                         all endpoints (input order)
//!                                                   ▼
//!                  GroupAssembler → ClashDocument (proxies, proxy-groups, rules)
//! ```
//!
//! Bad lines are dropped and counted; only a batch with no valid endpoint
//! at all fails, with [`ConvertError::NoValidEndpoints`].
//!
//! ## Usage
//!
//! ```
//! use clashforge_core::{Converter, ConverterConfig};
//!
//! let lines = [
//!     "vless://uuid@1.2.3.4:443?security=reality&sid=ab12&pbk=KEY#%F0%9F%87%B7%F0%9F%87%BA%20Moscow",
//!     "vless://uuid@5.6.7.8:443?security=reality&sid=cd34&pbk=KEY#Frankfurt%201",
//! ];
//! let conversion = Converter::new(ConverterConfig::default()).convert(lines).unwrap();
//! assert_eq!(conversion.stats.valid, 2);
//! assert!(conversion.document.group("🇩🇪 Germany").is_some());
//! ```

pub mod classifier;
pub mod config;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod groups;
pub mod parser;
pub mod pipeline;
pub mod validator;

pub use classifier::{Category, CategoryMatch, Classification, KeywordClassifier};
pub use config::{ConverterConfig, DnsSettings, GlobalSettings};
pub use document::{default_rules, ClashDocument, ClashProxy, MatchRule, RuleKind};
pub use endpoint::{Endpoint, SecurityMode};
pub use error::{ConvertError, ParseError, Result, ValidationError};
pub use groups::{
    is_reserved_name, resolve_members, ClassifiedEndpoint, GroupAssembler, GroupPolicy, MemberSource,
    SelectionGroup, AUTO_GROUP, FOREIGN_GROUP, MENU_GROUP,
};
pub use parser::{parse_descriptor, DescriptorParser, VLESS_SCHEME};
pub use pipeline::{Conversion, ConversionStats, Converter, LineOutcome};
pub use validator::{FieldValidator, SidAdjustment, SidPolicy, Validated, MAX_SHORT_ID_LEN};
