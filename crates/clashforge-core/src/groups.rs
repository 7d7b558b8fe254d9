//! Selection group assembly.
//!
//! ## Group Order
//!
//! 1. `PROXY` - manual menu: every group name, then a capped prefix of endpoints
//! 2. `⚡ Auto` - latency probe over all endpoints
//! 3. Origin group - latency probe over origin endpoints
//! 4. `🌍 Foreign` - latency probe over non-origin endpoints
//! 5. One group per peer category, in category priority order
//!
//! Probe and fallback groups are never empty while at least one endpoint
//! exists: an empty category resolves through [`resolve_members`] to a capped
//! prefix of the non-origin set, then of the full set.

use serde::{Deserialize, Serialize};

use crate::classifier::{Category, Classification};
use crate::config::ConverterConfig;
use crate::document::DIRECT;
use crate::endpoint::Endpoint;

/// Name of the top-level manual group.
pub const MENU_GROUP: &str = "PROXY";

/// Name of the latency group over every endpoint.
pub const AUTO_GROUP: &str = "⚡ Auto";

/// Name of the latency group over non-origin endpoints.
pub const FOREIGN_GROUP: &str = "🌍 Foreign";

/// Targets built into the proxy runtime.
const BUILTIN_TARGETS: &[&str] = &[DIRECT, "REJECT", "GLOBAL"];

/// Returns true if `name` is taken by a generated group or a built-in target.
pub fn is_reserved_name(name: &str) -> bool {
    [MENU_GROUP, AUTO_GROUP, FOREIGN_GROUP].contains(&name)
        || BUILTIN_TARGETS.contains(&name)
        || Category::all().iter().any(|c| c.group_name() == name)
}

/// How a group picks its active member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupPolicy {
    /// The user picks a member.
    Select,
    /// Lowest latency within tolerance.
    UrlTest,
    /// First healthy member in list order.
    Fallback,
}

impl GroupPolicy {
    /// Returns true for policies that probe members.
    pub fn is_probing(&self) -> bool {
        matches!(self, Self::UrlTest | Self::Fallback)
    }
}

/// Health-check parameters of a probing group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Health-check target.
    pub url: String,
    /// Seconds between checks.
    pub interval_secs: u64,
    /// Latency margin before switching; url-test only.
    pub tolerance_ms: Option<u32>,
}

/// A named pool of endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionGroup {
    /// Unique group name.
    pub name: String,
    /// Selection policy.
    #[serde(rename = "type")]
    pub policy: GroupPolicy,
    /// Endpoint or group names; order is priority for fallback groups.
    #[serde(rename = "proxies")]
    pub members: Vec<String>,
    /// Probe target; probing groups only.
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub health_check_url: Option<String>,
    /// Probe interval in seconds.
    #[serde(rename = "interval", skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
    /// Latency tolerance in milliseconds; url-test only.
    #[serde(rename = "tolerance", skip_serializing_if = "Option::is_none")]
    pub tolerance_ms: Option<u32>,
}

impl SelectionGroup {
    /// Creates a manual-select group.
    pub fn select(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            policy: GroupPolicy::Select,
            members,
            health_check_url: None,
            poll_interval_secs: None,
            tolerance_ms: None,
        }
    }

    /// Creates a probing group with the given policy.
    pub fn probing(
        name: impl Into<String>,
        policy: GroupPolicy,
        members: Vec<String>,
        probe: Probe,
    ) -> Self {
        // Tolerance only applies to latency selection.
        let tolerance_ms = match policy {
            GroupPolicy::UrlTest => probe.tolerance_ms,
            _ => None,
        };
        Self {
            name: name.into(),
            policy,
            members,
            health_check_url: Some(probe.url),
            poll_interval_secs: Some(probe.interval_secs),
            tolerance_ms,
        }
    }
}

/// Fixed probe settings for one category group. `None` takes the config default.
struct CategoryGroupSpec {
    category: Category,
    policy: GroupPolicy,
    url: Option<&'static str>,
    interval_secs: Option<u64>,
    tolerance_ms: Option<u32>,
}

const CATEGORY_GROUPS: &[CategoryGroupSpec] = &[
    CategoryGroupSpec {
        category: Category::Netherlands,
        policy: GroupPolicy::UrlTest,
        url: None,
        interval_secs: None,
        tolerance_ms: None,
    },
    CategoryGroupSpec {
        category: Category::Germany,
        policy: GroupPolicy::UrlTest,
        url: None,
        interval_secs: None,
        tolerance_ms: None,
    },
    CategoryGroupSpec {
        category: Category::Finland,
        policy: GroupPolicy::UrlTest,
        url: None,
        interval_secs: None,
        tolerance_ms: None,
    },
    CategoryGroupSpec {
        category: Category::UnitedStates,
        policy: GroupPolicy::UrlTest,
        url: None,
        interval_secs: None,
        tolerance_ms: Some(100),
    },
    CategoryGroupSpec {
        category: Category::Turkey,
        policy: GroupPolicy::UrlTest,
        url: None,
        interval_secs: Some(600),
        tolerance_ms: Some(100),
    },
    CategoryGroupSpec {
        category: Category::Kazakhstan,
        policy: GroupPolicy::UrlTest,
        url: None,
        interval_secs: Some(600),
        tolerance_ms: Some(100),
    },
    CategoryGroupSpec {
        category: Category::Cloudflare,
        policy: GroupPolicy::Fallback,
        url: Some("https://cp.cloudflare.com/generate_204"),
        interval_secs: Some(180),
        tolerance_ms: None,
    },
];

/// One candidate in a fallback chain.
#[derive(Debug, Clone, Copy)]
pub struct MemberSource<'a> {
    names: &'a [String],
    cap: Option<usize>,
}

impl<'a> MemberSource<'a> {
    /// Uses every name.
    pub fn all(names: &'a [String]) -> Self {
        Self { names, cap: None }
    }

    /// Uses at most `cap` leading names.
    pub fn capped(names: &'a [String], cap: usize) -> Self {
        Self {
            names,
            cap: Some(cap),
        }
    }

    fn take(&self) -> Vec<String> {
        let len = self.cap.map_or(self.names.len(), |c| c.min(self.names.len()));
        self.names[..len].to_vec()
    }
}

/// Returns the members of the first non-empty source in the chain.
pub fn resolve_members(chain: &[MemberSource<'_>]) -> Vec<String> {
    chain
        .iter()
        .find(|source| !source.names.is_empty())
        .map(MemberSource::take)
        .unwrap_or_default()
}

/// An endpoint together with its label classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEndpoint {
    /// The validated endpoint.
    pub endpoint: Endpoint,
    /// Categories matched by its label.
    pub classification: Classification,
}

impl ClassifiedEndpoint {
    /// Returns the endpoint's display name.
    pub fn name(&self) -> &str {
        &self.endpoint.display_name
    }
}

/// Builds the selection groups for a classified endpoint list.
pub struct GroupAssembler<'a> {
    config: &'a ConverterConfig,
}

impl<'a> GroupAssembler<'a> {
    /// Creates an assembler using the config's caps and probe defaults.
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self { config }
    }

    /// Returns the group name for the origin category.
    pub fn origin_group_name() -> String {
        Category::ORIGIN.group_name()
    }

    /// Builds all groups, in output order.
    pub fn assemble(&self, endpoints: &[ClassifiedEndpoint]) -> Vec<SelectionGroup> {
        // A zero cap would turn every fallback into an empty group.
        let cap = self.config.fallback_cap.max(1);
        let all: Vec<String> = endpoints.iter().map(|e| e.name().to_string()).collect();
        let (origin_set, foreign_set): (Vec<&ClassifiedEndpoint>, Vec<&ClassifiedEndpoint>) =
            endpoints.iter().partition(|e| e.classification.is_origin());
        let origin: Vec<String> = origin_set.iter().map(|e| e.name().to_string()).collect();
        let foreign: Vec<String> = foreign_set.iter().map(|e| e.name().to_string()).collect();

        let mut groups = vec![
            SelectionGroup::probing(
                AUTO_GROUP,
                GroupPolicy::UrlTest,
                all.clone(),
                self.default_probe(),
            ),
            SelectionGroup::probing(
                Self::origin_group_name(),
                GroupPolicy::UrlTest,
                resolve_members(&[MemberSource::all(&origin), MemberSource::capped(&all, cap)]),
                self.default_probe(),
            ),
            SelectionGroup::probing(
                FOREIGN_GROUP,
                GroupPolicy::UrlTest,
                resolve_members(&[MemberSource::all(&foreign), MemberSource::capped(&all, cap)]),
                self.default_probe(),
            ),
        ];

        for rule in CATEGORY_GROUPS {
            let primary: Vec<String> = foreign_set
                .iter()
                .filter(|e| e.classification.has(rule.category))
                .map(|e| e.name().to_string())
                .collect();
            let members = resolve_members(&[
                MemberSource::all(&primary),
                MemberSource::capped(&foreign, cap),
                MemberSource::capped(&all, cap),
            ]);
            if primary.is_empty() {
                tracing::debug!(
                    "{} has no endpoints, using {} fallback members",
                    rule.category.name(),
                    members.len()
                );
            }
            groups.push(SelectionGroup::probing(
                rule.category.group_name(),
                rule.policy,
                members,
                self.probe_for(rule),
            ));
        }

        let mut menu: Vec<String> = groups.iter().map(|g| g.name.clone()).collect();
        menu.extend(all.iter().take(self.config.menu_cap).cloned());
        groups.insert(0, SelectionGroup::select(MENU_GROUP, menu));

        groups
    }

    fn default_probe(&self) -> Probe {
        Probe {
            url: self.config.health_check_url.clone(),
            interval_secs: self.config.poll_interval_secs,
            tolerance_ms: Some(self.config.tolerance_ms),
        }
    }

    fn probe_for(&self, rule: &CategoryGroupSpec) -> Probe {
        Probe {
            url: rule
                .url
                .map_or_else(|| self.config.health_check_url.clone(), str::to_string),
            interval_secs: rule.interval_secs.unwrap_or(self.config.poll_interval_secs),
            tolerance_ms: Some(rule.tolerance_ms.unwrap_or(self.config.tolerance_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::parser::parse_descriptor;

    fn classified(names: &[&str]) -> Vec<ClassifiedEndpoint> {
        let classifier = KeywordClassifier::new();
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let endpoint = parse_descriptor(&format!(
                    "vless://id{i}@10.0.0.{i}:443?type=tcp#{}",
                    urlencoding::encode(name)
                ))
                .unwrap();
                let classification = classifier.classify(&endpoint.display_name);
                ClassifiedEndpoint {
                    endpoint,
                    classification,
                }
            })
            .collect()
    }

    fn group<'g>(groups: &'g [SelectionGroup], name: &str) -> &'g SelectionGroup {
        groups.iter().find(|g| g.name == name).unwrap()
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolve_takes_first_non_empty_source() {
        let empty: Vec<String> = Vec::new();
        let second = names(&["a", "b", "c"]);
        let members = resolve_members(&[
            MemberSource::all(&empty),
            MemberSource::capped(&second, 2),
        ]);
        assert_eq!(members, names(&["a", "b"]));
    }

    #[test]
    fn resolve_uncapped_primary() {
        let primary = names(&["a", "b", "c"]);
        assert_eq!(resolve_members(&[MemberSource::all(&primary)]), primary);
    }

    #[test]
    fn resolve_exhausted_chain_is_empty() {
        let empty: Vec<String> = Vec::new();
        assert!(resolve_members(&[MemberSource::all(&empty)]).is_empty());
    }

    #[test]
    fn group_order() {
        let config = ConverterConfig::default();
        let groups = GroupAssembler::new(&config).assemble(&classified(&["🇷🇺 A", "🇳🇱 B"]));
        let order: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "PROXY",
                "⚡ Auto",
                "🇷🇺 Russia",
                "🌍 Foreign",
                "🇳🇱 Netherlands",
                "🇩🇪 Germany",
                "🇫🇮 Finland",
                "🇺🇸 United States",
                "🇹🇷 Turkey",
                "🇰🇿 Kazakhstan",
                "☁️ Cloudflare",
            ]
        );
    }

    #[test]
    fn menu_lists_groups_then_capped_endpoints() {
        let config = ConverterConfig::default().with_menu_cap(2);
        let groups =
            GroupAssembler::new(&config).assemble(&classified(&["n1", "n2", "n3"]));
        let menu = &groups[0];
        assert_eq!(menu.policy, GroupPolicy::Select);
        assert_eq!(menu.members[0], AUTO_GROUP);
        assert_eq!(menu.members.len(), groups.len() - 1 + 2);
        assert_eq!(&menu.members[menu.members.len() - 2..], &names(&["n1", "n2"])[..]);
        assert!(menu.health_check_url.is_none());
    }

    #[test]
    fn partitions_origin_and_foreign() {
        let config = ConverterConfig::default();
        let groups = GroupAssembler::new(&config)
            .assemble(&classified(&["🇷🇺 A", "Amsterdam B", "node C"]));
        assert_eq!(group(&groups, "🇷🇺 Russia").members, names(&["🇷🇺 A"]));
        assert_eq!(
            group(&groups, FOREIGN_GROUP).members,
            names(&["Amsterdam B", "node C"])
        );
        assert_eq!(group(&groups, AUTO_GROUP).members.len(), 3);
        assert_eq!(
            group(&groups, "🇳🇱 Netherlands").members,
            names(&["Amsterdam B"])
        );
    }

    #[test]
    fn empty_peer_falls_back_to_capped_foreign() {
        let config = ConverterConfig::default().with_fallback_cap(2);
        let groups = GroupAssembler::new(&config)
            .assemble(&classified(&["🇷🇺 A", "x1", "x2", "x3"]));
        // No Finnish endpoints: substitute the first two non-origin names.
        assert_eq!(group(&groups, "🇫🇮 Finland").members, names(&["x1", "x2"]));
    }

    #[test]
    fn origin_only_input_falls_back_to_full_set() {
        let config = ConverterConfig::default();
        let groups = GroupAssembler::new(&config).assemble(&classified(&["🇷🇺 A", "Москва B"]));
        // The non-origin set is empty, so peer groups take the full set,
        // which is the one case where origin endpoints appear in them.
        assert_eq!(
            group(&groups, "🇩🇪 Germany").members,
            names(&["🇷🇺 A", "Москва B"])
        );
        assert_eq!(
            group(&groups, FOREIGN_GROUP).members,
            names(&["🇷🇺 A", "Москва B"])
        );
    }

    #[test]
    fn no_origin_falls_back_to_full_set() {
        let config = ConverterConfig::default();
        let groups = GroupAssembler::new(&config).assemble(&classified(&["Berlin"]));
        assert_eq!(group(&groups, "🇷🇺 Russia").members, names(&["Berlin"]));
    }

    #[test]
    fn probing_groups_never_empty() {
        let config = ConverterConfig::default();
        for input in [&["🇷🇺 A"][..], &["x"][..], &["🇷🇺 A", "Berlin"][..]] {
            let groups = GroupAssembler::new(&config).assemble(&classified(input));
            for g in groups.iter().filter(|g| g.policy.is_probing()) {
                assert!(!g.members.is_empty(), "{} empty for {input:?}", g.name);
            }
        }
    }

    #[test]
    fn operator_group_excludes_origin_endpoints() {
        let config = ConverterConfig::default();
        let groups = GroupAssembler::new(&config)
            .assemble(&classified(&["Moscow WARP", "Amsterdam WARP"]));
        let cloudflare = group(&groups, "☁️ Cloudflare");
        assert_eq!(cloudflare.policy, GroupPolicy::Fallback);
        assert_eq!(cloudflare.members, names(&["Amsterdam WARP"]));
        assert_eq!(cloudflare.tolerance_ms, None);
        assert_eq!(
            cloudflare.health_check_url.as_deref(),
            Some("https://cp.cloudflare.com/generate_204")
        );
        assert_eq!(cloudflare.poll_interval_secs, Some(180));
    }

    #[test]
    fn per_category_probe_constants() {
        let config = ConverterConfig::default();
        let groups = GroupAssembler::new(&config).assemble(&classified(&["Istanbul"]));
        let turkey = group(&groups, "🇹🇷 Turkey");
        assert_eq!(turkey.poll_interval_secs, Some(600));
        assert_eq!(turkey.tolerance_ms, Some(100));
        let auto = group(&groups, AUTO_GROUP);
        assert_eq!(auto.poll_interval_secs, Some(300));
        assert_eq!(auto.tolerance_ms, Some(50));
        assert_eq!(
            auto.health_check_url.as_deref(),
            Some("http://www.gstatic.com/generate_204")
        );
    }

    #[test]
    fn zero_fallback_cap_still_fills_groups() {
        let config = ConverterConfig::default().with_fallback_cap(0);
        let groups = GroupAssembler::new(&config).assemble(&classified(&["node-a", "node-b"]));
        assert_eq!(group(&groups, "🇷🇺 Russia").members, names(&["node-a"]));
        assert_eq!(group(&groups, "☁️ Cloudflare").members, names(&["node-a"]));
    }

    #[test]
    fn reserved_names() {
        for name in [MENU_GROUP, AUTO_GROUP, FOREIGN_GROUP, "DIRECT", "REJECT", "🇩🇪 Germany"] {
            assert!(is_reserved_name(name), "{name}");
        }
        assert!(!is_reserved_name("Germany"));
        assert!(!is_reserved_name("proxy"));
    }

    #[test]
    fn duplicate_names_are_kept() {
        let config = ConverterConfig::default();
        let groups = GroupAssembler::new(&config).assemble(&classified(&["Berlin", "Berlin"]));
        assert_eq!(group(&groups, "🇩🇪 Germany").members, names(&["Berlin", "Berlin"]));
    }
}
