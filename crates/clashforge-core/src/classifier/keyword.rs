//! Table-driven keyword classifier for endpoint labels.
//!
//! Each category owns a row of flags, case-insensitive keywords, short
//! case-insensitive whole words and case-sensitive whole-word codes, plus the
//! categories that suppress it.
//! Every row is evaluated against the raw label, then suppressed hits are
//! removed, so the result does not depend on evaluation order.

use regex::{Regex, RegexSet};

use super::{Category, CategoryMatch, Classification};

/// Range of regional indicator symbols, two of which form a flag emoji.
const REGIONAL_INDICATORS: &str = r"\x{1F1E6}-\x{1F1FF}";

/// Static description of one category row.
struct RuleSpec {
    category: Category,
    /// Flag emoji; matched only on flag boundaries.
    flags: &'static [&'static str],
    /// Substrings matched case-insensitively.
    keywords: &'static [&'static str],
    /// Short tokens matched case-insensitively as whole words.
    words: &'static [&'static str],
    /// Short codes matched case-sensitively as whole words.
    codes: &'static [&'static str],
    suppressed_by: &'static [Category],
}

const ORIGIN_ONLY: &[Category] = &[Category::ORIGIN];

const RULES: &[RuleSpec] = &[
    RuleSpec {
        category: Category::Russia,
        flags: &["🇷🇺"],
        keywords: &[
            "russia",
            "россия",
            "moscow",
            "москва",
            "saint petersburg",
            "st. petersburg",
            "петербург",
            "novosibirsk",
            "новосибирск",
            "yekaterinburg",
            "екатеринбург",
            "selectel",
            "timeweb",
            "yandex cloud",
            "яндекс",
            "rostelecom",
            "ростелеком",
        ],
        words: &[],
        codes: &["RU", "РФ", "MSK", "SPB"],
        suppressed_by: &[],
    },
    RuleSpec {
        category: Category::Netherlands,
        flags: &["🇳🇱"],
        keywords: &[
            "netherlands",
            "holland",
            "нидерланды",
            "голландия",
            "amsterdam",
            "амстердам",
            "rotterdam",
            "роттердам",
        ],
        words: &[],
        codes: &["NL"],
        suppressed_by: ORIGIN_ONLY,
    },
    RuleSpec {
        category: Category::Germany,
        flags: &["🇩🇪"],
        keywords: &[
            "germany",
            "deutschland",
            "германия",
            "frankfurt",
            "франкфурт",
            "berlin",
            "берлин",
            "munich",
            "мюнхен",
            "nuremberg",
            "нюрнберг",
            "hetzner",
            "contabo",
        ],
        words: &[],
        codes: &["DE"],
        suppressed_by: ORIGIN_ONLY,
    },
    RuleSpec {
        category: Category::Finland,
        flags: &["🇫🇮"],
        keywords: &["finland", "suomi", "финляндия", "helsinki", "хельсинки"],
        words: &[],
        codes: &["FI"],
        suppressed_by: ORIGIN_ONLY,
    },
    RuleSpec {
        category: Category::UnitedStates,
        flags: &["🇺🇸"],
        keywords: &[
            "united states",
            "new york",
            "нью-йорк",
            "los angeles",
            "лос-анджелес",
            "dallas",
            "даллас",
            "chicago",
            "miami",
            "seattle",
        ],
        words: &["usa", "сша"],
        codes: &["US"],
        suppressed_by: ORIGIN_ONLY,
    },
    RuleSpec {
        category: Category::Turkey,
        flags: &["🇹🇷"],
        keywords: &["turkey", "türkiye", "турция", "istanbul", "стамбул", "ankara", "анкара"],
        words: &[],
        codes: &["TR"],
        suppressed_by: ORIGIN_ONLY,
    },
    RuleSpec {
        category: Category::Kazakhstan,
        flags: &["🇰🇿"],
        keywords: &["kazakhstan", "казахстан", "almaty", "алматы", "astana", "астана"],
        words: &[],
        codes: &["KZ"],
        suppressed_by: ORIGIN_ONLY,
    },
    RuleSpec {
        category: Category::Cloudflare,
        flags: &[],
        keywords: &["cloudflare"],
        words: &["warp"],
        codes: &["CF"],
        suppressed_by: &[],
    },
];

/// Compiled row of the keyword table.
struct CategoryPatterns {
    category: Category,
    /// Regex set for fast multi-pattern matching.
    regex_set: RegexSet,
    /// Individual regexes, parallel to `keywords`.
    regexes: Vec<Regex>,
    /// Source keyword for each regex, reported on a hit.
    keywords: Vec<&'static str>,
    suppressed_by: &'static [Category],
}

impl CategoryPatterns {
    fn compile(rule: &RuleSpec) -> Self {
        let mut keywords = Vec::new();
        let mut patterns = Vec::new();

        for flag in rule.flags {
            // A flag only counts when it starts on a pair boundary.
            patterns.push(format!(
                "(?:^|[^{ri}])(?:[{ri}][{ri}])*{flag}",
                ri = REGIONAL_INDICATORS,
                flag = regex::escape(flag),
            ));
            keywords.push(*flag);
        }
        for keyword in rule.keywords {
            patterns.push(format!("(?i){}", regex::escape(keyword)));
            keywords.push(*keyword);
        }
        for word in rule.words {
            patterns.push(format!(r"(?i)\b{}\b", regex::escape(word)));
            keywords.push(*word);
        }
        for code in rule.codes {
            patterns.push(format!(r"\b{}\b", regex::escape(code)));
            keywords.push(*code);
        }

        let regex_set = RegexSet::new(&patterns).expect("Invalid keyword patterns");
        let regexes = patterns
            .iter()
            .map(|p| Regex::new(p).expect("Invalid keyword pattern"))
            .collect();

        Self {
            category: rule.category,
            regex_set,
            regexes,
            keywords,
            suppressed_by: rule.suppressed_by,
        }
    }

    fn find(&self, name: &str) -> Option<CategoryMatch> {
        if !self.regex_set.is_match(name) {
            return None;
        }
        self.regexes
            .iter()
            .zip(&self.keywords)
            .find(|(regex, _)| regex.is_match(name))
            .map(|(_, keyword)| CategoryMatch::new(self.category, *keyword))
    }
}

/// Keyword classifier over endpoint display names.
pub struct KeywordClassifier {
    patterns: Vec<CategoryPatterns>,
}

impl KeywordClassifier {
    /// Creates a classifier with the built-in category table.
    pub fn new() -> Self {
        Self {
            patterns: RULES.iter().map(CategoryPatterns::compile).collect(),
        }
    }

    /// Classifies a display name.
    pub fn classify(&self, name: &str) -> Classification {
        let hits: Vec<(&CategoryPatterns, CategoryMatch)> = self
            .patterns
            .iter()
            .filter_map(|p| p.find(name).map(|m| (p, m)))
            .collect();

        let matches = hits
            .iter()
            .filter(|(patterns, _)| {
                !patterns
                    .suppressed_by
                    .iter()
                    .any(|s| hits.iter().any(|(_, m)| m.category == *s))
            })
            .map(|(_, m)| m.clone())
            .collect();

        Classification { matches }
    }

    /// Returns true if `name` matches `category` after suppression.
    pub fn matches(&self, name: &str, category: Category) -> bool {
        self.classify(name).has(category)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}
