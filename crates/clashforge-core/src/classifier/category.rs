//! Geographic and operator categories for endpoint labels.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Categories an endpoint label can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// The home region. Takes precedence over every peer region.
    Russia,
    /// Netherlands.
    Netherlands,
    /// Germany.
    Germany,
    /// Finland.
    Finland,
    /// United States.
    UnitedStates,
    /// Turkey.
    Turkey,
    /// Kazakhstan.
    Kazakhstan,
    /// Endpoints fronted by Cloudflare (operator, not a region).
    Cloudflare,
}

impl Category {
    /// The origin category.
    pub const ORIGIN: Category = Category::Russia;

    /// Returns all categories in priority order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Russia,
            Category::Netherlands,
            Category::Germany,
            Category::Finland,
            Category::UnitedStates,
            Category::Turkey,
            Category::Kazakhstan,
            Category::Cloudflare,
        ]
    }

    /// Returns every non-origin category in priority order.
    pub fn peers() -> &'static [Category] {
        &Self::all()[1..]
    }

    /// Returns true for the origin category.
    pub fn is_origin(&self) -> bool {
        *self == Self::ORIGIN
    }

    /// Returns true for geographic categories.
    pub fn is_region(&self) -> bool {
        !matches!(self, Category::Cloudflare)
    }

    /// Returns a human-readable name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Russia => "Russia",
            Category::Netherlands => "Netherlands",
            Category::Germany => "Germany",
            Category::Finland => "Finland",
            Category::UnitedStates => "United States",
            Category::Turkey => "Turkey",
            Category::Kazakhstan => "Kazakhstan",
            Category::Cloudflare => "Cloudflare",
        }
    }

    /// Returns the emoji used to prefix the category's group name.
    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Russia => "🇷🇺",
            Category::Netherlands => "🇳🇱",
            Category::Germany => "🇩🇪",
            Category::Finland => "🇫🇮",
            Category::UnitedStates => "🇺🇸",
            Category::Turkey => "🇹🇷",
            Category::Kazakhstan => "🇰🇿",
            Category::Cloudflare => "☁️",
        }
    }

    /// Returns the selection group name for this category.
    pub fn group_name(&self) -> String {
        format!("{} {}", self.emoji(), self.name())
    }
}

/// A single keyword hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMatch {
    /// The matched category.
    pub category: Category,
    /// The text that matched.
    pub matched_keyword: String,
}

impl CategoryMatch {
    /// Creates a new category match.
    pub fn new(category: Category, matched_keyword: impl Into<String>) -> Self {
        Self {
            category,
            matched_keyword: matched_keyword.into(),
        }
    }
}

/// Result of classifying one label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Surviving matches, in category priority order.
    pub matches: Vec<CategoryMatch>,
}

impl Classification {
    /// Creates a result with no matches.
    pub fn uncategorized() -> Self {
        Self::default()
    }

    /// Returns true if the category matched.
    pub fn has(&self, category: Category) -> bool {
        self.matches.iter().any(|m| m.category == category)
    }

    /// Returns true if the origin category matched.
    pub fn is_origin(&self) -> bool {
        self.has(Category::ORIGIN)
    }

    /// Returns true if nothing matched.
    pub fn is_uncategorized(&self) -> bool {
        self.matches.is_empty()
    }

    /// Returns the matched categories as a set.
    pub fn tags(&self) -> BTreeSet<Category> {
        self.matches.iter().map(|m| m.category).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_leads_priority_order() {
        assert_eq!(Category::all()[0], Category::ORIGIN);
        assert!(!Category::peers().contains(&Category::ORIGIN));
        assert_eq!(Category::peers().len(), Category::all().len() - 1);
    }

    #[test]
    fn group_names_carry_emoji() {
        assert_eq!(Category::Russia.group_name(), "🇷🇺 Russia");
        assert_eq!(Category::UnitedStates.group_name(), "🇺🇸 United States");
    }

    #[test]
    fn only_cloudflare_is_an_operator() {
        let operators: Vec<_> = Category::all().iter().filter(|c| !c.is_region()).collect();
        assert_eq!(operators, vec![&Category::Cloudflare]);
    }

    #[test]
    fn classification_tags() {
        let result = Classification {
            matches: vec![
                CategoryMatch::new(Category::Germany, "frankfurt"),
                CategoryMatch::new(Category::Cloudflare, "warp"),
            ],
        };
        assert!(result.has(Category::Germany));
        assert!(!result.is_origin());
        assert_eq!(
            result.tags(),
            BTreeSet::from([Category::Germany, Category::Cloudflare])
        );
        assert!(Classification::uncategorized().is_uncategorized());
    }
}
