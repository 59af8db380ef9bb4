//! Strongly-typed feed filter criteria.
//!
//! Raw request input (query strings, CLI flags) is parsed into a
//! [`FeedCriteria`] by the caller. The ranking engine only ever sees
//! well-typed optional values.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::models::{FeedMetrics, Portfolio};

/// Width of the rating bucket selected by a rating filter:
/// `[rating, rating + RATING_BAND)`.
pub const RATING_BAND: f64 = 100.0;

/// Field the feed is sorted by (always descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    YearsOfExperience,
    LeetcodeRating,
    MatchingProjectFactor,
    #[default]
    Score,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::YearsOfExperience,
        SortKey::LeetcodeRating,
        SortKey::MatchingProjectFactor,
        SortKey::Score,
    ];

    /// Resolve a sort parameter. Absent or unrecognized values fall back
    /// to [`SortKey::Score`]; this never fails.
    pub fn from_param(param: Option<&str>) -> SortKey {
        match param.map(str::trim) {
            Some("yearsOfExperience") => SortKey::YearsOfExperience,
            Some("leetcodeRating") => SortKey::LeetcodeRating,
            Some("matchingProjectFactor") => SortKey::MatchingProjectFactor,
            _ => SortKey::Score,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::YearsOfExperience => "yearsOfExperience",
            SortKey::LeetcodeRating => "leetcodeRating",
            SortKey::MatchingProjectFactor => "matchingProjectFactor",
            SortKey::Score => "score",
        }
    }

    /// The value this key sorts on for one enriched portfolio.
    pub fn value(&self, portfolio: &Portfolio, metrics: &FeedMetrics) -> f64 {
        match self {
            SortKey::YearsOfExperience => portfolio.years_of_experience,
            SortKey::LeetcodeRating => portfolio.leetcode_rating,
            SortKey::MatchingProjectFactor => metrics.matching_project_factor,
            SortKey::Score => metrics.score,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar filters a store can push down into its own query engine.
///
/// Visibility is implied: every store returns visible portfolios only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BaseFilter {
    /// Exact `yearsOfExperience` match.
    pub years_of_experience: Option<f64>,
    /// Lower bound of the rating bucket; see [`RATING_BAND`].
    pub rating_floor: Option<f64>,
}

impl BaseFilter {
    /// Half-open `[low, high)` rating range, if a rating filter is set.
    pub fn rating_range(&self) -> Option<(f64, f64)> {
        self.rating_floor.map(|low| (low, low + RATING_BAND))
    }

    /// In-memory evaluation of the base filter, including visibility.
    pub fn matches(&self, portfolio: &Portfolio) -> bool {
        if !portfolio.visible {
            return false;
        }
        if let Some(exp) = self.years_of_experience {
            if portfolio.years_of_experience != exp {
                return false;
            }
        }
        if let Some((low, high)) = self.rating_range() {
            if portfolio.leetcode_rating < low || portfolio.leetcode_rating >= high {
                return false;
            }
        }
        true
    }
}

/// All inputs for one feed request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedCriteria {
    /// Technology tags matched against project tech stacks. Empty = no filtering.
    pub tech_filters: BTreeSet<String>,
    /// Skill tags matched against project skills. Empty = no filtering.
    pub skill_filters: BTreeSet<String>,
    pub exp_filter: Option<f64>,
    pub rating_filter: Option<f64>,
    pub sort_key: SortKey,
    /// If true, attach [`FeedMetrics`] to every preview.
    pub explain: bool,
}

impl FeedCriteria {
    pub fn base_filter(&self) -> BaseFilter {
        BaseFilter {
            years_of_experience: self.exp_filter,
            rating_floor: self.rating_filter,
        }
    }

    /// Canonical cache key, equal for criteria that produce the same feed.
    pub fn cache_key(&self) -> FeedCacheKey {
        FeedCacheKey {
            tech_filters: self.tech_filters.clone(),
            skill_filters: self.skill_filters.clone(),
            exp_bits: self.exp_filter.map(canonical_bits),
            rating_bits: self.rating_filter.map(canonical_bits),
            sort_key: self.sort_key,
            explain: self.explain,
        }
    }
}

/// Structured feed cache key. Numbers are compared by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedCacheKey {
    tech_filters: BTreeSet<String>,
    skill_filters: BTreeSet<String>,
    exp_bits: Option<u64>,
    rating_bits: Option<u64>,
    sort_key: SortKey,
    explain: bool,
}

/// `-0.0` and `0.0` filter identically, so they share a key.
fn canonical_bits(v: f64) -> u64 {
    (v + 0.0).to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portfolio(visible: bool, exp: f64, rating: f64) -> Portfolio {
        Portfolio {
            id: "p".into(),
            username: "u".into(),
            visible,
            personal_info: Default::default(),
            years_of_experience: exp,
            leetcode_rating: rating,
            recent_activity: None,
            tech_stack: vec![],
            projects: vec![],
        }
    }

    #[test]
    fn test_sort_key_known_params() {
        assert_eq!(
            SortKey::from_param(Some("yearsOfExperience")),
            SortKey::YearsOfExperience
        );
        assert_eq!(
            SortKey::from_param(Some("leetcodeRating")),
            SortKey::LeetcodeRating
        );
        assert_eq!(
            SortKey::from_param(Some("matchingProjectFactor")),
            SortKey::MatchingProjectFactor
        );
        assert_eq!(SortKey::from_param(Some("score")), SortKey::Score);
    }

    #[test]
    fn test_sort_key_falls_back_to_score() {
        assert_eq!(SortKey::from_param(None), SortKey::Score);
        assert_eq!(SortKey::from_param(Some("")), SortKey::Score);
        assert_eq!(SortKey::from_param(Some("popularity")), SortKey::Score);
        assert_eq!(SortKey::from_param(Some("SCORE")), SortKey::Score);
    }

    #[test]
    fn test_sort_key_round_trips_through_as_str() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::from_param(Some(key.as_str())), key);
        }
    }

    #[test]
    fn test_hidden_never_matches() {
        let filter = BaseFilter::default();
        assert!(!filter.matches(&portfolio(false, 1.0, 1500.0)));
        assert!(filter.matches(&portfolio(true, 1.0, 1500.0)));
    }

    #[test]
    fn test_experience_is_exact() {
        let filter = BaseFilter {
            years_of_experience: Some(3.0),
            rating_floor: None,
        };
        assert!(filter.matches(&portfolio(true, 3.0, 0.0)));
        assert!(!filter.matches(&portfolio(true, 2.0, 0.0)));
        assert!(!filter.matches(&portfolio(true, 3.5, 0.0)));
    }

    #[test]
    fn test_rating_band_is_half_open() {
        let filter = BaseFilter {
            years_of_experience: None,
            rating_floor: Some(1500.0),
        };
        assert!(!filter.matches(&portfolio(true, 0.0, 1499.99)));
        assert!(filter.matches(&portfolio(true, 0.0, 1500.0)));
        assert!(filter.matches(&portfolio(true, 0.0, 1599.99)));
        assert!(!filter.matches(&portfolio(true, 0.0, 1600.0)));
    }

    #[test]
    fn test_cache_key_ignores_insertion_order() {
        let mut a = FeedCriteria::default();
        a.tech_filters.insert("rust".into());
        a.tech_filters.insert("go".into());
        let mut b = FeedCriteria::default();
        b.tech_filters.insert("go".into());
        b.tech_filters.insert("rust".into());
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_distinguishes_dimensions() {
        let mut tech = FeedCriteria::default();
        tech.tech_filters.insert("go".into());
        let mut skill = FeedCriteria::default();
        skill.skill_filters.insert("go".into());
        assert_ne!(tech.cache_key(), skill.cache_key());

        let mut joined = FeedCriteria::default();
        joined.tech_filters.insert("a,b".into());
        let mut split = FeedCriteria::default();
        split.tech_filters.insert("a".into());
        split.tech_filters.insert("b".into());
        assert_ne!(joined.cache_key(), split.cache_key());
    }

    #[test]
    fn test_cache_key_separator_text_in_tags_does_not_collide() {
        let mut a = FeedCriteria::default();
        a.tech_filters.insert("a;s=b".into());
        let mut b = FeedCriteria::default();
        b.tech_filters.insert("a".into());
        b.skill_filters.insert("b;s=".into());
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_normalizes_numbers() {
        let a = FeedCriteria {
            exp_filter: Some(5.0),
            rating_filter: Some(0.0),
            ..Default::default()
        };
        let b = FeedCriteria {
            exp_filter: Some("5".parse().unwrap()),
            rating_filter: Some(-0.0),
            ..Default::default()
        };
        assert_eq!(a.cache_key(), b.cache_key());

        let c = FeedCriteria {
            exp_filter: Some(5.5),
            ..Default::default()
        };
        assert_ne!(a.cache_key(), c.cache_key());
    }
}
