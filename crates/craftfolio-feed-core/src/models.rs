//! Portfolio records and the feed preview shape.
//!
//! [`Portfolio`] mirrors the stored document (camelCase JSON, as produced by
//! the portfolio editor). [`FeedPreview`] is the projection returned to feed
//! callers.

use serde::{Deserialize, Serialize};

/// A user-authored portfolio, as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    /// Record identifier. Assigned on first import when absent.
    #[serde(default, alias = "_id")]
    pub id: String,
    pub username: String,
    /// Only visible portfolios are eligible for the feed.
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub years_of_experience: f64,
    #[serde(default)]
    pub leetcode_rating: f64,
    /// Activity signal maintained by the stats jobs. Absent means 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_activity: Option<f64>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

/// A project entry inside a portfolio. Order is meaningful: the feed
/// preview shows the first few.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl Portfolio {
    /// Activity value used in scoring.
    pub fn activity(&self) -> f64 {
        self.recent_activity.unwrap_or(0.0)
    }
}

/// The personal-info subset exposed in a feed preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInfo {
    pub name: String,
    pub profile_picture: Option<String>,
    pub tagline: Option<String>,
}

/// One entry of a ranked feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPreview {
    pub id: String,
    pub username: String,
    pub personal_info: PreviewInfo,
    pub years_of_experience: f64,
    pub leetcode_rating: f64,
    pub matching_project_factor: f64,
    pub score: f64,
    pub tech_stack: Vec<String>,
    /// At most the first three projects, in portfolio order.
    pub top_projects: Vec<Project>,
    /// Derived-field breakdown (populated when `explain` is requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<FeedMetrics>,
}

/// Per-request derived fields for one portfolio. Never persisted.
///
/// `matching_project_factor` is capped at 1. A project matching both a tech
/// and a skill filter is counted twice, so the raw ratio can exceed 1. With
/// the cap, such a portfolio scores `0.2 × (ratio − 1)` lower than it would
/// uncapped: a single cross-matching project scores 0.2 lower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMetrics {
    pub tech_matching_projects: usize,
    pub skill_matching_projects: usize,
    /// `tech + skill`; a project matching on both dimensions counts twice.
    pub total_matching_projects: usize,
    pub total_projects: usize,
    pub matching_project_factor: f64,
    pub score: f64,
}
