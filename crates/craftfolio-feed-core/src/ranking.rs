//! Feed ranking engine.
//!
//! Operates entirely through the [`PortfolioStore`] trait. The caller parses
//! request input into [`FeedCriteria`] and passes the store to
//! [`get_filtered_feeds`].
//!
//! # Ranking Algorithm
//!
//! 1. Fetch visible candidates matching the base filter (exact experience,
//!    rating bucket `[r, r + 100)`).
//! 2. Per candidate, count projects whose tech stack intersects the tech
//!    filters and projects whose skills intersect the skill filters. An empty
//!    filter set contributes 0. A project matching both counts twice.
//! 3. `matchingProjectFactor = matching / totalProjects` (0 without projects,
//!    capped at 1).
//! 4. `score = 0.4 × experience + 0.3 × rating + 0.2 × factor + 0.1 × activity`.
//! 5. Sort descending by the resolved key (IEEE total order, so NaN values
//!    still sort deterministically), then `id` ascending.
//! 6. Project to [`FeedPreview`] with the first 3 projects.

use std::collections::BTreeSet;

use anyhow::Result;

use crate::criteria::FeedCriteria;
use crate::models::{FeedMetrics, FeedPreview, Portfolio, PreviewInfo, Project};
use crate::store::PortfolioStore;

pub const WEIGHT_EXPERIENCE: f64 = 0.4;
pub const WEIGHT_RATING: f64 = 0.3;
pub const WEIGHT_MATCH: f64 = 0.2;
pub const WEIGHT_ACTIVITY: f64 = 0.1;

/// Number of projects included in a preview.
pub const TOP_PROJECTS: usize = 3;

/// Run a feed request against a [`PortfolioStore`] backend.
///
/// Performs exactly one store read. Store failures propagate unchanged;
/// an empty catalog or empty filter sets are not errors.
pub async fn get_filtered_feeds<S: PortfolioStore + ?Sized>(
    store: &S,
    criteria: &FeedCriteria,
) -> Result<Vec<FeedPreview>> {
    let candidates = store.fetch_candidates(&criteria.base_filter()).await?;
    Ok(rank_portfolios(candidates, criteria))
}

/// Filter, enrich, sort, and project an already-fetched candidate set.
pub fn rank_portfolios(portfolios: Vec<Portfolio>, criteria: &FeedCriteria) -> Vec<FeedPreview> {
    let base = criteria.base_filter();

    let mut enriched: Vec<(Portfolio, FeedMetrics)> = portfolios
        .into_iter()
        .filter(|p| base.matches(p))
        .map(|p| {
            let metrics = compute_metrics(&p, &criteria.tech_filters, &criteria.skill_filters);
            (p, metrics)
        })
        .collect();

    let key = criteria.sort_key;
    enriched.sort_by(|(pa, ma), (pb, mb)| {
        key.value(pb, mb)
            .total_cmp(&key.value(pa, ma))
            .then_with(|| pa.id.cmp(&pb.id))
    });

    enriched
        .into_iter()
        .map(|(p, m)| to_preview(p, m, criteria.explain))
        .collect()
}

/// Compute the derived fields for one portfolio.
pub fn compute_metrics(
    portfolio: &Portfolio,
    tech_filters: &BTreeSet<String>,
    skill_filters: &BTreeSet<String>,
) -> FeedMetrics {
    let tech_matching_projects = count_matching(&portfolio.projects, tech_filters, |p| &p.tech_stack);
    let skill_matching_projects = count_matching(&portfolio.projects, skill_filters, |p| &p.skills);
    let total_matching_projects = tech_matching_projects + skill_matching_projects;
    let total_projects = portfolio.projects.len();

    let matching_project_factor = if total_projects > 0 {
        (total_matching_projects as f64 / total_projects as f64).min(1.0)
    } else {
        0.0
    };

    let score = WEIGHT_EXPERIENCE * portfolio.years_of_experience
        + WEIGHT_RATING * portfolio.leetcode_rating
        + WEIGHT_MATCH * matching_project_factor
        + WEIGHT_ACTIVITY * portfolio.activity();

    FeedMetrics {
        tech_matching_projects,
        skill_matching_projects,
        total_matching_projects,
        total_projects,
        matching_project_factor,
        score,
    }
}

/// Count projects whose tags (selected by `tags`) share at least one entry
/// with `filters`. An empty filter set counts nothing.
fn count_matching<F>(projects: &[Project], filters: &BTreeSet<String>, tags: F) -> usize
where
    F: Fn(&Project) -> &Vec<String>,
{
    if filters.is_empty() {
        return 0;
    }
    projects
        .iter()
        .filter(|&p| tags(p).iter().any(|t| filters.contains(t)))
        .count()
}

/// Project an enriched portfolio into its preview shape.
pub fn to_preview(portfolio: Portfolio, metrics: FeedMetrics, explain: bool) -> FeedPreview {
    let Portfolio {
        id,
        username,
        personal_info,
        years_of_experience,
        leetcode_rating,
        tech_stack,
        mut projects,
        ..
    } = portfolio;
    projects.truncate(TOP_PROJECTS);

    FeedPreview {
        id,
        username,
        personal_info: PreviewInfo {
            name: personal_info.name,
            profile_picture: personal_info.profile_picture,
            tagline: personal_info.tagline,
        },
        years_of_experience,
        leetcode_rating,
        matching_project_factor: metrics.matching_project_factor,
        score: metrics.score,
        tech_stack,
        top_projects: projects,
        explain: explain.then_some(metrics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::SortKey;
    use crate::models::PersonalInfo;

    fn project(title: &str, tech: &[&str], skills: &[&str]) -> Project {
        Project {
            title: title.to_string(),
            tech_stack: tech.iter().map(|s| s.to_string()).collect(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn make_portfolio(id: &str, exp: f64, rating: f64, projects: Vec<Project>) -> Portfolio {
        Portfolio {
            id: id.to_string(),
            username: format!("user-{}", id),
            visible: true,
            personal_info: PersonalInfo {
                name: id.to_uppercase(),
                ..Default::default()
            },
            years_of_experience: exp,
            leetcode_rating: rating,
            recent_activity: None,
            tech_stack: vec![],
            projects,
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_go_project_scenario() {
        let p = make_portfolio("a", 5.0, 1800.0, vec![project("svc", &["go"], &[])]);
        let m = compute_metrics(&p, &set(&["go"]), &BTreeSet::new());
        assert_eq!(m.tech_matching_projects, 1);
        assert_eq!(m.skill_matching_projects, 0);
        assert_eq!(m.total_projects, 1);
        assert!((m.matching_project_factor - 1.0).abs() < 1e-12);
        assert!((m.score - 542.2).abs() < 1e-9, "score was {}", m.score);
    }

    #[test]
    fn test_no_projects_factor_is_zero() {
        let p = make_portfolio("a", 2.0, 1000.0, vec![]);
        let m = compute_metrics(&p, &set(&["go", "rust"]), &set(&["sql"]));
        assert_eq!(m.total_projects, 0);
        assert_eq!(m.matching_project_factor, 0.0);
    }

    #[test]
    fn test_empty_filters_match_nothing() {
        let p = make_portfolio(
            "a",
            1.0,
            1.0,
            vec![project("x", &["go"], &["api"]), project("y", &["rust"], &[])],
        );
        let m = compute_metrics(&p, &BTreeSet::new(), &BTreeSet::new());
        assert_eq!(m.total_matching_projects, 0);
        assert_eq!(m.matching_project_factor, 0.0);
    }

    #[test]
    fn test_cross_match_counts_twice() {
        let p = make_portfolio(
            "a",
            0.0,
            0.0,
            vec![
                project("both", &["go"], &["api"]),
                project("none", &["java"], &[]),
                project("tech", &["go"], &[]),
                project("none2", &[], &["design"]),
            ],
        );
        let m = compute_metrics(&p, &set(&["go"]), &set(&["api"]));
        assert_eq!(m.tech_matching_projects, 2);
        assert_eq!(m.skill_matching_projects, 1);
        assert_eq!(m.total_matching_projects, 3);
        assert!((m.matching_project_factor - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_factor_capped_at_one() {
        let p = make_portfolio("a", 0.0, 0.0, vec![project("both", &["go"], &["api"])]);
        let m = compute_metrics(&p, &set(&["go"]), &set(&["api"]));
        assert_eq!(m.total_matching_projects, 2);
        assert_eq!(m.matching_project_factor, 1.0);
        // Uncapped ratio 2.0 would add 0.4; the cap keeps it at 0.2.
        assert!((m.score - 0.2).abs() < 1e-12, "score {}", m.score);
    }

    #[test]
    fn test_factor_always_in_unit_interval() {
        let portfolios = vec![
            make_portfolio("a", 0.0, 0.0, vec![]),
            make_portfolio("b", 0.0, 0.0, vec![project("1", &["go", "rust"], &["api"])]),
            make_portfolio(
                "c",
                0.0,
                0.0,
                vec![project("1", &["go"], &[]), project("2", &[], &["api"])],
            ),
        ];
        for p in &portfolios {
            let m = compute_metrics(p, &set(&["go", "rust"]), &set(&["api"]));
            assert!(
                (0.0..=1.0).contains(&m.matching_project_factor),
                "factor out of range: {}",
                m.matching_project_factor
            );
        }
    }

    #[test]
    fn test_score_formula_with_activity() {
        let mut p = make_portfolio("a", 3.0, 1500.0, vec![project("x", &["go"], &[])]);
        p.recent_activity = Some(20.0);
        let m = compute_metrics(&p, &set(&["go"]), &BTreeSet::new());
        let expected = 0.4 * 3.0 + 0.3 * 1500.0 + 0.2 * 1.0 + 0.1 * 20.0;
        assert!((m.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_hidden_excluded_even_if_passed_in() {
        let mut hidden = make_portfolio("h", 50.0, 3000.0, vec![]);
        hidden.visible = false;
        let shown = make_portfolio("s", 1.0, 1.0, vec![]);
        let out = rank_portfolios(vec![hidden, shown], &FeedCriteria::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "s");
    }

    #[test]
    fn test_sorts_descending_by_key() {
        let portfolios = vec![
            make_portfolio("a", 10.0, 1000.0, vec![]),
            make_portfolio("b", 2.0, 2000.0, vec![]),
            make_portfolio("c", 5.0, 1500.0, vec![]),
        ];

        let by_exp = rank_portfolios(
            portfolios.clone(),
            &FeedCriteria {
                sort_key: SortKey::YearsOfExperience,
                ..Default::default()
            },
        );
        let ids: Vec<&str> = by_exp.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);

        let by_rating = rank_portfolios(
            portfolios,
            &FeedCriteria {
                sort_key: SortKey::LeetcodeRating,
                ..Default::default()
            },
        );
        let ids: Vec<&str> = by_rating.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_unrecognized_sort_matches_score_order() {
        let portfolios = vec![
            make_portfolio("a", 10.0, 1000.0, vec![project("x", &["go"], &[])]),
            make_portfolio("b", 2.0, 2000.0, vec![]),
            make_portfolio("c", 5.0, 1500.0, vec![project("y", &["go"], &[])]),
        ];
        let mut criteria = FeedCriteria {
            tech_filters: set(&["go"]),
            sort_key: SortKey::from_param(Some("bogus")),
            ..Default::default()
        };
        let fallback = rank_portfolios(portfolios.clone(), &criteria);
        criteria.sort_key = SortKey::Score;
        let by_score = rank_portfolios(portfolios, &criteria);
        assert_eq!(fallback, by_score);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let portfolios = vec![
            make_portfolio("c", 1.0, 100.0, vec![]),
            make_portfolio("a", 1.0, 100.0, vec![]),
            make_portfolio("b", 1.0, 100.0, vec![]),
        ];
        let first = rank_portfolios(portfolios.clone(), &FeedCriteria::default());
        let ids: Vec<&str> = first.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let mut reversed = portfolios;
        reversed.reverse();
        let second = rank_portfolios(reversed, &FeedCriteria::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_top_projects_truncated_in_order() {
        let projects: Vec<Project> = (0..5).map(|i| project(&format!("p{}", i), &[], &[])).collect();
        let out = rank_portfolios(
            vec![make_portfolio("a", 1.0, 1.0, projects)],
            &FeedCriteria::default(),
        );
        let titles: Vec<&str> = out[0].top_projects.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn test_factor_uses_all_projects_not_preview() {
        let projects = vec![
            project("1", &[], &[]),
            project("2", &[], &[]),
            project("3", &[], &[]),
            project("4", &["go"], &[]),
        ];
        let out = rank_portfolios(
            vec![make_portfolio("a", 0.0, 0.0, projects)],
            &FeedCriteria {
                tech_filters: set(&["go"]),
                ..Default::default()
            },
        );
        assert!((out[0].matching_project_factor - 0.25).abs() < 1e-12);
        assert_eq!(out[0].top_projects.len(), 3);
    }

    #[test]
    fn test_explain_attaches_metrics() {
        let p = make_portfolio("a", 5.0, 1800.0, vec![project("svc", &["go"], &[])]);
        let out = rank_portfolios(
            vec![p.clone()],
            &FeedCriteria {
                tech_filters: set(&["go"]),
                explain: true,
                ..Default::default()
            },
        );
        let m = out[0].explain.expect("explain requested");
        assert_eq!(m.tech_matching_projects, 1);
        assert_eq!(m.score, out[0].score);

        let plain = rank_portfolios(vec![p], &FeedCriteria::default());
        assert!(plain[0].explain.is_none());
    }

    #[test]
    fn test_experience_and_rating_filters() {
        let portfolios = vec![
            make_portfolio("a", 3.0, 1550.0, vec![]),
            make_portfolio("b", 3.0, 1650.0, vec![]),
            make_portfolio("c", 4.0, 1550.0, vec![]),
        ];
        let out = rank_portfolios(
            portfolios,
            &FeedCriteria {
                exp_filter: Some(3.0),
                rating_filter: Some(1500.0),
                ..Default::default()
            },
        );
        let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_empty_catalog_is_empty_feed() {
        assert!(rank_portfolios(Vec::new(), &FeedCriteria::default()).is_empty());
    }

    #[test]
    fn test_nan_values_sort_deterministically() {
        let portfolios = vec![
            make_portfolio("b", 1.0, f64::NAN, vec![]),
            make_portfolio("a", 1.0, 1000.0, vec![]),
            make_portfolio("c", 1.0, f64::NAN, vec![]),
            make_portfolio("d", 1.0, 2000.0, vec![]),
        ];
        let mut reversed = portfolios.clone();
        reversed.reverse();

        let criteria = FeedCriteria::default();
        let forward: Vec<String> = rank_portfolios(portfolios, &criteria)
            .into_iter()
            .map(|p| p.id)
            .collect();
        let backward: Vec<String> = rank_portfolios(reversed, &criteria)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(forward, backward);

        let d = forward.iter().position(|id| id == "d").unwrap();
        let a = forward.iter().position(|id| id == "a").unwrap();
        assert!(d < a);
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl PortfolioStore for FailingStore {
        async fn upsert_portfolio(&self, _: &Portfolio) -> Result<crate::store::UpsertOutcome> {
            anyhow::bail!("store offline")
        }

        async fn get_portfolio(&self, _: &str) -> Result<Option<Portfolio>> {
            anyhow::bail!("store offline")
        }

        async fn fetch_candidates(&self, _: &crate::criteria::BaseFilter) -> Result<Vec<Portfolio>> {
            anyhow::bail!("store offline")
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let err = get_filtered_feeds(&FailingStore, &FeedCriteria::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("store offline"));
    }
}
