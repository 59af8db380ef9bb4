//! `cfeed feed`: run a feed query from the command line.

use anyhow::Result;

use craftfolio_feed_core::criteria::FeedCriteria;
use craftfolio_feed_core::models::FeedPreview;
use craftfolio_feed_core::ranking::get_filtered_feeds;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Query the database and return the ranked feed.
pub async fn load_feed(config: &Config, criteria: &FeedCriteria) -> Result<Vec<FeedPreview>> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let feeds = get_filtered_feeds(&store, criteria).await;
    store.pool().close().await;
    feeds
}

/// CLI entry point. `limit` only truncates what is printed.
pub async fn run_feed(
    config: &Config,
    criteria: &FeedCriteria,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut feeds = load_feed(config, criteria).await?;
    if let Some(n) = limit {
        feeds.truncate(n);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&feeds)?);
        return Ok(());
    }

    if feeds.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!("sorted by: {}", criteria.sort_key);
    println!();
    for (i, item) in feeds.iter().enumerate() {
        let name = if item.personal_info.name.is_empty() {
            "(unnamed)"
        } else {
            item.personal_info.name.as_str()
        };
        println!("{}. [{:.2}] {} / {}", i + 1, item.score, item.username, name);
        if let Some(ref tagline) = item.personal_info.tagline {
            println!("    tagline: {}", tagline);
        }
        println!(
            "    experience: {}  rating: {}  match: {:.2}",
            item.years_of_experience, item.leetcode_rating, item.matching_project_factor
        );
        if !item.tech_stack.is_empty() {
            println!("    tech: {}", item.tech_stack.join(", "));
        }
        if !item.top_projects.is_empty() {
            let titles: Vec<&str> = item.top_projects.iter().map(|p| p.title.as_str()).collect();
            println!("    projects: {}", titles.join(", "));
        }
        if let Some(m) = item.explain {
            println!(
                "    matched: tech {} + skill {} of {} projects",
                m.tech_matching_projects, m.skill_matching_projects, m.total_projects
            );
        }
        println!("    id: {}", item.id);
        println!();
    }

    Ok(())
}
