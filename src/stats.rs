//! Database statistics.
//!
//! A quick summary of what the feed has to work with: portfolio counts by
//! visibility, project totals, averages over visible portfolios, and the
//! most common tech-stack tags. Used by `cfeed stats` to confirm that
//! imports landed.

use std::collections::HashMap;

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

const TOP_TAGS: usize = 10;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let totals = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN visible = 1 THEN 1 ELSE 0 END), 0) AS visible,
            COALESCE(SUM(json_array_length(projects_json)), 0) AS projects,
            AVG(CASE WHEN visible = 1 THEN years_of_experience END) AS avg_exp,
            AVG(CASE WHEN visible = 1 THEN leetcode_rating END) AS avg_rating
        FROM portfolios
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let total: i64 = totals.get("total");
    let visible: i64 = totals.get("visible");
    let projects: i64 = totals.get("projects");
    let avg_exp: Option<f64> = totals.get("avg_exp");
    let avg_rating: Option<f64> = totals.get("avg_rating");

    let tag_rows: Vec<String> =
        sqlx::query_scalar("SELECT tech_stack_json FROM portfolios WHERE visible = 1")
            .fetch_all(&pool)
            .await?;
    let top_tags = count_tags(&tag_rows);

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Craftfolio Feed — Database Stats");
    println!("================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Portfolios:  {}", total);
    println!("  Visible:     {}", visible);
    println!("  Hidden:      {}", total - visible);
    println!("  Projects:    {}", projects);
    if let (Some(exp), Some(rating)) = (avg_exp, avg_rating) {
        println!("  Avg exp:     {:.1} years", exp);
        println!("  Avg rating:  {:.0}", rating);
    }

    if !top_tags.is_empty() {
        println!();
        println!("  Top tech (visible):");
        println!("  {:<24} {:>6}", "TAG", "COUNT");
        println!("  {}", "-".repeat(31));
        for (tag, count) in &top_tags {
            println!("  {:<24} {:>6}", tag, count);
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Tally tags across JSON-encoded tech stacks, most common first
/// (ties alphabetical). Rows that fail to decode are skipped.
fn count_tags(rows: &[String]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for raw in rows {
        let Ok(tags) = serde_json::from_str::<Vec<String>>(raw) else {
            tracing::warn!("skipping undecodable tech_stack_json row");
            continue;
        };
        for tag in tags {
            *counts.entry(tag).or_default() += 1;
        }
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(TOP_TAGS);
    sorted
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
