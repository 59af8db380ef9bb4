//! Portfolio import.
//!
//! Stands in for the portfolio editor: loads a JSON array of portfolio
//! documents, validates them, assigns identifiers to new records, and
//! upserts them by username. Records whose content hash is unchanged are
//! skipped by the store.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use craftfolio_feed_core::models::Portfolio;
use craftfolio_feed_core::store::{PortfolioStore, UpsertOutcome};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Counts reported after an import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
}

impl ImportSummary {
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.unchanged
    }
}

pub async fn run_import(config: &Config, path: &Path, dry_run: bool) -> Result<()> {
    let portfolios = load_portfolios(path)?;
    validate_portfolios(&portfolios)?;

    if dry_run {
        let visible = portfolios.iter().filter(|p| p.visible).count();
        println!("import {} (dry-run)", path.display());
        println!("  portfolios found: {}", portfolios.len());
        println!("  visible: {}", visible);
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);
    let summary = import_portfolios(&store, portfolios).await?;

    println!("import {}", path.display());
    println!("  fetched: {} portfolios", summary.total());
    println!("  inserted: {}", summary.inserted);
    println!("  updated: {}", summary.updated);
    println!("  unchanged: {}", summary.unchanged);
    println!("ok");

    store.pool().close().await;
    Ok(())
}

/// Read a JSON array of portfolio documents.
pub fn load_portfolios(path: &Path) -> Result<Vec<Portfolio>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse portfolios from {}", path.display()))
}

/// Reject records the feed could not rank meaningfully.
pub fn validate_portfolios(portfolios: &[Portfolio]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (i, p) in portfolios.iter().enumerate() {
        let username = p.username.trim();
        if username.is_empty() {
            bail!("portfolio #{}: username must not be empty", i);
        }
        if !seen.insert(username) {
            bail!("portfolio #{}: duplicate username '{}'", i, username);
        }
        if !p.id.is_empty() && !seen_ids.insert(p.id.as_str()) {
            bail!("portfolio #{}: duplicate id '{}'", i, p.id);
        }
        for (field, value) in [
            ("yearsOfExperience", p.years_of_experience),
            ("leetcodeRating", p.leetcode_rating),
            ("recentActivity", p.activity()),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!(
                    "portfolio '{}': {} must be a non-negative number, got {}",
                    username,
                    field,
                    value
                );
            }
        }
    }
    Ok(())
}

/// Upsert validated portfolios into `store` as one batch.
///
/// A record without an `id` keeps the id already stored for its username,
/// or receives a fresh UUID. On the SQLite store a failure writes nothing.
pub async fn import_portfolios<S: PortfolioStore + ?Sized>(
    store: &S,
    portfolios: Vec<Portfolio>,
) -> Result<ImportSummary> {
    let mut prepared = Vec::with_capacity(portfolios.len());
    for mut portfolio in portfolios {
        portfolio.username = portfolio.username.trim().to_string();
        if portfolio.id.is_empty() {
            portfolio.id = match store.get_portfolio(&portfolio.username).await? {
                Some(existing) => existing.id,
                None => Uuid::new_v4().to_string(),
            };
        }
        prepared.push(portfolio);
    }

    let outcomes = store
        .upsert_batch(&prepared)
        .await
        .context("Import failed")?;

    let mut summary = ImportSummary::default();
    for (portfolio, outcome) in prepared.iter().zip(outcomes) {
        tracing::debug!(username = %portfolio.username, ?outcome, "portfolio imported");
        match outcome {
            UpsertOutcome::Inserted => summary.inserted += 1,
            UpsertOutcome::Updated => summary.updated += 1,
            UpsertOutcome::Unchanged => summary.unchanged += 1,
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        updated = summary.updated,
        unchanged = summary.unchanged,
        "import finished"
    );
    Ok(summary)
}
