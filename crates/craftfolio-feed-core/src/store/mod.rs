//! Storage abstraction for portfolio records.
//!
//! The [`PortfolioStore`] trait is the only capability the feed engine
//! needs from persistence: a scalar-filtered bulk read of visible
//! portfolios. Writes exist for the import path and for tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::criteria::BaseFilter;
use crate::models::Portfolio;

/// Result of writing one portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Content hash matched the stored record; nothing was written.
    Unchanged,
}

/// Abstract portfolio storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_portfolio`](PortfolioStore::upsert_portfolio) | Insert or update a portfolio, keyed by username |
/// | [`upsert_batch`](PortfolioStore::upsert_batch) | Upsert many portfolios |
/// | [`get_portfolio`](PortfolioStore::get_portfolio) | Look up one portfolio by username |
/// | [`fetch_candidates`](PortfolioStore::fetch_candidates) | Bulk read of visible portfolios matching a [`BaseFilter`] |
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Insert or update a portfolio keyed by `username`.
    ///
    /// An existing record keeps its `id`. A new record with an empty `id`
    /// must be assigned one by the caller before this is invoked.
    async fn upsert_portfolio(&self, portfolio: &Portfolio) -> Result<UpsertOutcome>;

    /// Upsert several portfolios, returning one outcome per record.
    ///
    /// The default writes one record at a time and stops at the first
    /// error, leaving earlier records written. Backends that can should
    /// override this to apply the batch atomically.
    async fn upsert_batch(&self, portfolios: &[Portfolio]) -> Result<Vec<UpsertOutcome>> {
        let mut outcomes = Vec::with_capacity(portfolios.len());
        for portfolio in portfolios {
            outcomes.push(self.upsert_portfolio(portfolio).await?);
        }
        Ok(outcomes)
    }

    /// Fetch one portfolio by username, regardless of visibility.
    async fn get_portfolio(&self, username: &str) -> Result<Option<Portfolio>>;

    /// Visible portfolios matching `filter`, ordered by `id` ascending.
    ///
    /// Implementations may over-fetch; the engine re-applies the filter.
    async fn fetch_candidates(&self, filter: &BaseFilter) -> Result<Vec<Portfolio>>;
}
