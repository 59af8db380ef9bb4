//! In-memory [`PortfolioStore`] implementation for tests and embedding.
//!
//! Records live in a `BTreeMap` keyed by username behind `std::sync::RwLock`.
//! Candidate reads are a linear scan.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::criteria::BaseFilter;
use crate::models::Portfolio;

use super::{PortfolioStore, UpsertOutcome};

/// In-memory portfolio store.
pub struct InMemoryStore {
    portfolios: RwLock<BTreeMap<String, Portfolio>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            portfolios: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build a store pre-populated with `portfolios`.
    pub fn with_portfolios(portfolios: impl IntoIterator<Item = Portfolio>) -> Self {
        let map = portfolios
            .into_iter()
            .map(|p| (p.username.clone(), p))
            .collect();
        Self {
            portfolios: RwLock::new(map),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory portfolio store lock poisoned")
}

/// Apply one upsert to `map`. Ids are unique across usernames.
fn upsert_into(map: &mut BTreeMap<String, Portfolio>, portfolio: &Portfolio) -> Result<UpsertOutcome> {
    if let Some(existing) = map.get_mut(&portfolio.username) {
        let mut incoming = portfolio.clone();
        incoming.id = existing.id.clone();
        if *existing == incoming {
            return Ok(UpsertOutcome::Unchanged);
        }
        *existing = incoming;
        return Ok(UpsertOutcome::Updated);
    }

    if portfolio.id.is_empty() {
        bail!("portfolio '{}' has no id", portfolio.username);
    }
    if let Some(owner) = map.values().find(|p| p.id == portfolio.id) {
        bail!(
            "portfolio id '{}' already belongs to '{}'",
            portfolio.id,
            owner.username
        );
    }
    map.insert(portfolio.username.clone(), portfolio.clone());
    Ok(UpsertOutcome::Inserted)
}

#[async_trait]
impl PortfolioStore for InMemoryStore {
    async fn upsert_portfolio(&self, portfolio: &Portfolio) -> Result<UpsertOutcome> {
        let mut map = self.portfolios.write().map_err(poisoned)?;
        upsert_into(&mut map, portfolio)
    }

    /// Staged on a copy; the map is replaced only if every record applies.
    async fn upsert_batch(&self, portfolios: &[Portfolio]) -> Result<Vec<UpsertOutcome>> {
        let mut map = self.portfolios.write().map_err(poisoned)?;
        let mut staged = map.clone();
        let outcomes = portfolios
            .iter()
            .map(|p| upsert_into(&mut staged, p))
            .collect::<Result<Vec<_>>>()?;
        *map = staged;
        Ok(outcomes)
    }

    async fn get_portfolio(&self, username: &str) -> Result<Option<Portfolio>> {
        let map = self.portfolios.read().map_err(poisoned)?;
        Ok(map.get(username).cloned())
    }

    async fn fetch_candidates(&self, filter: &BaseFilter) -> Result<Vec<Portfolio>> {
        let map = self.portfolios.read().map_err(poisoned)?;
        let mut out: Vec<Portfolio> = map.values().filter(|p| filter.matches(p)).cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }
}
