//! SQLite-backed [`PortfolioStore`] implementation.
//!
//! Scalar fields used by the base filter are real columns so the filter is
//! pushed into SQL. Personal info, tech stack, and projects are stored as
//! JSON text and decoded per row.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

use craftfolio_feed_core::criteria::BaseFilter;
use craftfolio_feed_core::models::Portfolio;
use craftfolio_feed_core::store::{PortfolioStore, UpsertOutcome};

const SELECT_COLUMNS: &str = "id, username, visible, years_of_experience, leetcode_rating, \
     recent_activity, personal_info_json, tech_stack_json, projects_json";

/// SQLite implementation of the [`PortfolioStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// SHA-256 over the record's content, excluding its identifier.
pub fn content_hash(portfolio: &Portfolio) -> Result<String> {
    let mut unkeyed = portfolio.clone();
    unkeyed.id.clear();
    let bytes = serde_json::to_vec(&unkeyed)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn row_to_portfolio(row: &SqliteRow) -> Result<Portfolio> {
    let id: String = row.get("id");
    let visible: i64 = row.get("visible");
    let personal_info_json: String = row.get("personal_info_json");
    let tech_stack_json: String = row.get("tech_stack_json");
    let projects_json: String = row.get("projects_json");

    Ok(Portfolio {
        personal_info: serde_json::from_str(&personal_info_json)
            .with_context(|| format!("corrupt personal_info_json for portfolio {}", id))?,
        tech_stack: serde_json::from_str(&tech_stack_json)
            .with_context(|| format!("corrupt tech_stack_json for portfolio {}", id))?,
        projects: serde_json::from_str(&projects_json)
            .with_context(|| format!("corrupt projects_json for portfolio {}", id))?,
        username: row.get("username"),
        visible: visible != 0,
        years_of_experience: row.get("years_of_experience"),
        leetcode_rating: row.get("leetcode_rating"),
        recent_activity: row.get("recent_activity"),
        id,
    })
}

/// Upsert one portfolio on `conn`, which may be a pooled connection or an
/// open transaction.
async fn upsert_on(conn: &mut SqliteConnection, portfolio: &Portfolio) -> Result<UpsertOutcome> {
    let hash = content_hash(portfolio)?;
    let now = chrono::Utc::now().timestamp();
    let personal_info_json = serde_json::to_string(&portfolio.personal_info)?;
    let tech_stack_json = serde_json::to_string(&portfolio.tech_stack)?;
    let projects_json = serde_json::to_string(&portfolio.projects)?;

    let existing: Option<(String, String)> =
        sqlx::query_as("SELECT id, content_hash FROM portfolios WHERE username = ?")
            .bind(&portfolio.username)
            .fetch_optional(&mut *conn)
            .await?;

    match existing {
        Some((_, stored_hash)) if stored_hash == hash => Ok(UpsertOutcome::Unchanged),
        Some((id, _)) => {
            sqlx::query(
                r#"
                UPDATE portfolios SET
                    visible = ?,
                    years_of_experience = ?,
                    leetcode_rating = ?,
                    recent_activity = ?,
                    personal_info_json = ?,
                    tech_stack_json = ?,
                    projects_json = ?,
                    content_hash = ?,
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(portfolio.visible)
            .bind(portfolio.years_of_experience)
            .bind(portfolio.leetcode_rating)
            .bind(portfolio.recent_activity)
            .bind(&personal_info_json)
            .bind(&tech_stack_json)
            .bind(&projects_json)
            .bind(&hash)
            .bind(now)
            .bind(&id)
            .execute(&mut *conn)
            .await?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            if portfolio.id.is_empty() {
                bail!("portfolio '{}' has no id", portfolio.username);
            }
            sqlx::query(
                r#"
                INSERT INTO portfolios (id, username, visible, years_of_experience,
                                        leetcode_rating, recent_activity, personal_info_json,
                                        tech_stack_json, projects_json, content_hash,
                                        created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&portfolio.id)
            .bind(&portfolio.username)
            .bind(portfolio.visible)
            .bind(portfolio.years_of_experience)
            .bind(portfolio.leetcode_rating)
            .bind(portfolio.recent_activity)
            .bind(&personal_info_json)
            .bind(&tech_stack_json)
            .bind(&projects_json)
            .bind(&hash)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

#[async_trait]
impl PortfolioStore for SqliteStore {
    async fn upsert_portfolio(&self, portfolio: &Portfolio) -> Result<UpsertOutcome> {
        let mut conn = self.pool.acquire().await?;
        upsert_on(&mut *conn, portfolio).await
    }

    /// All-or-nothing: any failure rolls the whole batch back.
    async fn upsert_batch(&self, portfolios: &[Portfolio]) -> Result<Vec<UpsertOutcome>> {
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(portfolios.len());
        for portfolio in portfolios {
            let outcome = upsert_on(&mut *tx, portfolio)
                .await
                .with_context(|| format!("Failed to store portfolio '{}'", portfolio.username))?;
            outcomes.push(outcome);
        }
        tx.commit().await?;
        Ok(outcomes)
    }

    async fn get_portfolio(&self, username: &str) -> Result<Option<Portfolio>> {
        let sql = format!("SELECT {} FROM portfolios WHERE username = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_portfolio).transpose()
    }

    async fn fetch_candidates(&self, filter: &BaseFilter) -> Result<Vec<Portfolio>> {
        let mut sql = format!("SELECT {} FROM portfolios WHERE visible = 1", SELECT_COLUMNS);
        if filter.years_of_experience.is_some() {
            sql.push_str(" AND years_of_experience = ?");
        }
        if filter.rating_range().is_some() {
            sql.push_str(" AND leetcode_rating >= ? AND leetcode_rating < ?");
        }
        sql.push_str(" ORDER BY id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(exp) = filter.years_of_experience {
            query = query.bind(exp);
        }
        if let Some((low, high)) = filter.rating_range() {
            query = query.bind(low).bind(high);
        }

        let rows = query.fetch_all(&self.pool).await?;
        tracing::debug!(rows = rows.len(), "fetched feed candidates");
        rows.iter().map(row_to_portfolio).collect()
    }
}
