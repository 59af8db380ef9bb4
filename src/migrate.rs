//! Schema migrations.
//!
//! Creates the `portfolios` table and its filter indexes. Every statement is
//! `IF NOT EXISTS`, so `cfeed init` can be re-run safely.

use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Create or verify the schema.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a DDL statement
/// fails.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Scalar columns back the feed's filter pushdown; nested data is JSON.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS portfolios (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            visible INTEGER NOT NULL DEFAULT 0,
            years_of_experience REAL NOT NULL DEFAULT 0,
            leetcode_rating REAL NOT NULL DEFAULT 0,
            recent_activity REAL,
            personal_info_json TEXT NOT NULL DEFAULT '{}',
            tech_stack_json TEXT NOT NULL DEFAULT '[]',
            projects_json TEXT NOT NULL DEFAULT '[]',
            content_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_portfolios_visible_exp ON portfolios(visible, years_of_experience)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_portfolios_visible_rating ON portfolios(visible, leetcode_rating)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    tracing::info!(path = %config.db.path.display(), "schema migrations applied");
    Ok(())
}
