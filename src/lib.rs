//! # Craftfolio Feed
//!
//! Ranked, filterable feed of developer portfolios, served from SQLite.
//!
//! Portfolios are imported as JSON documents, stored with their filterable
//! scalar fields as columns, and ranked per request by the engine in
//! [`craftfolio_feed_core::ranking`]. Results are exposed through the `cfeed`
//! CLI and a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │   Import    │──▶│   SQLite    │──▶│ Feed ranking │
//! │ (JSON docs) │   │ portfolios  │   │  (core crate)│
//! └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                            │
//!                        ┌───────────────────┤
//!                        ▼                   ▼
//!                   ┌──────────┐     ┌──────────────┐
//!                   │   CLI    │     │ HTTP + cache │
//!                   │ (cfeed)  │     │   (axum)     │
//!                   └──────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cfeed init                            # create database
//! cfeed import ./portfolios.json        # load portfolio documents
//! cfeed feed --tech go --sort score     # ranked feed in the terminal
//! cfeed serve                           # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `PortfolioStore` |
//! | [`import`] | JSON portfolio import |
//! | [`query`] | Query-string parsing into feed criteria |
//! | [`cache`] | Feed response cache |
//! | [`feed`] | `cfeed feed` command |
//! | [`server`] | HTTP API |
//! | [`stats`] | Database statistics |
//! | [`logging`] | Tracing setup |

pub mod cache;
pub mod config;
pub mod db;
pub mod feed;
pub mod import;
pub mod logging;
pub mod migrate;
pub mod query;
pub mod server;
pub mod sqlite_store;
pub mod stats;
