//! # Craftfolio Feed Core
//!
//! Shared, runtime-free logic for Craftfolio Feed: portfolio models, feed
//! filter criteria, the store abstraction, and the feed ranking engine.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Storage backends live in the application
//! crate and plug in through [`store::PortfolioStore`].

pub mod criteria;
pub mod models;
pub mod ranking;
pub mod store;
