//! Database layer
//!
//! This module provides database abstraction for FocusHub.
//! It supports:
//! - SQLite (default, for single-binary deployment)
//! - PostgreSQL (for larger deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Architecture
//!
//! The database layer uses a trait-based abstraction (`DatabasePool`) that
//! allows the application to work with either SQLite or PostgreSQL without
//! knowing the specific backend.
//!
//! # Usage
//!
//! ```ignore
//! use focushub::config::DatabaseConfig;
//! use focushub::db::{create_pool, migrations};
//!
//! // Create pool from configuration
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//!
//! // Run migrations
//! migrations::run_migrations(&pool).await?;
//!
//! // Use the pool
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, PostgresDatabase, SqliteDatabase,
};
