//! # Multifamily CRM Common Library
//!
//! Shared code for the CRM service:
//! - Database initialization, schema sync and migrations
//! - Domain models (contacts, properties, deals, tasks, touchpoints)
//! - Per-entity queries
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
