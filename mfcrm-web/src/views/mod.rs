//! Server-rendered HTML pages
//!
//! Views are plain functions from loaded records to an HTML string; all
//! user-supplied text passes through [`layout::esc`].

pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod layout;
pub mod properties;
pub mod search;
pub mod tasks;
pub mod touchpoints;
