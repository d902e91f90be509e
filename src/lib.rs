//! Tally: a small-business CRM served over a JSON REST API.
//!
//! The HTTP surface ([`api`]) and the auth gate ([`auth`]) live here; models,
//! storage and pipeline rules come from `tally-core` and are re-exported.

pub mod api;
pub mod auth;
pub mod config;

pub use tally_core::{db, deals, models, pipeline, policy};
