//! Core library for Tally.
//!
//! This crate provides the domain models, pipeline rules and database
//! operations for the CRM, independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally_core::db::Database;
//! use tally_core::deals::DealService;
//! use tally_core::policy::ClosedStagePolicy;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//! db.seed_default_stages()?;
//!
//! let deals = DealService::new(db, Arc::new(ClosedStagePolicy::default()));
//! let pipeline = deals.get_pipeline()?;
//! println!("{} deals in the pipeline", pipeline.summary.total_deals);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod deals;
pub mod error;
pub mod models;
pub mod money;
pub mod pipeline;
pub mod policy;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{CrmError, CrmResult};
