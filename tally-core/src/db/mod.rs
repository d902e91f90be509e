//! SQLite-backed store.
//!
//! Every table gets its own module of `impl Database` blocks; this module
//! owns the connection, migrations and seeding.

mod activities;
mod contacts;
pub(crate) mod convert;
mod daily;
mod dashboard;
mod deals;
mod follow_ups;
mod goals;
mod marketing;
mod products;
pub mod schema;
mod stages;
mod users;

pub use convert::now;
pub use deals::DealChanges;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::Connection;

use crate::error::CrmResult;
use crate::models::default_stages;

/// Cloneable handle to the store. Clones share one connection; statements
/// are serialized by the mutex, so each single-statement write is atomic.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening database at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_default() -> anyhow::Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "tally")
            .context("could not determine a data directory")?;
        Ok(dirs.data_dir().join("tally.db"))
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(schema::SCHEMA)?;
            Ok(())
        })?;
        tracing::debug!("database schema is up to date");
        Ok(())
    }

    /// Installs the default stage set when no stages exist yet. Returns the
    /// number of stages inserted.
    pub fn seed_default_stages(&self) -> CrmResult<usize> {
        if !self.list_stages()?.is_empty() {
            return Ok(0);
        }
        let stages = default_stages();
        for input in &stages {
            self.create_stage(input.clone())?;
        }
        tracing::info!("seeded {} pipeline stages", stages.len());
        Ok(stages.len())
    }

    pub(crate) fn with_conn<F, R>(&self, f: F) -> CrmResult<R>
    where
        F: FnOnce(&Connection) -> CrmResult<R>,
    {
        // A panic while holding the lock leaves the connection usable.
        let guard = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }
}
