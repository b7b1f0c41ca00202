//! Per-invocation context: config, output mode and the opened ticket store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use weighbridge_core::TicketRepository;
use weighbridge_core::config::{self, WeighbridgeConfig};
use weighbridge_core::db::SqliteTicketStore;

use crate::output::OutputMode;

pub struct Session {
    pub repository: TicketRepository,
    pub config: WeighbridgeConfig,
    pub output: OutputMode,
}

impl Session {
    /// Open the ticket database named by `db_override`, `WEIGHBRIDGE_DB`, the
    /// config, or the platform default, in that order.
    pub fn open(
        config: WeighbridgeConfig,
        db_override: Option<&Path>,
        output: OutputMode,
    ) -> Result<Self> {
        let db_path = match db_override {
            Some(path) => path.to_path_buf(),
            None => config::resolve_db_path(&config)?,
        };
        debug!(path = %db_path.display(), "opening ticket database");
        let store = SqliteTicketStore::open(&db_path)
            .with_context(|| format!("open ticket store {}", db_path.display()))?;
        Ok(Self {
            repository: TicketRepository::new(Arc::new(store)),
            config,
            output,
        })
    }

    /// Render a ticket date with the configured format, in local time.
    pub fn format_date(&self, date: DateTime<Utc>) -> String {
        config::format_date(date, &self.config.display.date_format)
    }
}
