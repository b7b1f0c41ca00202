//! [`TicketStore`] backed by the `SQLite` ticket database.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::{lock::StoreLock, open_connection, schema::TICKET_COLUMNS};
use crate::error::TicketError;
use crate::model::TicketId;
use crate::store::{NewTicketRecord, StoreSnapshot, TicketRecord, TicketStore};

/// `SQLite` ticket store.
///
/// Holds one connection behind a mutex and republishes the full
/// newest-first ticket list after every committed write. When opened from a
/// file it also holds the advisory [`StoreLock`] for the lifetime of the
/// store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
    snapshots: watch::Sender<StoreSnapshot>,
    lock: Option<StoreLock>,
}

impl std::fmt::Debug for SqliteTicketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTicketStore")
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}

impl SqliteTicketStore {
    /// Open the database at `path`, taking the single-client lock first.
    ///
    /// # Errors
    ///
    /// Returns an error if another client holds the lock, or if opening or
    /// migrating the database fails.
    pub fn open(path: &Path) -> Result<Self> {
        let lock = StoreLock::acquire_default(path)
            .with_context(|| format!("lock ticket database {}", path.display()))?;
        let conn = open_connection(path)?;
        Ok(Self::from_parts(conn, Some(lock)))
    }

    #[cfg(test)]
    fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("open in-memory ticket database")?;
        super::migrations::migrate(&mut conn).context("apply ticket store migrations")?;
        Ok(Self::from_parts(conn, None))
    }

    fn from_parts(conn: Connection, lock: Option<StoreLock>) -> Self {
        let initial = query_all(&conn);
        if let Err(err) = &initial {
            warn!(%err, "initial ticket query failed");
        }
        let (snapshots, _) = watch::channel(Some(initial.map(Arc::<[TicketRecord]>::from)));
        Self {
            conn: Mutex::new(conn),
            snapshots,
            lock,
        }
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-run the live query and publish the result, failure included.
    fn publish(&self, conn: &Connection) {
        let snapshot = query_all(conn);
        match &snapshot {
            Ok(records) => debug!(count = records.len(), "published ticket snapshot"),
            Err(err) => warn!(%err, "ticket snapshot query failed"),
        }
        self.snapshots.send_replace(Some(snapshot.map(Arc::<[TicketRecord]>::from)));
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TicketRecord> {
    Ok(TicketRecord {
        id: TicketId(row.get(0)?),
        date_ms: row.get(1)?,
        license_number: row.get(2)?,
        driver_name: row.get(3)?,
        inbound_weight: row.get(4)?,
        outbound_weight: row.get(5)?,
    })
}

fn query_all(conn: &Connection) -> Result<Vec<TicketRecord>, TicketError> {
    let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY id DESC");
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], row_to_record)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(TicketError::from)
}

impl TicketStore for SqliteTicketStore {
    fn observe_all(&self) -> watch::Receiver<StoreSnapshot> {
        self.snapshots.subscribe()
    }

    fn get_by_id(&self, id: TicketId) -> Result<TicketRecord, TicketError> {
        let conn = self.lock_conn();
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1");
        conn.query_row(&sql, params![id.0], row_to_record)
            .optional()?
            .ok_or(TicketError::NotFound(id))
    }

    fn insert(&self, record: &NewTicketRecord) -> Result<TicketId, TicketError> {
        let conn = self.lock_conn();
        let now_us = Utc::now().timestamp_micros();
        conn.execute(
            "INSERT INTO tickets (
                date_ms, license_number, driver_name,
                inbound_weight, outbound_weight, created_at_us, updated_at_us
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                record.date_ms,
                record.license_number,
                record.driver_name,
                record.inbound_weight,
                record.outbound_weight,
                now_us,
            ],
        )?;
        let id = TicketId(conn.last_insert_rowid());
        debug!(%id, "inserted ticket");
        self.publish(&conn);
        Ok(id)
    }

    fn replace(&self, id: TicketId, record: &NewTicketRecord) -> Result<(), TicketError> {
        let conn = self.lock_conn();
        let changed = conn.execute(
            "UPDATE tickets SET
                date_ms = ?2,
                license_number = ?3,
                driver_name = ?4,
                inbound_weight = ?5,
                outbound_weight = ?6,
                updated_at_us = ?7
             WHERE id = ?1",
            params![
                id.0,
                record.date_ms,
                record.license_number,
                record.driver_name,
                record.inbound_weight,
                record.outbound_weight,
                Utc::now().timestamp_micros(),
            ],
        )?;
        if changed == 0 {
            return Err(TicketError::NotFound(id));
        }
        debug!(%id, "replaced ticket");
        self.publish(&conn);
        Ok(())
    }
}
