//! Canonical `SQLite` schema for the ticket database.
//!
//! - `tickets` holds one row per weighbridge ticket; `AUTOINCREMENT` keeps ids
//!   from being reused after a row disappears
//! - `store_meta` records the schema version alongside `PRAGMA user_version`

/// Migration v1: the tickets table plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS tickets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date_ms INTEGER NOT NULL,
    license_number TEXT NOT NULL,
    driver_name TEXT NOT NULL,
    inbound_weight REAL NOT NULL,
    outbound_weight REAL NOT NULL,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 0);
";

/// Migration v2: lookup indexes for date-range and name queries.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_tickets_date ON tickets(date_ms);
CREATE INDEX IF NOT EXISTS idx_tickets_driver ON tickets(driver_name);
CREATE INDEX IF NOT EXISTS idx_tickets_license ON tickets(license_number);
";

/// Indexes every migrated database must carry.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_tickets_date",
    "idx_tickets_driver",
    "idx_tickets_license",
];

/// Column list shared by every ticket `SELECT`, in `row_to_record` order.
pub const TICKET_COLUMNS: &str =
    "id, date_ms, license_number, driver_name, inbound_weight, outbound_weight";
