//! weighbridge-core library.
//!
//! Records weighbridge tickets (date, vehicle license, driver, inbound and
//! outbound weight) in a local store and drives the list, add and edit
//! screens through small state machines:
//!
//! - [`store`] / [`db`]: persistence behind the [`store::TicketStore`] trait
//! - [`repository`]: async translation from store records to [`model::Ticket`]
//! - [`list`]: the live, filtered, sorted ticket list
//! - [`form`]: add/edit forms with per-field validation
//!
//! # Conventions
//!
//! - **Errors**: `TicketError` for store and repository failures, `anyhow::Result`
//!   for setup (opening databases, loading config).
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod list;
pub mod model;
pub mod repository;
pub mod store;

pub use error::{ErrorCode, TicketError};
pub use repository::{TicketFeed, TicketRepository};
