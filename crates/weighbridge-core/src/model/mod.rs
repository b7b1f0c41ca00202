//! Domain values shared by the store, repository and state machines.

pub mod ticket;

pub use ticket::{NewTicket, Ticket, TicketId, format_weight};
