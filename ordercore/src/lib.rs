//! `OrderCore` - order-placement core for a distributed ticket-sales
//! platform.
//!
//! Given a ticket identifier, this library decides whether the ticket can
//! be reserved, creates the order representing the reservation, and
//! announces the change to the rest of the platform. Concurrency safety
//! comes from optimistic versioning rather than locks: every mutation is
//! a compare-and-swap against the version the writer last read, and every
//! published event carries the entity's version so downstream consumers
//! can deduplicate and order deliveries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod order;
pub mod publisher;
pub mod record_store;
pub mod reservation;
pub mod ticket;
pub mod types;

pub use errors::{
    OrderError, OrderResult, PublishError, PublishResult, RecordStoreError, RecordStoreResult,
};
pub use order::{Order, OrderStatus};
pub use publisher::{EventPublisher, OrderEvent, OrderEventPayload};
pub use record_store::{OrderStore, RecordStore, TicketStore, VersionedRecord};
pub use reservation::{Clock, ReservationConfig, ReservationService, SystemClock};
pub use ticket::Ticket;
pub use types::{OrderId, Price, RecordVersion, TicketId, TicketTitle, Timestamp, UserId};
