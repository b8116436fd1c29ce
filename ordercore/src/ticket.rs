//! The `Ticket` entity.

use crate::record_store::VersionedRecord;
use crate::types::{Price, RecordVersion, TicketId, TicketTitle, Timestamp};
use serde::{Deserialize, Serialize};

/// A sellable item.
///
/// Tickets are created by the upstream catalog service and are read-only
/// from this core's perspective: reservation state is never stored as a
/// flag on the ticket, it is derived from the orders referencing it (see
/// [`crate::reservation::ReservationService`]). The version counter is
/// advanced by the catalog service's own writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    title: TicketTitle,
    price: Price,
    version: RecordVersion,
    created_at: Timestamp,
}

impl Ticket {
    /// Creates a new ticket with a fresh id at the initial version.
    pub fn new(title: TicketTitle, price: Price) -> Self {
        Self::with_id(TicketId::new(), title, price)
    }

    /// Creates a new ticket with the given id at the initial version.
    ///
    /// Used when materializing a ticket whose identity was assigned
    /// upstream.
    pub fn with_id(id: TicketId, title: TicketTitle, price: Price) -> Self {
        Self {
            id,
            title,
            price,
            version: RecordVersion::initial(),
            created_at: Timestamp::now(),
        }
    }

    /// Returns the ticket's identity.
    pub const fn id(&self) -> TicketId {
        self.id
    }

    /// Returns the ticket's title.
    pub const fn title(&self) -> &TicketTitle {
        &self.title
    }

    /// Returns the ticket's price.
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Returns when the ticket was created.
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl VersionedRecord for Ticket {
    type Id = TicketId;

    fn record_id(&self) -> TicketId {
        self.id
    }

    fn version(&self) -> RecordVersion {
        self.version
    }

    fn with_version(mut self, version: RecordVersion) -> Self {
        self.version = version;
        self
    }
}
