//! The `Order` entity and its status machine.
//!
//! An order represents one reservation attempt against a ticket. Its
//! status enumeration is closed and the allowed transitions are attached
//! to the type, so an illegal transition is a validated error rather than
//! a string-comparison bug.

use crate::record_store::VersionedRecord;
use crate::types::{OrderId, RecordVersion, TicketId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// The lifecycle status of an [`Order`].
///
/// Allowed transitions:
///
/// ```text
/// Created ──> AwaitingPayment ──> Complete
///    │               │
///    └──> Cancelled <┘
/// ```
///
/// `Complete` and `Cancelled` are terminal. Every other pair is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Reservation just made, awaiting payment, subject to expiration.
    Created,
    /// Reservation released; the ticket becomes reservable again.
    Cancelled,
    /// Payment process started; the ticket remains held.
    AwaitingPayment,
    /// Payment confirmed; the reservation is permanent until a separate
    /// refund/cancel flow.
    Complete,
}

impl OrderStatus {
    /// All statuses, for exhaustive table checks.
    pub const ALL: [Self; 4] = [
        Self::Created,
        Self::Cancelled,
        Self::AwaitingPayment,
        Self::Complete,
    ];

    /// Returns whether the transition from `self` to `next` is allowed.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::AwaitingPayment)
                | (Self::Created, Self::Cancelled)
                | (Self::AwaitingPayment, Self::Complete)
                | (Self::AwaitingPayment, Self::Cancelled)
        )
    }

    /// Returns whether this status admits no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Cancelled => "Cancelled",
            Self::AwaitingPayment => "AwaitingPayment",
            Self::Complete => "Complete",
        };
        f.write_str(name)
    }
}

/// One reservation attempt against a ticket.
///
/// An order holds a non-owning reference to its ticket (the id only; the
/// ticket is re-fetched when needed) and an absolute expiration timestamp
/// after which an unpaid reservation is void. The expiration is a passive
/// deadline checked lazily at decision time; an external expiration
/// process transitions overdue orders to `Cancelled` through the same
/// validated transition path as every other collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    ticket_id: TicketId,
    user_id: UserId,
    status: OrderStatus,
    expires_at: Timestamp,
    version: RecordVersion,
}

impl Order {
    /// Creates a new order in `Created` status at the initial version.
    pub fn new(ticket_id: TicketId, user_id: UserId, expires_at: Timestamp) -> Self {
        Self {
            id: OrderId::new(),
            ticket_id,
            user_id,
            status: OrderStatus::Created,
            expires_at,
            version: RecordVersion::initial(),
        }
    }

    /// Returns the order's identity.
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the id of the ticket this order reserves.
    pub const fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }

    /// Returns the identity of the user who made the reservation.
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the order's current status.
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns when the reservation expires.
    pub const fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Returns whether an unpaid reservation has passed its deadline.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Returns whether this order prevents a new reservation of the same
    /// ticket at instant `now`.
    ///
    /// An order is blocking if payment is in progress or confirmed, or if
    /// it is freshly `Created` and its expiration is strictly in the
    /// future. This single predicate drives both the reservability
    /// decision and the store-level per-ticket uniqueness guarantee, so
    /// the two can never disagree.
    pub fn is_blocking_at(&self, now: Timestamp) -> bool {
        match self.status {
            OrderStatus::AwaitingPayment | OrderStatus::Complete => true,
            OrderStatus::Created => !self.is_expired_at(now),
            OrderStatus::Cancelled => false,
        }
    }

    /// Returns this order with its status replaced.
    ///
    /// Does not validate the transition table; validation happens in
    /// [`crate::reservation::ReservationService::transition`] before the
    /// write is attempted.
    #[must_use]
    pub const fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }
}

impl VersionedRecord for Order {
    type Id = OrderId;

    fn record_id(&self) -> OrderId {
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
