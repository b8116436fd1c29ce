//! Error types for `OrderCore`.
//!
//! The error design separates the layers a failure can originate from, so
//! callers can map each condition onto a distinct response:
//!
//! - **`RecordStoreError`**: persistence-layer failures, including the
//!   optimistic-concurrency `VersionConflict`
//! - **`PublishError`**: event-transport failures
//! - **`OrderError`**: service-layer failures surfaced to the caller
//!
//! None of these are swallowed internally; every variant propagates to the
//! caller as its own condition.

use crate::order::{Order, OrderStatus};
use crate::types::{OrderId, RecordVersion, TicketId};
use thiserror::Error;

/// Errors that can occur when interacting with a record store.
///
/// `RecordStoreError` represents failures at the persistence layer.
///
/// # Common Scenarios
///
/// - **`NotFound`**: the id does not resolve to a stored record
/// - **`VersionConflict`**: another writer updated the record since it was
///   read; re-read and recompute, never resubmit the same write
/// - **`ActiveOrderExists`**: the per-ticket uniqueness guarantee rejected
///   an order insert because a blocking order already holds the ticket
/// - **`ConnectionFailed`** / **`Timeout`** / **`Unavailable`**: remote
///   store I/O problems; the store never retries internally
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// The requested record was not found.
    #[error("Record '{id}' not found")]
    NotFound {
        /// Display form of the record id that did not resolve.
        id: String,
    },

    /// A record with this id already exists, so `save` cannot treat it as
    /// brand-new.
    #[error("Record '{id}' already exists")]
    AlreadyExists {
        /// Display form of the conflicting record id.
        id: String,
    },

    /// An order insert was rejected because a blocking order already
    /// exists for the same ticket.
    #[error("An active order already exists for ticket '{ticket_id}'")]
    ActiveOrderExists {
        /// The ticket that is already held.
        ticket_id: TicketId,
    },

    /// A version conflict occurred when updating a record.
    #[error("Version conflict on record '{id}': expected {expected}, but current is {current}")]
    VersionConflict {
        /// Display form of the record id with the conflict.
        id: String,
        /// The version the writer read and expected to still hold.
        expected: RecordVersion,
        /// The actual current version in the store.
        current: RecordVersion,
    },

    /// The connection to the record store failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Serialization of a record failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A timeout occurred while waiting for the operation.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The record store is temporarily unavailable.
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Clone for RecordStoreError {
    fn clone(&self) -> Self {
        match self {
            Self::NotFound { id } => Self::NotFound { id: id.clone() },
            Self::AlreadyExists { id } => Self::AlreadyExists { id: id.clone() },
            Self::ActiveOrderExists { ticket_id } => Self::ActiveOrderExists {
                ticket_id: *ticket_id,
            },
            Self::VersionConflict {
                id,
                expected,
                current,
            } => Self::VersionConflict {
                id: id.clone(),
                expected: *expected,
                current: *current,
            },
            Self::ConnectionFailed(msg) => Self::ConnectionFailed(msg.clone()),
            Self::SerializationFailed(msg) => Self::SerializationFailed(msg.clone()),
            Self::Io(err) => Self::Io(std::io::Error::new(err.kind(), err.to_string())),
            Self::Timeout(duration) => Self::Timeout(*duration),
            Self::Unavailable(msg) => Self::Unavailable(msg.clone()),
            Self::Internal(msg) => Self::Internal(msg.clone()),
        }
    }
}

/// Errors that can occur when publishing a domain event.
///
/// Publishing is a may-fail remote operation with no implicit retry in
/// this core. A failed publish never rolls back the entity mutation that
/// already committed; it is surfaced so an at-least-once redelivery
/// mechanism at the collaborator layer can take over.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The connection to the event transport failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Serialization of the event payload failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// A timeout occurred while waiting for the transport to acknowledge.
    #[error("Publish timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The event transport is temporarily unavailable.
    #[error("Event transport unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during reservation and order lifecycle operations.
///
/// `OrderError` is the service-layer taxonomy. Each variant maps onto a
/// distinct caller-visible condition:
///
/// - **`TicketNotFound`** / **`OrderNotFound`**: not-found; terminal for
///   the request
/// - **`TicketAlreadyReserved`** / **`InvalidTransition`**: conflict; not
///   retryable with the same input, the caller must re-fetch state
/// - **`ConcurrencyConflict`**: retryable only by re-reading and
///   recomputing the decision from scratch
/// - **`Store`**: persistence I/O failure
/// - **`Publish`**: the entity mutation committed but the event did not go
///   out; the committed order is carried so nothing is lost
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    /// The ticket id does not resolve to an existing ticket.
    #[error("Ticket '{0}' not found")]
    TicketNotFound(TicketId),

    /// The order id does not resolve to an existing order.
    #[error("Order '{0}' not found")]
    OrderNotFound(OrderId),

    /// A blocking order already holds the ticket.
    #[error("Ticket '{0}' is already reserved")]
    TicketAlreadyReserved(TicketId),

    /// The requested status transition is not in the allowed table.
    #[error("Invalid order status transition: {from} -> {to}")]
    InvalidTransition {
        /// The order's current status.
        from: OrderStatus,
        /// The rejected target status.
        to: OrderStatus,
    },

    /// The caller's observed version is stale. Re-fetch the order and
    /// reconsider the operation; the world may have changed.
    #[error("Stale version for order '{order_id}': re-fetch before retrying")]
    ConcurrencyConflict {
        /// The order whose version was stale.
        order_id: OrderId,
    },

    /// An error occurred in the record store.
    #[error("Record store error: {0}")]
    Store(#[from] RecordStoreError),

    /// The order mutation committed, but publishing the corresponding
    /// event failed. The committed order is included so the caller can
    /// hand the event to a redelivery mechanism.
    #[error("Event publish failed for order '{}': {source}", .order.id())]
    Publish {
        /// The order as committed to the store.
        order: Box<Order>,
        /// The underlying transport failure.
        source: PublishError,
    },
}

/// Type alias for record store operation results.
pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

/// Type alias for event publish results.
pub type PublishResult<T> = Result<T, PublishError>;

/// Type alias for service-layer operation results.
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_display_includes_both_versions() {
        let err = RecordStoreError::VersionConflict {
            id: "abc".to_string(),
            expected: crate::types::RecordVersion::initial(),
            current: crate::types::RecordVersion::initial().next(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 0"));
        assert!(msg.contains("current is 1"));
    }

    #[test]
    fn store_error_converts_into_order_error() {
        let store_err = RecordStoreError::Unavailable("down".to_string());
        let order_err: OrderError = store_err.into();
        assert!(matches!(order_err, OrderError::Store(_)));
    }

    #[test]
    fn clone_preserves_io_error_kind() {
        let err = RecordStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        let cloned = err.clone();
        match cloned {
            RecordStoreError::Io(io) => {
                assert_eq!(io.kind(), std::io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
