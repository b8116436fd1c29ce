//! Domain event contract for order lifecycle changes.
//!
//! Every mutation this core commits is announced to the rest of the
//! platform so that downstream services (payments, ticket-availability
//! projections, expiration watchers) can converge on a consistent view.
//! The publisher is a port: the core owns the event shapes and the
//! delivery contract, the transport adapter owns the wire protocol.

use crate::errors::PublishResult;
use crate::order::{Order, OrderStatus};
use crate::record_store::VersionedRecord;
use crate::types::{OrderId, RecordVersion, TicketId, Timestamp, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The payload carried by every order event.
///
/// The payload always includes the entity id and its version at publish
/// time. Consumers use the version as their deduplication and ordering
/// token: a consumer that has already applied version N must ignore a
/// delivery carrying version ≤ N. Field names serialize in camelCase to
/// match the platform's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEventPayload {
    /// The order's identity.
    pub id: OrderId,
    /// The order's version at publish time.
    pub version: RecordVersion,
    /// The ticket the order reserves.
    pub ticket_id: TicketId,
    /// The user who owns the reservation.
    pub user_id: UserId,
    /// The order's status after the change being announced.
    pub status: OrderStatus,
    /// When the reservation expires.
    pub expires_at: Timestamp,
}

impl From<&Order> for OrderEventPayload {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            version: order.version(),
            ticket_id: order.ticket_id(),
            user_id: order.user_id().clone(),
            status: order.status(),
            expires_at: order.expires_at(),
        }
    }
}

/// A domain event describing one committed order state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// A reservation was made: an order now exists at version 0.
    OrderCreated(OrderEventPayload),
    /// A reservation was released; the ticket is reservable again.
    OrderCancelled(OrderEventPayload),
    /// The order moved to a new non-cancelled status.
    OrderStatusChanged(OrderEventPayload),
}

impl OrderEvent {
    /// Builds the event announcing a freshly persisted order.
    pub fn created(order: &Order) -> Self {
        Self::OrderCreated(order.into())
    }

    /// Builds the event announcing a committed status change.
    ///
    /// Transitions into `Cancelled` are announced as `OrderCancelled`;
    /// every other transition as `OrderStatusChanged`.
    pub fn status_changed(order: &Order) -> Self {
        if order.status() == OrderStatus::Cancelled {
            Self::OrderCancelled(order.into())
        } else {
            Self::OrderStatusChanged(order.into())
        }
    }

    /// Returns the event's wire name.
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::OrderCreated(_) => "OrderCreated",
            Self::OrderCancelled(_) => "OrderCancelled",
            Self::OrderStatusChanged(_) => "OrderStatusChanged",
        }
    }

    /// Returns the event's payload.
    pub const fn payload(&self) -> &OrderEventPayload {
        match self {
            Self::OrderCreated(payload)
            | Self::OrderCancelled(payload)
            | Self::OrderStatusChanged(payload) => payload,
        }
    }
}

/// Durable broadcaster of order events.
///
/// # Delivery contract
///
/// - **At-least-once**: a successful `publish` means the event is durably
///   handed to the transport; consumers may still see duplicates across
///   retries and redeliveries.
/// - **Per-entity ordering** is NOT free: it holds only when the transport
///   enforces a single ordered stream per entity key. This core requires
///   that guarantee from its transport collaborator.
/// - **Dedup token**: consumers must treat the payload's `version` as a
///   deduplication/ordering token and ignore deliveries carrying a
///   version ≤ the last one they applied.
///
/// A failed `publish` never rolls back the entity mutation that already
/// committed; the caller surfaces the failure to the redelivery layer.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event to all subscribed consumers.
    async fn publish(&self, event: &OrderEvent) -> PublishResult<()>;
}
