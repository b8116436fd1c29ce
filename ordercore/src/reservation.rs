//! The reservation decision engine and order lifecycle operations.
//!
//! [`ReservationService`] is the sole writer of order creation. Whether a
//! ticket can be reserved is a *derived read* over the orders referencing
//! it, not a stored flag on the ticket: flags would require cross-entity
//! transactional updates that do not exist across service boundaries,
//! while deriving the answer at decision time keeps the ticket immutable
//! from this core's perspective.

use crate::errors::{OrderError, OrderResult};
use crate::order::{Order, OrderStatus};
use crate::publisher::{EventPublisher, OrderEvent};
use crate::record_store::{OrderStore, TicketStore, VersionedRecord};
use crate::types::{OrderId, TicketId, Timestamp, UserId};
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// A source of the current time.
///
/// The reservation window is a passive deadline checked lazily at
/// decision time, so the decision must be computable against an injected
/// clock rather than ambient wall time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// The production [`Clock`], backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Errors that can occur when constructing a [`ReservationConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationConfigError {
    /// The reservation window must be finite and positive.
    #[error("Reservation window must be positive, got {0}")]
    NonPositiveWindow(Duration),
}

/// Configuration for the reservation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationConfig {
    window: Duration,
}

impl ReservationConfig {
    /// Creates a configuration with the given reservation window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is zero or negative.
    pub fn new(window: Duration) -> Result<Self, ReservationConfigError> {
        if window <= Duration::zero() {
            return Err(ReservationConfigError::NonPositiveWindow(window));
        }
        Ok(Self { window })
    }

    /// Returns how long an unpaid reservation holds its ticket.
    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl Default for ReservationConfig {
    /// The platform default: 15 minutes.
    fn default() -> Self {
        Self {
            window: Duration::minutes(15),
        }
    }
}

/// The decision engine for ticket reservations.
///
/// One reservation attempt is handled per inbound call; there is no
/// global lock across tickets or orders. All mutation goes through the
/// record store's compare-and-swap `update`, so the only concurrency
/// discipline is optimistic retry-or-fail.
///
/// The requesting user's identity is always passed in explicitly; the
/// service never reads it from ambient context.
pub struct ReservationService<T, O, P> {
    tickets: T,
    orders: O,
    publisher: P,
    clock: Arc<dyn Clock>,
    config: ReservationConfig,
}

impl<T, O, P> ReservationService<T, O, P>
where
    T: TicketStore,
    O: OrderStore,
    P: EventPublisher,
{
    /// Creates a service using the system clock.
    pub fn new(tickets: T, orders: O, publisher: P, config: ReservationConfig) -> Self {
        Self::with_clock(tickets, orders, publisher, config, Arc::new(SystemClock))
    }

    /// Creates a service with an injected clock.
    pub fn with_clock(
        tickets: T,
        orders: O,
        publisher: P,
        config: ReservationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            orders,
            publisher,
            clock,
            config,
        }
    }

    /// Attempts to reserve a ticket for a user.
    ///
    /// On success the returned order is in `Created` status at version 0,
    /// with an expiration one reservation window in the future, and an
    /// `OrderCreated` event has been published.
    ///
    /// # Errors
    ///
    /// - [`OrderError::TicketNotFound`] if the ticket id does not resolve
    /// - [`OrderError::TicketAlreadyReserved`] if a blocking order exists,
    ///   or if a racing reservation won the store-level uniqueness check
    /// - [`OrderError::Publish`] if the order committed but the event
    ///   could not be handed to the transport; the committed order is
    ///   carried in the error
    #[instrument(skip(self), fields(ticket_id = %ticket_id, user_id = %user_id))]
    pub async fn reserve(&self, ticket_id: TicketId, user_id: UserId) -> OrderResult<Order> {
        if self.tickets.get(&ticket_id).await?.is_none() {
            debug!("ticket does not exist");
            return Err(OrderError::TicketNotFound(ticket_id));
        }

        let now = self.clock.now();
        let existing = self.orders.find_by_ticket(&ticket_id).await?;
        if let Some(blocking) = existing.iter().find(|order| order.is_blocking_at(now)) {
            warn!(
                order_id = %blocking.id(),
                status = %blocking.status(),
                "ticket is held by a blocking order"
            );
            return Err(OrderError::TicketAlreadyReserved(ticket_id));
        }

        let order = Order::new(ticket_id, user_id, now.plus(self.config.window()));
        let order = match self.orders.save(order).await {
            Ok(order) => order,
            Err(crate::errors::RecordStoreError::ActiveOrderExists { .. }) => {
                // A racing reservation slipped past the derived read and
                // won at insert time.
                warn!("lost reservation race at insert");
                return Err(OrderError::TicketAlreadyReserved(ticket_id));
            }
            Err(other) => return Err(other.into()),
        };

        info!(order_id = %order.id(), expires_at = %order.expires_at(), "ticket reserved");
        self.publish_committed(order, OrderEvent::created).await
    }

    /// Applies a validated status transition to an order.
    ///
    /// Invoked on behalf of external collaborators (payment service,
    /// expiration watcher); this core validates the transition but does
    /// not originate it. The write uses the version the caller last
    /// observed on `order`.
    ///
    /// # Errors
    ///
    /// - [`OrderError::InvalidTransition`] if the transition is not in
    ///   the allowed table; the order is left unchanged
    /// - [`OrderError::ConcurrencyConflict`] if the observed version is
    ///   stale; the caller must re-fetch and reconsider rather than
    ///   blindly retry, since the world may have changed
    /// - [`OrderError::Publish`] if the update committed but the event
    ///   could not be handed to the transport
    #[instrument(skip(self, order), fields(order_id = %order.id(), from = %order.status(), to = %new_status))]
    pub async fn transition(&self, order: Order, new_status: OrderStatus) -> OrderResult<Order> {
        let from = order.status();
        if !from.can_transition_to(new_status) {
            debug!("transition rejected by table");
            return Err(OrderError::InvalidTransition {
                from,
                to: new_status,
            });
        }

        let order_id = order.id();
        let updated = match self.orders.update(order.with_status(new_status)).await {
            Ok(order) => order,
            Err(crate::errors::RecordStoreError::VersionConflict { .. }) => {
                warn!("observed version is stale");
                return Err(OrderError::ConcurrencyConflict { order_id });
            }
            Err(other) => return Err(other.into()),
        };

        info!(version = %updated.version(), "order transitioned");
        self.publish_committed(updated, OrderEvent::status_changed)
            .await
    }

    /// Fetches an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::OrderNotFound`] if the id does not resolve.
    pub async fn get_order(&self, order_id: OrderId) -> OrderResult<Order> {
        self.orders
            .get(&order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// Lists all orders owned by a user, in creation order.
    pub async fn orders_for_user(&self, user_id: &UserId) -> OrderResult<Vec<Order>> {
        Ok(self.orders.find_by_user(user_id).await?)
    }

    /// Publishes the event for a committed order mutation.
    ///
    /// The commit stands regardless of the outcome; on failure the
    /// committed order rides along in the error so the caller can hand
    /// the event to the redelivery layer.
    async fn publish_committed(
        &self,
        order: Order,
        make_event: fn(&Order) -> OrderEvent,
    ) -> OrderResult<Order> {
        let event = make_event(&order);
        match self.publisher.publish(&event).await {
            Ok(()) => Ok(order),
            Err(source) => {
                error!(
                    order_id = %order.id(),
                    event_type = event.event_type(),
                    error = %source,
                    "event publish failed after commit"
                );
                Err(OrderError::Publish {
                    order: Box::new(order),
                    source,
                })
            }
        }
    }
}
