//! Integration tests for externally-driven order status transitions.
//!
//! The payment service and the expiration watcher drive orders through
//! their lifecycle by calling back into the core; these tests verify the
//! transition table, the optimistic-concurrency discipline on updates,
//! and the events announced for each committed transition.

use chrono::Duration;
use ordercore::record_store::{RecordStore, VersionedRecord};
use ordercore::{
    Order, OrderError, OrderStatus, Price, PublishError, ReservationConfig, ReservationService,
    Ticket, TicketTitle, Timestamp, UserId,
};
use ordercore_memory::{InMemoryEventPublisher, InMemoryOrderStore, InMemoryTicketStore};

type Service =
    ReservationService<InMemoryTicketStore, InMemoryOrderStore, InMemoryEventPublisher>;

struct Harness {
    tickets: InMemoryTicketStore,
    orders: InMemoryOrderStore,
    publisher: InMemoryEventPublisher,
    service: Service,
}

impl Harness {
    fn new() -> Self {
        let tickets = InMemoryTicketStore::new();
        let orders = InMemoryOrderStore::new();
        let publisher = InMemoryEventPublisher::new();
        let service = ReservationService::new(
            tickets.clone(),
            orders.clone(),
            publisher.clone(),
            ReservationConfig::default(),
        );
        Self {
            tickets,
            orders,
            publisher,
            service,
        }
    }

    /// Seeds a ticket and reserves it, returning the fresh order.
    async fn reserved_order(&self) -> Order {
        let ticket = self
            .tickets
            .save(Ticket::new(
                TicketTitle::try_new("title").unwrap(),
                Price::from_units(100),
            ))
            .await
            .unwrap();
        self.service
            .reserve(ticket.id(), user_id("user-1"))
            .await
            .unwrap()
    }
}

fn user_id(name: &str) -> UserId {
    UserId::try_new(name).unwrap()
}

#[tokio::test]
async fn payment_flow_walks_the_happy_path() {
    let harness = Harness::new();
    let order = harness.reserved_order().await;

    let awaiting = harness
        .service
        .transition(order, OrderStatus::AwaitingPayment)
        .await
        .unwrap();
    assert_eq!(awaiting.status(), OrderStatus::AwaitingPayment);
    assert_eq!(u64::from(awaiting.version()), 1);

    let complete = harness
        .service
        .transition(awaiting, OrderStatus::Complete)
        .await
        .unwrap();
    assert_eq!(complete.status(), OrderStatus::Complete);
    assert_eq!(u64::from(complete.version()), 2);

    let event_types: Vec<&str> = harness
        .publisher
        .published()
        .iter()
        .map(ordercore::OrderEvent::event_type)
        .collect();
    assert_eq!(
        event_types,
        vec!["OrderCreated", "OrderStatusChanged", "OrderStatusChanged"]
    );

    let versions: Vec<u64> = harness
        .publisher
        .published()
        .iter()
        .map(|event| event.payload().version.into())
        .collect();
    assert_eq!(versions, vec![0, 1, 2]);
}

#[tokio::test]
async fn cancelling_emits_order_cancelled_and_frees_the_ticket() {
    let harness = Harness::new();
    let order = harness.reserved_order().await;
    let ticket_id = order.ticket_id();

    let cancelled = harness
        .service
        .transition(order, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);

    let published = harness.publisher.published();
    assert_eq!(published.last().unwrap().event_type(), "OrderCancelled");
    assert_eq!(published.last().unwrap().payload().version, cancelled.version());

    // The ticket is reservable again.
    let reopened = harness.service.reserve(ticket_id, user_id("user-2")).await;
    assert!(reopened.is_ok());
}

#[tokio::test]
async fn payment_failure_cancels_from_awaiting_payment() {
    let harness = Harness::new();
    let order = harness.reserved_order().await;

    let awaiting = harness
        .service
        .transition(order, OrderStatus::AwaitingPayment)
        .await
        .unwrap();
    let cancelled = harness
        .service
        .transition(awaiting, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(u64::from(cancelled.version()), 2);
}

#[tokio::test]
async fn disallowed_transitions_are_rejected_and_mutate_nothing() {
    let allowed = [
        (OrderStatus::Created, OrderStatus::AwaitingPayment),
        (OrderStatus::Created, OrderStatus::Cancelled),
        (OrderStatus::AwaitingPayment, OrderStatus::Complete),
        (OrderStatus::AwaitingPayment, OrderStatus::Cancelled),
    ];

    for from in OrderStatus::ALL {
        for to in OrderStatus::ALL {
            if allowed.contains(&(from, to)) {
                continue;
            }

            let harness = Harness::new();
            // Seed an order directly in the source status; each pair gets
            // its own ticket so the uniqueness guarantee stays out of the
            // way.
            let order = harness
                .orders
                .save(
                    Order::new(
                        ordercore::TicketId::new(),
                        user_id("user-1"),
                        Timestamp::now().plus(Duration::minutes(15)),
                    )
                    .with_status(from),
                )
                .await
                .unwrap();
            let baseline_publishes = harness.publisher.publish_count();

            let result = harness.service.transition(order.clone(), to).await;
            assert!(
                matches!(
                    result,
                    Err(OrderError::InvalidTransition { from: f, to: t }) if f == from && t == to
                ),
                "transition {from} -> {to} must be rejected"
            );

            // The stored order is untouched and nothing was announced.
            let stored = harness.orders.get(&order.id()).await.unwrap().unwrap();
            assert_eq!(stored.status(), from);
            assert_eq!(stored.version(), order.version());
            assert_eq!(harness.publisher.publish_count(), baseline_publishes);
        }
    }
}

#[tokio::test]
async fn stale_observer_must_refetch_before_retrying() {
    let harness = Harness::new();
    let order = harness.reserved_order().await;

    // The payment service moves the order forward...
    harness
        .service
        .transition(order.clone(), OrderStatus::AwaitingPayment)
        .await
        .unwrap();

    // ...while the expiration watcher still holds the version-0 snapshot.
    let stale = harness.service.transition(order, OrderStatus::Cancelled).await;
    let order_id = match stale {
        Err(OrderError::ConcurrencyConflict { order_id }) => order_id,
        other => panic!("expected concurrency conflict, got {other:?}"),
    };

    // Stored state is what the winner wrote.
    let current = harness.service.get_order(order_id).await.unwrap();
    assert_eq!(current.status(), OrderStatus::AwaitingPayment);
    assert_eq!(u64::from(current.version()), 1);

    // After re-fetching, the reconsidered transition is valid.
    let cancelled = harness
        .service
        .transition(current, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(u64::from(cancelled.version()), 2);
}

#[tokio::test]
async fn expiration_watcher_cancels_an_overdue_created_order() {
    let harness = Harness::new();
    // Overdue from the start: the reservation window has already passed.
    let order = harness
        .orders
        .save(Order::new(
            ordercore::TicketId::new(),
            user_id("user-1"),
            Timestamp::now().plus(Duration::minutes(-5)),
        ))
        .await
        .unwrap();

    let cancelled = harness
        .service
        .transition(order, OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(
        harness.publisher.published().last().unwrap().event_type(),
        "OrderCancelled"
    );
}

#[tokio::test]
async fn transition_publish_failure_carries_the_committed_order() {
    let harness = Harness::new();
    let order = harness.reserved_order().await;

    harness
        .publisher
        .fail_with(PublishError::Timeout(std::time::Duration::from_secs(5)));
    let result = harness
        .service
        .transition(order, OrderStatus::AwaitingPayment)
        .await;

    let (order, source) = match result {
        Err(OrderError::Publish { order, source }) => (order, source),
        other => panic!("expected publish failure, got {other:?}"),
    };
    assert!(matches!(source, PublishError::Timeout(_)));
    assert_eq!(order.status(), OrderStatus::AwaitingPayment);

    // The update committed despite the failed announcement.
    let stored = harness.service.get_order(order.id()).await.unwrap();
    assert_eq!(stored.status(), OrderStatus::AwaitingPayment);
    assert_eq!(u64::from(stored.version()), 1);
}
