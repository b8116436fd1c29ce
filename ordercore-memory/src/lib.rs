//! In-memory adapters for the `OrderCore` order-placement library.
//!
//! This crate provides in-memory implementations of the `RecordStore`
//! traits and the `EventPublisher` trait from the ordercore crate, useful
//! for testing and development scenarios where persistence and a real
//! message transport are not required.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use ordercore::errors::{PublishResult, RecordStoreError, RecordStoreResult};
use ordercore::publisher::{EventPublisher, OrderEvent};
use ordercore::record_store::{OrderStore, RecordStore, TicketStore, VersionedRecord};
use ordercore::reservation::{Clock, SystemClock};
use ordercore::types::{RecordVersion, TicketId, UserId};
use ordercore::{Order, PublishError, Ticket};

/// Thread-safe in-memory record store for testing.
///
/// Cloning shares the underlying storage, so a store handed to a service
/// and its clone held by a test observe the same records.
#[derive(Clone)]
pub struct InMemoryRecordStore<R>
where
    R: VersionedRecord,
{
    records: Arc<RwLock<HashMap<R::Id, R>>>,
}

impl<R> InMemoryRecordStore<R>
where
    R: VersionedRecord,
{
    /// Create a new empty in-memory record store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().expect("RwLock poisoned").len()
    }

    /// Returns whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R> Default for InMemoryRecordStore<R>
where
    R: VersionedRecord,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> RecordStore for InMemoryRecordStore<R>
where
    R: VersionedRecord,
{
    type Record = R;

    async fn get(&self, id: &R::Id) -> RecordStoreResult<Option<R>> {
        let records = self.records.read().expect("RwLock poisoned");

        Ok(records.get(id).cloned())
    }

    async fn save(&self, record: R) -> RecordStoreResult<R> {
        let mut records = self.records.write().expect("RwLock poisoned");

        let id = record.record_id();
        if records.contains_key(&id) {
            return Err(RecordStoreError::AlreadyExists { id: id.to_string() });
        }

        let stored = record.with_version(RecordVersion::initial());
        records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: R) -> RecordStoreResult<R> {
        let mut records = self.records.write().expect("RwLock poisoned");

        let id = record.record_id();
        let current = records
            .get(&id)
            .ok_or_else(|| RecordStoreError::NotFound { id: id.to_string() })?;

        if current.version() != record.version() {
            return Err(RecordStoreError::VersionConflict {
                id: id.to_string(),
                expected: record.version(),
                current: current.version(),
            });
        }

        let stored = record.with_version(current.version().next());
        records.insert(id, stored.clone());
        Ok(stored)
    }
}

/// Thread-safe in-memory ticket store for testing.
pub type InMemoryTicketStore = InMemoryRecordStore<Ticket>;

impl TicketStore for InMemoryTicketStore {}

/// Thread-safe in-memory order store for testing.
///
/// On top of the versioned CAS contract this store enforces the
/// per-ticket uniqueness guarantee: an insert is rejected while a
/// blocking order exists for the same ticket. The check runs inside the
/// write lock, so of two racing inserts exactly one wins. This is the
/// same serialization a production backend provides with a partial
/// unique index.
#[derive(Clone)]
pub struct InMemoryOrderStore {
    inner: InMemoryRecordStore<Order>,
    clock: Arc<dyn Clock>,
}

impl InMemoryOrderStore {
    /// Create a new empty in-memory order store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a new empty in-memory order store with an injected clock.
    ///
    /// Tests that advance a fake clock should hand the same clock to the
    /// store and the reservation service, so the uniqueness check and the
    /// reservability decision agree on what "now" means.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            clock,
        }
    }

    /// Returns the number of stored orders.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns whether the store holds no orders.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryOrderStore {
    type Record = Order;

    async fn get(&self, id: &<Order as VersionedRecord>::Id) -> RecordStoreResult<Option<Order>> {
        self.inner.get(id).await
    }

    async fn save(&self, record: Order) -> RecordStoreResult<Order> {
        let mut records = self.inner.records.write().expect("RwLock poisoned");

        let id = record.record_id();
        if records.contains_key(&id) {
            return Err(RecordStoreError::AlreadyExists { id: id.to_string() });
        }

        // Uniqueness check and insert under one write lock; this is the
        // serialization point for racing reservations.
        let now = self.clock.now();
        let blocked = records
            .values()
            .any(|existing| existing.ticket_id() == record.ticket_id() && existing.is_blocking_at(now));
        if blocked {
            return Err(RecordStoreError::ActiveOrderExists {
                ticket_id: record.ticket_id(),
            });
        }

        let stored = record.with_version(RecordVersion::initial());
        records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: Order) -> RecordStoreResult<Order> {
        self.inner.update(record).await
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_by_ticket(&self, ticket_id: &TicketId) -> RecordStoreResult<Vec<Order>> {
        let records = self.inner.records.read().expect("RwLock poisoned");

        let mut orders: Vec<Order> = records
            .values()
            .filter(|order| order.ticket_id() == *ticket_id)
            .cloned()
            .collect();
        // Order ids are UUIDv7, so id order is creation order.
        orders.sort_by_key(Order::id);
        Ok(orders)
    }

    async fn find_by_user(&self, user_id: &UserId) -> RecordStoreResult<Vec<Order>> {
        let records = self.inner.records.read().expect("RwLock poisoned");

        let mut orders: Vec<Order> = records
            .values()
            .filter(|order| order.user_id() == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(Order::id);
        Ok(orders)
    }
}

/// In-memory event publisher that records every published event.
///
/// Cloning shares the underlying buffer, so the handle given to a service
/// and the handle held by a test observe the same published events. A
/// failure can be injected to exercise the publish-failure contract.
#[derive(Clone, Default)]
pub struct InMemoryEventPublisher {
    published: Arc<RwLock<Vec<OrderEvent>>>,
    fail_with: Arc<RwLock<Option<PublishError>>>,
}

impl InMemoryEventPublisher {
    /// Create a new publisher with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event published so far, in publish order.
    pub fn published(&self) -> Vec<OrderEvent> {
        self.published.read().expect("RwLock poisoned").clone()
    }

    /// Returns how many events have been published.
    pub fn publish_count(&self) -> usize {
        self.published.read().expect("RwLock poisoned").len()
    }

    /// Makes every subsequent `publish` fail with the given error until
    /// cleared with [`clear_failure`](Self::clear_failure).
    pub fn fail_with(&self, error: PublishError) {
        *self.fail_with.write().expect("RwLock poisoned") = Some(error);
    }

    /// Clears an injected failure.
    pub fn clear_failure(&self) {
        *self.fail_with.write().expect("RwLock poisoned") = None;
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &OrderEvent) -> PublishResult<()> {
        if let Some(error) = self.fail_with.read().expect("RwLock poisoned").clone() {
            return Err(error);
        }

        self.published
            .write()
            .expect("RwLock poisoned")
            .push(event.clone());
        Ok(())
    }
}
