//! Versioned record store abstraction.
//!
//! This module defines the `RecordStore` port trait that every persistence
//! backend implements. The trait gives each mutable entity a monotonically
//! increasing version counter and compare-and-swap semantics on update; it
//! deliberately replaces any assumption of a shared database transaction,
//! which would not survive a multi-service deployment.

use crate::errors::RecordStoreResult;
use crate::order::Order;
use crate::ticket::Ticket;
use crate::types::{RecordVersion, TicketId, UserId};
use async_trait::async_trait;
use std::fmt::Display;
use std::hash::Hash;

/// A record whose mutations are guarded by a version counter.
///
/// Implementors expose their identity and current version, and can be
/// re-stamped with a new version by the store when persisted. Application
/// code never assigns versions itself; it reads them, and the store
/// advances them.
pub trait VersionedRecord: Clone + Send + Sync + 'static {
    /// The record's identifier type.
    type Id: Clone + Eq + Hash + Display + Send + Sync;

    /// Returns the record's identity.
    fn record_id(&self) -> Self::Id;

    /// Returns the version this record carried when it was read.
    fn version(&self) -> RecordVersion;

    /// Returns this record stamped with `version`. Used by stores when
    /// persisting; not intended for application code.
    #[must_use]
    fn with_version(self, version: RecordVersion) -> Self;
}

/// Persistence port with optimistic concurrency control.
///
/// Every higher-level mutation in this core goes through this trait. The
/// contract, which all backends must honor:
///
/// - [`get`](Self::get) resolves an id to the current record, or `None`.
/// - [`save`](Self::save) persists a brand-new record at version 0 and
///   fails with `AlreadyExists` if the id is already present.
/// - [`update`](Self::update) succeeds only if the stored version equals
///   the version the given record was read at, then persists it with
///   version+1. Otherwise it fails with `VersionConflict` and mutates
///   nothing. A conflicted writer must re-read and recompute its decision
///   from fresh state; resubmitting the same write is never correct.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The record type this store persists.
    type Record: VersionedRecord;

    /// Fetches the current state of a record by id.
    async fn get(
        &self,
        id: &<Self::Record as VersionedRecord>::Id,
    ) -> RecordStoreResult<Option<Self::Record>>;

    /// Persists a brand-new record, assigning it version 0.
    ///
    /// Returns the record as stored.
    async fn save(&self, record: Self::Record) -> RecordStoreResult<Self::Record>;

    /// Persists an update using compare-and-swap on the record's version.
    ///
    /// Returns the record as stored, carrying the incremented version.
    async fn update(&self, record: Self::Record) -> RecordStoreResult<Self::Record>;
}

/// Store for [`Ticket`] records.
///
/// Tickets are created and mutated by the upstream catalog service; from
/// this core's perspective they are read-only. The write half of the
/// contract exists so tests and local projections can seed tickets.
pub trait TicketStore: RecordStore<Record = Ticket> {}

/// Store for [`Order`] records.
///
/// In addition to the versioned CAS contract, an `OrderStore` must uphold
/// the platform's "no double booking" guarantee at insert time:
/// [`save`](RecordStore::save) MUST fail with `ActiveOrderExists` when a
/// blocking order (see [`Order::is_blocking_at`]) already exists for the
/// same ticket. Two racing reservation attempts can both pass the derived
/// reservability read; this constraint is what serializes them. A SQL
/// backend typically implements it as a partial unique index on the ticket
/// id filtered to non-terminal statuses.
#[async_trait]
pub trait OrderStore: RecordStore<Record = Order> {
    /// Returns all orders referencing the given ticket, in creation order.
    async fn find_by_ticket(&self, ticket_id: &TicketId) -> RecordStoreResult<Vec<Order>>;

    /// Returns all orders owned by the given user, in creation order.
    async fn find_by_user(&self, user_id: &UserId) -> RecordStoreResult<Vec<Order>>;
}
