//! Core types for the `OrderCore` order-placement library.
//!
//! This module defines the fundamental types used throughout the library.
//! All types use smart constructors to ensure validity at construction time,
//! following the "parse, don't validate" principle.

use chrono::{DateTime, Utc};
use nutype::nutype;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A globally unique ticket identifier using UUIDv7 format.
///
/// `TicketId` values are guaranteed to be UUIDv7, which provides
/// time-based ordering and globally unique identification. Tickets are
/// created by the upstream catalog service; this core only ever re-uses
/// their ids.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new `TicketId` with the current timestamp.
    pub fn new() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() should always return a valid v7 UUID")
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

/// A globally unique order identifier using UUIDv7 format.
///
/// Like [`TicketId`], an `OrderId` is guaranteed to be UUIDv7 so that
/// orders sort in creation order.
#[nutype(
    validate(predicate = |id: &Uuid| id.get_version() == Some(uuid::Version::SortRand)),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new `OrderId` with the current timestamp.
    pub fn new() -> Self {
        Self::try_new(Uuid::now_v7()).expect("Uuid::now_v7() should always return a valid v7 UUID")
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

/// The identity of the user making a reservation.
///
/// The session layer that decodes authentication lives outside this core;
/// whatever identity it produces is passed in explicitly as a `UserId`,
/// never read from ambient context. The value is opaque here; it only has
/// to be non-empty and bounded.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct UserId(String);

/// The human-readable title of a ticket.
///
/// Guaranteed non-empty (after trimming) and at most 255 characters.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 255),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct TicketTitle(String);

/// The version of a mutable record.
///
/// Versions start at 0 for a freshly persisted record and increment by
/// exactly one on every successful update. The compare-and-swap discipline
/// in [`crate::record_store::RecordStore::update`] guarantees they never
/// decrease and never skip.
#[nutype(
    validate(greater_or_equal = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct RecordVersion(u64);

impl RecordVersion {
    /// Creates the initial version (0) assigned to a brand-new record.
    pub fn initial() -> Self {
        Self::try_new(0).expect("0 is always a valid version")
    }

    /// Returns the next version after this one.
    #[must_use]
    pub fn next(self) -> Self {
        let current: u64 = self.into();
        Self::try_new(current + 1).expect("next version should always be valid")
    }
}

/// A point in time, always UTC.
///
/// This wrapper ensures consistent timestamp handling throughout the system.
/// Reservation expirations are absolute `Timestamp`s compared against an
/// injected clock, never against ambient wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a new timestamp from a UTC `DateTime`.
    pub const fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Creates a timestamp representing the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying `DateTime`.
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Converts the timestamp into the underlying `DateTime`.
    pub const fn into_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Returns this timestamp shifted forward by `duration`.
    ///
    /// Saturates at the maximum representable `DateTime` rather than
    /// panicking on overflow.
    #[must_use]
    pub fn plus(self, duration: chrono::Duration) -> Self {
        Self(self.0.checked_add_signed(duration).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.into_datetime()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors that can occur when constructing a [`Price`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is negative, which is not allowed.
    #[error("Price cannot be negative: {0}")]
    Negative(Decimal),

    /// The amount has more than 2 decimal places.
    #[error("Price can only have up to 2 decimal places, got: {0}")]
    TooManyDecimalPlaces(Decimal),
}

/// The price of a ticket.
///
/// A `Price` is always non-negative and has at most 2 decimal places.
/// Pricing computation is out of scope for this core; prices are carried
/// verbatim from the catalog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Creates a new `Price` from a `Decimal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or has more than
    /// 2 decimal places.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() {
            return Err(PriceError::Negative(amount));
        }

        if amount.scale() > 2 {
            return Err(PriceError::TooManyDecimalPlaces(amount));
        }

        Ok(Self(amount))
    }

    /// Creates a `Price` from whole currency units (e.g. `100` = 100.00).
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Creates a `Price` from cents (e.g. `1234` = 12.34).
    pub fn from_cents(cents: u64) -> Self {
        Self(Decimal::from(cents) / dec!(100))
    }

    /// Returns the amount as a `Decimal`.
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns the amount in cents.
    pub fn to_cents(&self) -> u64 {
        (self.0 * dec!(100)).to_u64().unwrap_or(0)
    }

    /// The zero price.
    pub fn zero() -> Self {
        Self(dec!(0))
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
