//! Integration tests for `OrderCore`
//!
//! This crate contains integration tests that verify the interaction
//! between the core library and the in-memory adapters (reservation
//! flows, transition flows, and concurrency properties).

// This is a test-only crate
#![cfg(test)]
