//! Sensorpay Types - Canonical domain types for the device-data settlement layer
//!
//! This crate contains all foundational types for sensorpay with zero
//! dependencies on other sensorpay crates:
//!
//! - Identity types (`AccountId`, `DeviceId`)
//! - Plain unsigned `Amount` for custodial balances
//! - The `Event` notification model and the append-only `EventLog`
//!
//! # Architectural Invariants
//!
//! These types support the core sensorpay invariants:
//!
//! 1. Balances are never negative (all arithmetic is checked)
//! 2. A device id maps to at most one holder at a time
//! 3. Events are appended only after a mutation has fully applied

pub mod amount;
pub mod device;
pub mod event;
pub mod identity;

pub use amount::*;
pub use device::*;
pub use event::*;
pub use identity::*;
