#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Routing between a new and a legacy implementation of the same operation.
//!
//! A [`MigrationSwitch`] owns the live [`MigrationConfig`] and publishes
//! immutable snapshots. A [`MigrationRouter`] reads one snapshot per call,
//! runs the selected implementation and falls back to legacy when the new
//! path fails and fallback is enabled. Every decision is described by a
//! [`RoutingDecision`], logged through `tracing` and optionally kept in a
//! [`RoutingJournal`].

mod config;
mod decision;
mod journal;
mod router;
mod switch;

pub use config::{ConfigError, MigrationConfig};
pub use decision::{Implementation, RoutingDecision};
pub use journal::{RoutingJournal, RoutingTally};
pub use router::MigrationRouter;
pub use switch::MigrationSwitch;
