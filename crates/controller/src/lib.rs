//! Force-feedback host controller for classic-protocol wheels.
//!
//! Turns asynchronous force requests into a bounded, fail-safe stream of
//! hardware commands: magnitude clamping, keep-alive resends against
//! device-side force decay, and a watchdog that returns the wheel to neutral
//! when the upstream requester goes silent.
//!
//! All mutable state lives in one [`ForceController`] value driven from a
//! single tokio task ([`host::run`]); commands and ticks are serialized onto
//! that task, so no locking is needed.

pub mod command;
pub mod config;
pub mod controller;
pub mod host;

pub use command::{ForceCommand, parse_command};
pub use config::HostConfig;
pub use controller::ForceController;
