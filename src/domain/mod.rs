//! Core domain types and logic.
//!
//! The decision core is [`signal`], [`position`], [`ledger`] and [`metrics`]:
//! pure code with no I/O. [`simulation`] and [`live`] drive it.

pub mod ohlcv;
pub mod signal;
pub mod position;
pub mod ledger;
pub mod metrics;
pub mod simulation;
pub mod live;
pub mod config;
pub mod config_validation;
pub mod error;
