//! papertrader — deterministic trading strategy backtester.
//!
//! Replays historical daily price series through a configurable strategy and
//! produces a reconciled financial ledger of the outcome.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
