//! Terminal dashboard for shelf-detection events.
//!
//! [`config`] reads the environment; [`console`] renders the dashboard and
//! reads commands and confirmations from stdin.

pub mod config;
pub mod console;
