//! Pure domain logic for the Shelfwatch detection dashboard.
//!
//! Event records and their merge rules, pagination, the feedback gate,
//! the in-memory event collection, optimistic upload handling and the
//! render snapshots consumed by presenters. Nothing here performs I/O.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod gate;
pub mod merge;
pub mod optimistic;
pub mod pagination;
pub mod state;
pub mod summary;
pub mod time;
pub mod types;
pub mod view;
pub mod wire;
