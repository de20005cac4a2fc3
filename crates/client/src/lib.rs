//! Network side of the Shelfwatch dashboard.
//!
//! REST access to the detection backend, the Socket.IO push channel with
//! reconnection, the concurrent detail merger, and the [`dashboard`]
//! controller that ties them to a presenter.

pub mod api;
pub mod bridge;
pub mod dashboard;
pub mod events;
pub mod merger;
pub mod messages;
pub mod presenter;
pub mod push;
pub mod reconnect;
