//! Livetable
//!
//! Live product table client for a GraphQL backend. Operations are routed to
//! an HTTP or WebSocket channel by kind, the table is rebuilt from every
//! snapshot the subscription pushes, and create/edit/delete go through a
//! single edit session.

pub mod config;
pub mod live_table;
pub mod manager;
pub mod observers;
pub mod prelude;
pub mod products;
pub mod session;
pub mod transport;
