//! HTTP surface of the peer.
//!
//! Both applications are exposed side by side: the requesting application
//! under `/api/notifications`, the provider application under
//! `/api/provider` plus the `/api/signals` WebSocket.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;

#[cfg(test)]
mod tests;
