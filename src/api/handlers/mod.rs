//! HTTP request handlers, one module per surface.

pub mod health;
pub mod notifications;
pub mod provider;
pub mod signals;
pub mod system;
