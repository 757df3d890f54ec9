//! Command handlers for CLI operations

pub mod register;
pub mod serve;

pub use register::RegisterCommandHandler;
pub use serve::ServeCommandHandler;
