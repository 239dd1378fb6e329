//! Chrome process and connection manager.
//!
//! Launches Chrome with remote debugging and a persistent profile when none is
//! listening on the debug port, then hands out attached page sessions.

mod manager_core;
mod manager_pages;
mod manager_types;

pub use manager_core::BrowserManager;
pub use manager_types::{BrowserError, BrowserManagerConfig};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
