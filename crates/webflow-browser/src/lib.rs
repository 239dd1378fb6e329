//! Chrome DevTools Protocol driver for webflow.
//!
//! Records a real browser session into raw occurrences and replays recorded
//! sessions against a live page.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐    WebSocket     ┌──────────────────┐
//! │  BrowserManager  │ ◄──────────────► │   Chrome/Edge    │
//! │  CdpEngine       │       CDP        │  recorder.js     │
//! │  CdpRecorder     │ ◄─ bindingCalled │  locator.js      │
//! └──────────────────┘                  └──────────────────┘
//! ```
//!
//! ## Setup
//!
//! [`BrowserManager`] connects to Chrome on the configured debug port and
//! launches it with a persistent profile if nothing is listening:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222 --user-data-dir=~/.webflow/browser-profile
//! ```
//!
//! ## Pieces
//!
//! - [`cdp`]: WebSocket client, page sessions, protocol types
//! - [`CdpEngine`]: the [`webflow_core::AutomationEngine`] replay drives
//! - [`CdpRecorder`]: installs the in-page recorder and forwards its payloads
//!   to the capture pipeline

pub mod cdp;
pub mod driver;
pub mod manager;
pub mod recorder;

pub use cdp::{CdpClient, CdpError, PageSession};
pub use driver::CdpEngine;
pub use manager::{BrowserError, BrowserManager, BrowserManagerConfig};
pub use recorder::{CdpRecorder, BRIDGE_BINDING};
