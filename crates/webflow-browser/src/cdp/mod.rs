//! Chrome DevTools Protocol (CDP) client implementation.
//!
//! A pure Rust CDP client: one websocket to the browser, multiplexed into
//! flattened per-page sessions.
//!
//! ## Usage
//!
//! 1. Start Chrome with remote debugging:
//!    ```bash
//!    chrome --remote-debugging-port=9222
//!    ```
//!
//! 2. Connect and automate:
//!    ```rust,ignore
//!    let client = CdpClient::connect("http://localhost:9222").await?;
//!    let page = client.new_page(None).await?;
//!    page.navigate("https://example.com").await?;
//!    ```

mod client;
mod error;
mod protocol;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
pub use session::{Navigation, PageSession};
