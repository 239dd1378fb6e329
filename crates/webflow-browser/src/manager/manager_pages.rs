//! BrowserManager page management.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::debug;

use super::{BrowserError, BrowserManager};
use crate::cdp::PageSession;

impl BrowserManager {
    /// Open a blank page sized to the configured viewport.
    ///
    /// The page starts at `about:blank` so callers can install scripts before
    /// the first real navigation.
    pub async fn new_page(&self) -> Result<(String, Arc<PageSession>), BrowserError> {
        self.connect().await?;
        let client = self.client().await?;

        let session = client.new_page(Some("about:blank")).await?;
        session
            .set_viewport(self.config.viewport_width, self.config.viewport_height)
            .await?;
        let session = Arc::new(session);

        let page_id = format!("page_{}", self.page_counter.fetch_add(1, Ordering::Relaxed) + 1);

        self.pages
            .write()
            .await
            .insert(page_id.clone(), session.clone());

        debug!("Created page {}", page_id);
        Ok((page_id, session))
    }

    /// Close a page.
    pub async fn close_page(&self, page_id: &str) -> Result<(), BrowserError> {
        let session = self.pages.write().await.remove(page_id);
        if let Some(session) = session {
            let client = self.client().await?;
            client.close_page(&session).await?;
        }
        debug!("Closed page {}", page_id);
        Ok(())
    }
}
