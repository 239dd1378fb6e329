//! BrowserManager core: connecting, launching and shutting down Chrome.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{BrowserError, BrowserManagerConfig};
use crate::cdp::{CdpClient, PageSession};

/// How long a freshly launched Chrome gets to open its debug port.
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(6);

const LAUNCH_POLL: Duration = Duration::from_millis(200);

/// Well-known install locations, checked before `PATH`.
#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(target_os = "linux")]
const INSTALL_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

#[cfg(target_os = "windows")]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const INSTALL_PATHS: &[&str] = &[];

/// Executable names looked up on `PATH`.
const PATH_NAMES: &[&str] = &["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];

/// Owns the CDP connection, the pages opened through it, and Chrome itself
/// when no browser was already listening on the debug port.
pub struct BrowserManager {
    pub(super) config: BrowserManagerConfig,
    pub(super) client: RwLock<Option<Arc<CdpClient>>>,
    pub(super) pages: RwLock<HashMap<String, Arc<PageSession>>>,
    pub(super) page_counter: AtomicU64,
    /// Set only when we launched Chrome ourselves.
    pub(super) chrome_process: RwLock<Option<Child>>,
}

impl BrowserManager {
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            pages: RwLock::new(HashMap::new()),
            page_counter: AtomicU64::new(0),
            chrome_process: RwLock::new(None),
        }
    }

    /// Locate a Chrome-family executable.
    pub fn find_chrome() -> Option<PathBuf> {
        let installed = INSTALL_PATHS.iter().map(PathBuf::from).find(|p| p.exists());
        installed.or_else(|| {
            let path = std::env::var_os("PATH")?;
            std::env::split_paths(&path)
                .flat_map(|dir| PATH_NAMES.iter().map(move |name| dir.join(name)))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Whether something answers CDP discovery on the debug port.
    pub(super) async fn debugger_listening(&self) -> bool {
        let url = format!("{}/json/version", self.config.endpoint());
        match reqwest::get(&url).await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("No debugger at {}: {}", url, e);
                false
            }
        }
    }

    async fn launch_chrome(&self) -> Result<Child, BrowserError> {
        let chrome_path = self
            .config
            .chrome_path
            .clone()
            .or_else(Self::find_chrome)
            .ok_or(BrowserError::ChromeNotFound)?;
        let profile_dir = self.config.get_profile_dir();
        if let Err(e) = std::fs::create_dir_all(&profile_dir) {
            warn!("Failed to create profile directory {}: {}", profile_dir.display(), e);
        }

        let child = Command::new(&chrome_path)
            .args(self.config.launch_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(format!("{}: {}", chrome_path.display(), e)))?;

        info!(
            pid = ?child.id(),
            profile = %profile_dir.display(),
            headless = self.config.headless,
            "Launched {}",
            chrome_path.display()
        );
        Ok(child)
    }

    async fn wait_for_debugger(&self) -> Result<(), BrowserError> {
        let deadline = tokio::time::Instant::now() + LAUNCH_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(LAUNCH_POLL).await;
            if self.debugger_listening().await {
                return Ok(());
            }
        }
        Err(BrowserError::LaunchFailed(format!(
            "debug port {} not open after {:?}",
            self.config.debug_port, LAUNCH_TIMEOUT
        )))
    }

    /// Connect to Chrome on the debug port, launching it first if nothing is
    /// listening. A no-op once connected.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_some() {
            return Ok(());
        }

        if self.debugger_listening().await {
            info!("Using the Chrome already listening on port {}", self.config.debug_port);
        } else {
            let child = self.launch_chrome().await?;
            *self.chrome_process.write().await = Some(child);
            self.wait_for_debugger().await?;
        }

        let client = CdpClient::connect(&self.config.endpoint()).await?;
        info!("Connected to {}", client.browser_ws_url());
        *self.client.write().await = Some(Arc::new(client));
        Ok(())
    }

    pub(super) async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// Drop the connection and forget open pages. Chrome keeps running.
    pub async fn close(&self) -> Result<(), BrowserError> {
        self.pages.write().await.clear();
        if self.client.write().await.take().is_some() {
            info!("Browser connection closed");
        }
        Ok(())
    }

    /// Close the connection and stop Chrome if we launched it.
    pub async fn shutdown_chrome(&self) -> Result<(), BrowserError> {
        self.close().await?;
        if let Some(mut child) = self.chrome_process.write().await.take() {
            info!("Stopping Chrome");
            if let Err(e) = child.kill().await {
                warn!("Failed to stop Chrome: {}", e);
            }
        }
        Ok(())
    }
}
