//! Config sections mapped onto library types.

use std::time::Duration;

use webflow_browser::BrowserManagerConfig;
use webflow_config::{BrowserConfig, CredentialsConfig, ReplayConfig};
use webflow_core::{Credentials, ReplayOptions};

pub(crate) fn manager_config(browser: &BrowserConfig) -> BrowserManagerConfig {
    BrowserManagerConfig {
        debug_port: browser.debug_port,
        viewport_width: browser.viewport_width,
        viewport_height: browser.viewport_height,
        profile_dir: browser.profile_dir.clone(),
        chrome_path: browser.chrome_path.clone(),
        headless: browser.headless,
    }
}

pub(crate) fn replay_options(replay: &ReplayConfig) -> ReplayOptions {
    ReplayOptions {
        timescale: replay.timescale,
        max_gap: Duration::from_millis(replay.max_gap_ms),
        pacing: replay.use_timestamp_pacing,
        candidate_timeout: Duration::from_millis(replay.candidate_timeout_ms),
        url_change_timeout: Duration::from_millis(replay.url_change_timeout_ms),
        network_idle_timeout: Duration::from_millis(replay.network_idle_timeout_ms),
        dom_ready_timeout: Duration::from_millis(replay.dom_ready_timeout_ms),
        post_click_delay: Duration::from_millis(replay.post_click_delay_ms),
        step_delay: Duration::from_millis(replay.step_delay_ms),
        autofill_on_navigation: replay.autofill_on_navigation,
    }
}

/// Blank values count as unset.
pub(crate) fn credentials(config: &CredentialsConfig) -> Credentials {
    let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
    let mut credentials = Credentials::new(present(&config.identity), present(&config.secret));
    credentials.identity_selector = present(&config.identity_selector);
    credentials.secret_selector = present(&config.secret_selector);
    credentials
}
