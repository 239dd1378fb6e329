//! Configuration schema definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Browser process and viewport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Profile directory; defaults to `~/.webflow/browser-profile`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<PathBuf>,

    /// Explicit Chrome executable; auto-detected when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            profile_dir: None,
            chrome_path: None,
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_viewport_width() -> u32 {
    1600
}

fn default_viewport_height() -> u32 {
    900
}

/// Capture-side configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Start URL for a recording.
    #[serde(default)]
    pub url: String,

    /// Directory receiving `session-*.jsonl` files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Fill configured credentials after the first navigation.
    #[serde(default = "default_true")]
    pub autofill: bool,

    /// Redact identity fields (username/email) in addition to secrets.
    #[serde(default = "default_true")]
    pub redact_identity: bool,

    /// Number of leading events echoed to the log.
    #[serde(default = "default_echo_first")]
    pub echo_first: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            output_dir: default_output_dir(),
            autofill: true,
            redact_identity: true,
            echo_first: default_echo_first(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("recordings")
}

fn default_echo_first() -> usize {
    3
}

/// Credentials used for autofill and for re-inferring redacted inputs.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Explicit selector for the identity field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_selector: Option<String>,

    /// Explicit selector for the secret field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_selector: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("identity", &self.identity)
            .field("secret", &self.secret.as_ref().map(|_| "<hidden>"))
            .field("identity_selector", &self.identity_selector)
            .field("secret_selector", &self.secret_selector)
            .finish()
    }
}

/// Replay pacing, waiting and retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Speed multiplier: 1.0 = real time, 2.0 = twice as fast.
    #[serde(default = "default_timescale")]
    pub timescale: f64,

    /// Longest recorded gap replayed verbatim.
    #[serde(default = "default_max_gap_ms")]
    pub max_gap_ms: u64,

    #[serde(default = "default_true")]
    pub use_timestamp_pacing: bool,

    /// Visibility wait per locator candidate.
    #[serde(default = "default_candidate_timeout_ms")]
    pub candidate_timeout_ms: u64,

    #[serde(default = "default_settle_timeout_ms")]
    pub url_change_timeout_ms: u64,

    #[serde(default = "default_settle_timeout_ms")]
    pub network_idle_timeout_ms: u64,

    #[serde(default = "default_settle_timeout_ms")]
    pub dom_ready_timeout_ms: u64,

    #[serde(default = "default_post_click_delay_ms")]
    pub post_click_delay_ms: u64,

    /// Extra delay after every step.
    #[serde(default)]
    pub step_delay_ms: u64,

    #[serde(default = "default_true")]
    pub autofill_on_navigation: bool,

    /// Seconds the browser stays open after the last step.
    #[serde(default = "default_final_pause_secs")]
    pub final_pause_secs: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            timescale: default_timescale(),
            max_gap_ms: default_max_gap_ms(),
            use_timestamp_pacing: true,
            candidate_timeout_ms: default_candidate_timeout_ms(),
            url_change_timeout_ms: default_settle_timeout_ms(),
            network_idle_timeout_ms: default_settle_timeout_ms(),
            dom_ready_timeout_ms: default_settle_timeout_ms(),
            post_click_delay_ms: default_post_click_delay_ms(),
            step_delay_ms: 0,
            autofill_on_navigation: true,
            final_pause_secs: default_final_pause_secs(),
        }
    }
}

fn default_timescale() -> f64 {
    1.0
}

fn default_max_gap_ms() -> u64 {
    1500
}

fn default_candidate_timeout_ms() -> u64 {
    3000
}

fn default_settle_timeout_ms() -> u64 {
    8000
}

fn default_post_click_delay_ms() -> u64 {
    250
}

fn default_final_pause_secs() -> u64 {
    15
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
