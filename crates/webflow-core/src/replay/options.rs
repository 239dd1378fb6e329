//! Replay tunables.

use std::time::Duration;

/// Timing and behavior knobs for a replay run.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Speed multiplier; 2.0 replays twice as fast.
    pub timescale: f64,
    /// Longest recorded gap honored between two events.
    pub max_gap: Duration,
    /// Follow recorded timing. When off, steps run back to back.
    pub pacing: bool,
    /// Visibility wait for each locator candidate.
    pub candidate_timeout: Duration,
    pub url_change_timeout: Duration,
    pub network_idle_timeout: Duration,
    pub dom_ready_timeout: Duration,
    /// Pause after every click.
    pub post_click_delay: Duration,
    /// Extra pause after every step.
    pub step_delay: Duration,
    /// Run autofill after recorded `nav` events. The start page is always autofilled.
    pub autofill_on_navigation: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            timescale: 1.0,
            max_gap: Duration::from_millis(1500),
            pacing: true,
            candidate_timeout: Duration::from_millis(3000),
            url_change_timeout: Duration::from_millis(8000),
            network_idle_timeout: Duration::from_millis(8000),
            dom_ready_timeout: Duration::from_millis(8000),
            post_click_delay: Duration::from_millis(250),
            step_delay: Duration::ZERO,
            autofill_on_navigation: true,
        }
    }
}
