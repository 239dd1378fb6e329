//! `webflow replay`: drive a browser through a recorded session.

use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use webflow_browser::{BrowserManager, CdpEngine};
use webflow_config::Config;
use webflow_core::{Replayer, SessionReader, SessionSummary};

use crate::options;

/// Shortest final pause with `--keep-open`.
const KEEP_OPEN_SECS: u64 = 60;

pub(crate) async fn run(
    config: Config,
    path: &Path,
    timescale: Option<f64>,
    keep_open: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let events = SessionReader::load(path).await?;
    let summary = SessionSummary::from_events(&events);
    info!(
        events = summary.total,
        start = summary.start_url.as_deref().unwrap_or("-"),
        "Loaded {}",
        path.display()
    );

    let mut replay_options = options::replay_options(&config.replay);
    if let Some(timescale) = timescale {
        if !(timescale.is_finite() && timescale > 0.0) {
            return Err(format!("--timescale must be positive, got {timescale}").into());
        }
        replay_options.timescale = timescale;
    }

    let manager = BrowserManager::new(options::manager_config(&config.browser));
    let (page_id, page) = manager.new_page().await?;
    let engine = CdpEngine::new(page).await?;

    let cancel = CancellationToken::new();
    let on_signal = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Stopping replay after the current step");
                cancel.cancel();
            }
        }
    });

    let mut replayer = Replayer::new(&engine, replay_options)
        .with_credentials(options::credentials(&config.credentials))
        .with_cancellation(cancel.clone());
    let report = replayer.run(&events).await?;

    info!(
        total = report.total,
        performed = report.performed,
        informational = report.informational,
        skipped = report.skipped.len(),
        cancelled = report.cancelled,
        "Replay finished"
    );
    for step in &report.skipped {
        warn!(index = step.index, kind = ?step.kind, "Skipped: {}", step.reason);
    }

    let mut pause = config.replay.final_pause_secs;
    if keep_open {
        pause = pause.max(KEEP_OPEN_SECS);
    }
    if pause > 0 && !cancel.is_cancelled() {
        info!("Keeping the browser open for {}s (Ctrl-C to close)", pause);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(pause)) => {}
            _ = cancel.cancelled() => {}
        }
    }
    on_signal.abort();

    drop(replayer);
    drop(engine);
    if let Err(e) = manager.close_page(&page_id).await {
        warn!("Could not close page: {}", e);
    }
    manager.shutdown_chrome().await?;
    Ok(())
}
