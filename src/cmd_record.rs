//! `webflow record`: capture a live browser session into a session file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use webflow_browser::{BrowserManager, CdpEngine, CdpRecorder, PageSession};
use webflow_config::Config;
use webflow_core::{
    autofill, AutomationEngine, CapturePipeline, EngineError, EventKind, EventPayload,
    PageCondition, SessionWriter,
};

use crate::options;

pub(crate) async fn run(
    config: Config,
    url: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = url.unwrap_or_else(|| config.recording.url.clone());
    if url.trim().is_empty() {
        return Err("No start URL: pass --url or set recording.url".into());
    }
    let output_dir = output.unwrap_or_else(|| config.recording.output_dir.clone());

    let writer = SessionWriter::create(&output_dir).await?;
    let path = writer.path().to_path_buf();
    info!("Recording to {}", path.display());

    let pipeline = Arc::new(
        CapturePipeline::new(writer, config.recording.redact_identity)
            .with_echo(config.recording.echo_first),
    );
    pipeline.bus().subscribe([EventKind::Nav], |event| {
        if let EventPayload::Nav { to_url: Some(to), .. } = &event.payload {
            info!(reason = event.reason().unwrap_or("user"), "Page: {}", to);
        }
    });

    let manager = BrowserManager::new(options::manager_config(&config.browser));
    let (page_id, page) = manager.new_page().await?;

    // The recorder goes in before the first navigation so the start page is captured.
    let (payloads_tx, payloads_rx) = mpsc::unbounded_channel();
    let recorder = CdpRecorder::install(page.clone(), payloads_tx).await?;

    let cancel = CancellationToken::new();
    let mut capture = tokio::spawn({
        let pipeline = pipeline.clone();
        let cancel = cancel.clone();
        async move { pipeline.run(payloads_rx, cancel).await }
    });

    let engine = CdpEngine::new(page.clone()).await?;
    let settle = Duration::from_millis(config.replay.dom_ready_timeout_ms);
    match engine.navigate(&url, PageCondition::DomReady, settle).await {
        Ok(()) => {}
        Err(EngineError::Timeout(message)) => warn!("Start page still loading: {}", message),
        Err(e) => return Err(e.into()),
    }

    log_frames(&page).await;
    match recorder.probe().await {
        Ok(true) => info!("Capture bridge is live"),
        Ok(false) => warn!("Capture bridge not reachable yet; the page will buffer events"),
        Err(e) => warn!("Capture probe failed: {}", e),
    }

    if config.recording.autofill {
        let credentials = options::credentials(&config.credentials);
        if !credentials.is_empty() {
            match autofill(&engine, &credentials).await {
                Ok(filled) if filled.any() => {
                    info!(identity = filled.identity, secret = filled.secret, "Autofilled credentials");
                }
                Ok(_) => debug!("No credential fields on the start page"),
                Err(e) => warn!("Autofill failed: {}", e),
            }
        }
    }

    info!("Recording {}; press Ctrl-C to stop", url);
    let ended = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
        result = &mut capture => Some(result),
    };

    let result = match ended {
        Some(result) => {
            warn!("Browser went away; capture ended");
            result
        }
        None => {
            info!("Stopping capture");
            if let Err(e) = recorder.stop().await {
                warn!("Recorder did not stop cleanly: {}", e);
            }
            cancel.cancel();
            capture.await
        }
    };
    let written = result??;

    if let Err(e) = manager.close_page(&page_id).await {
        debug!("Page already closed: {}", e);
    }
    manager.shutdown_chrome().await?;

    info!(events = written, "Session saved to {}", path.display());
    Ok(())
}

async fn log_frames(page: &PageSession) {
    match page.frame_tree().await {
        Ok(frames) => {
            for frame in frames {
                info!(
                    frame = %frame.id,
                    parent = frame.parent_id.as_deref().unwrap_or("-"),
                    "Frame {}",
                    frame.url
                );
            }
        }
        Err(e) => debug!("Could not read frame tree: {}", e),
    }
}
