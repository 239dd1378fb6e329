//! `webflow inspect`: summarize a session file.

use std::path::Path;

use webflow_core::{SessionReader, SessionSummary};

pub(crate) async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let events = SessionReader::load(path).await?;
    let summary = SessionSummary::from_events(&events);
    print!("{}", render(path, &summary));
    Ok(())
}

fn render(path: &Path, summary: &SessionSummary) -> String {
    let mut out = format!("Session: {}\n", path.display());
    out.push_str(&format!("Events:  {}\n", summary.total));
    out.push_str(&format!(
        "Start:   {}\n",
        summary.start_url.as_deref().unwrap_or("(none)")
    ));
    let duration = summary.duration();
    out.push_str(&format!(
        "Length:  {}.{:03}s\n",
        duration.num_seconds(),
        duration.num_milliseconds() % 1000
    ));
    if summary.probes > 0 {
        out.push_str(&format!("Probes:  {}\n", summary.probes));
    }
    for (kind, count) in &summary.by_kind {
        out.push_str(&format!("  {:<12}{}\n", kind, count));
    }
    out
}
