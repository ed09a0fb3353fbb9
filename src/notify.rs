use crate::app::RunSummary;

/// Desktop notification for a run that just reached `completed`.
#[cfg(feature = "desktop-notify")]
pub fn send_desktop(run: &RunSummary) {
    use notify_rust::{Notification, Urgency};

    let (summary, icon, urgency) = match run.result.as_deref() {
        Some("succeeded") => ("Pipeline Passed", "dialog-information", Urgency::Normal),
        Some("failed") => ("Pipeline Failed", "dialog-error", Urgency::Critical),
        _ => ("Pipeline Finished", "dialog-information", Urgency::Normal),
    };

    if let Err(e) = Notification::new()
        .summary(summary)
        .body(&notification_body(run))
        .icon(icon)
        .urgency(urgency)
        .show()
    {
        tracing::warn!("desktop notification failed: {e}");
    }
}

#[cfg(not(feature = "desktop-notify"))]
pub fn send_desktop(_run: &RunSummary) {}

pub fn notification_body(run: &RunSummary) -> String {
    match run.result.as_deref() {
        Some("succeeded" | "failed") | None => run.title.clone(),
        Some(other) => format!("{} ({other})", run.title),
    }
}
