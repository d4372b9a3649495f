use gpq_pipeline::{EventKind, JobHandle};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::output::OutputWriter;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner that draws nothing, for JSON output
pub fn hidden_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::hidden());
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Follow a job to completion.
///
/// Progress text drives the spinner, info text is printed as it arrives,
/// every other event is returned in order. Ctrl-C kills the job.
pub async fn follow<T>(
    mut handle: JobHandle<T>,
    spinner: &ProgressBar,
    output: &OutputWriter,
) -> anyhow::Result<(T, Vec<EventKind>)> {
    let mut events = Vec::new();
    let mut interrupted = false;
    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };
                match event.kind {
                    EventKind::Progress(message) => spinner.set_message(message),
                    EventKind::Info(message) => spinner.suspend(|| output.info(&message)),
                    other => events.push(other),
                }
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                handle.kill();
                spinner.set_message("Cancelling...");
            }
        }
    }
    let result = handle.join().await?;
    Ok((result, events))
}
