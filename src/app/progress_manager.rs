//! Progress bar and summary presentation for download runs.

use csv_downloader_core::{BatchSummary, ProgressEvent, ProgressSink, SummarySink};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Drives an indicatif progress bar from engine progress events.
///
/// Hidden when the terminal cannot show it; events are still counted so
/// the bar's position stays correct either way.
pub(crate) struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub(crate) fn new(visible: bool, total: usize) -> Self {
        let total = u64::try_from(total).unwrap_or(u64::MAX);
        let bar = if visible {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        bar.set_length(total);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> u64 {
        self.bar.position()
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressBarSink {
    fn on_progress(&self, event: &ProgressEvent) {
        self.bar
            .set_position(u64::try_from(event.completed).unwrap_or(u64::MAX));
        self.bar.set_message(event.last_url.clone());
    }
}

/// Prints the human-readable report to stdout.
pub(crate) struct TextSummarySink;

impl SummarySink for TextSummarySink {
    fn on_summary(&self, summary: &BatchSummary) {
        println!("{}", summary.report());
    }
}

/// Prints the summary as pretty JSON to stdout.
pub(crate) struct JsonSummarySink;

impl SummarySink for JsonSummarySink {
    fn on_summary(&self, summary: &BatchSummary) {
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{json}"),
            Err(error) => warn!(error = %error, "could not serialize summary"),
        }
    }
}
