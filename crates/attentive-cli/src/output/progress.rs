//! Replay progress on stderr, via indicatif when interactive.

use std::sync::atomic::{AtomicUsize, Ordering};

use attentive_core::analysis::AttentionEvent;
use attentive_core::{FrameRecord, ProgressEvent, ProgressSink};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames {msg}";

/// Progress reporter for replays.
///
/// With a bar, frames advance it and the current subject is shown beside it.
/// Without one, only degraded frames are reported, one line each.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
    failed: AtomicUsize,
}

impl ProgressBar {
    /// Creates a reporter.
    ///
    /// `total` sizes the bar when the frame count is known; otherwise a
    /// spinner is used. `quiet` silences everything.
    #[must_use]
    pub fn new(total: Option<u64>, quiet: bool, show_bar: bool) -> Self {
        let bar = (!quiet && show_bar).then(|| {
            let bar = total.map_or_else(IndicatifBar::new_spinner, IndicatifBar::new);
            if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self {
            bar,
            quiet,
            failed: AtomicUsize::new(0),
        }
    }

    fn report_failure(&self, record: &FrameRecord) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if self.bar.is_some() {
            return;
        }
        if let Some(error) = &record.result.error {
            eprintln!("{} @ {:.3}s: {error}", record.subject, record.timestamp);
        }
    }
}

impl ProgressSink for ProgressBar {
    #[allow(clippy::cast_possible_truncation)]
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Started {
                subject,
                index,
                total,
            } => {
                if let Some(bar) = &self.bar {
                    if let Some(t) = total {
                        bar.set_length(t as u64);
                    }
                    bar.set_position(index as u64);
                    bar.set_message(subject);
                }
            }
            ProgressEvent::Completed { record } => {
                if record.result.is_failure() {
                    self.report_failure(&record);
                }
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                }
            }
            ProgressEvent::Attention { subject, event } => {
                if let AttentionEvent::UnfocusedAlert { unfocused_for } = event {
                    let line = format!("ALERT: {subject} unfocused for {unfocused_for:.0}s");
                    match &self.bar {
                        Some(bar) => bar.println(line),
                        None => eprintln!("{line}"),
                    }
                }
            }
            ProgressEvent::Skipped { index, reason } => {
                let line = format!("WARN: Skipping frame {index}: {reason}");
                match &self.bar {
                    Some(bar) => {
                        bar.inc(1);
                        bar.println(line);
                    }
                    None => eprintln!("{line}"),
                }
            }
            ProgressEvent::Finished { processed, skipped } => {
                if let Some(bar) = &self.bar {
                    let failed = self.failed.load(Ordering::Relaxed);
                    bar.finish_with_message(format!(
                        "done: {processed} processed, {failed} failed, {skipped} skipped"
                    ));
                }
            }
        }
    }
}
