use std::time::Duration;

use asnscope_common::event::Event;
use asnscope_core::scanner::tracker::Snapshot;
use colored::*;
use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::terminal::colors;

const TEMPLATE: &str =
    "{spinner:.blue} [{bar:32.green/black}] {pos}/{len} targets ({percent}%) {msg} • {elapsed_precise}";

/// Drives the progress bar attached to the scan span.
pub struct ProgressView {
    span: Span,
    prefixes: (usize, usize),
    paused: bool,
}

impl ProgressView {
    pub fn new(span: Span) -> Self {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
            .tick_strings(&[
                "▁▁▁▁▁",
                "▁▂▂▂▁",
                "▁▄▂▄▁",
                "▂▄▆▄▂",
                "▄▆█▆▄",
                "▂▄▆▄▂",
                "▁▄▂▄▁",
                "▁▂▂▂▁",
            ]);
        span.pb_set_style(&style);
        span.pb_set_length(0);
        span.pb_start();

        Self {
            span,
            prefixes: (0, 0),
            paused: false,
        }
    }

    /// Folds a counter event into the bar. Log events are ignored.
    pub fn apply(&mut self, event: &Event) {
        match *event {
            Event::Progress { completed, total } => {
                self.span.pb_set_length(total as u64);
                self.span.pb_set_position(completed as u64);
            }
            Event::PrefixCounter { processed, total } => {
                self.prefixes = (processed, total);
            }
            Event::Log { .. } => {}
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn refresh(&self, snapshot: &Snapshot) {
        self.span
            .pb_set_message(&status_message(self.prefixes, snapshot.eta(), self.paused));
    }
}

fn status_message(prefixes: (usize, usize), eta: Duration, paused: bool) -> String {
    let (processed, total) = prefixes;
    let prefixes = format!("{processed}/{total} prefixes").color(colors::SECONDARY);

    if paused {
        return format!("{prefixes} • {}", "paused".color(colors::WARNING).bold());
    }

    format!("{prefixes} • ETA {}", format_duration(eta))
}

/// `HH:MM:SS`, the same shape indicatif uses for elapsed time.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
