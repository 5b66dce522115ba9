//! Aggregate download progress
//!
//! Each download reports its own byte counts on an unbounded channel. A
//! single reporter task folds them into one percentage and renders it.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Response headers arrived; `total` is the declared content length
    Started { id: usize, total: Option<u64> },
    Advanced { id: usize, bytes: u64 },
    Finished { id: usize },
}

#[derive(Debug, Default, Clone, Copy)]
struct ItemProgress {
    total: Option<u64>,
    received: u64,
}

/// Running totals over every download in the batch.
#[derive(Debug, Default, Clone)]
pub struct AggregateProgress {
    items: HashMap<usize, ItemProgress>,
    finished: usize,
}

impl AggregateProgress {
    pub fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { id, total } => {
                self.items.entry(id).or_default().total = total;
            }
            ProgressEvent::Advanced { id, bytes } => {
                self.items.entry(id).or_default().received += bytes;
            }
            ProgressEvent::Finished { .. } => self.finished += 1,
        }
    }

    /// Percentage over the items whose size is known. `None` while no item
    /// has declared a size.
    pub fn percentage(&self) -> Option<f64> {
        let (received, total) = self
            .items
            .values()
            .filter_map(|item| item.total.map(|total| (item.received.min(total), total)))
            .fold((0u64, 0u64), |(r, t), (received, total)| (r + received, t + total));

        if total == 0 {
            return None;
        }
        Some(received as f64 / total as f64 * 100.0)
    }

    pub fn bytes_received(&self) -> u64 {
        self.items.values().map(|item| item.received).sum()
    }

    pub fn finished(&self) -> usize {
        self.finished
    }
}

/// Renders the aggregate of a batch on a progress bar.
pub struct ProgressReporter {
    handle: JoinHandle<AggregateProgress>,
}

impl ProgressReporter {
    pub fn spawn(expected_items: usize) -> (ProgressSender, Self) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bar = create_progress_bar(expected_items);

        let handle = tokio::spawn(async move {
            let mut aggregate = AggregateProgress::default();
            let mut colour = rainbow_colour(0.0);
            while let Some(event) = rx.recv().await {
                aggregate.apply(event);
                if let Some(percentage) = aggregate.percentage() {
                    let next = rainbow_colour(percentage);
                    if next != colour {
                        colour = next;
                        bar.set_style(bar_style(colour));
                    }
                    bar.set_position(percentage.floor() as u64);
                }
                bar.set_message(format!("{}/{} files", aggregate.finished(), expected_items));
            }
            bar.finish();
            aggregate
        });

        (tx, Self { handle })
    }

    /// Waits for every sender to be dropped and returns the final totals.
    pub async fn finish(self) -> AggregateProgress {
        self.handle.await.unwrap_or_default()
    }
}

const RAINBOW: [&str; 5] = ["red", "yellow", "green", "blue", "magenta"];

/// Bar colour at `percentage`. The range is cut into four equal sections
/// coloured red, yellow, green and blue; a complete bar is magenta.
pub fn rainbow_colour(percentage: f64) -> &'static str {
    let section_width = 100.0 / (RAINBOW.len() - 1) as f64;
    let section = (percentage.clamp(0.0, 100.0) / section_width).floor() as usize;
    RAINBOW[section.min(RAINBOW.len() - 1)]
}

fn bar_style(colour: &str) -> ProgressStyle {
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{wide_bar:.{}.bold}}] {{pos:>3}}% {{msg}}",
        colour
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn create_progress_bar(expected_items: usize) -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(bar_style(rainbow_colour(0.0)));
    bar.set_message(format!("0/{} files", expected_items));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_unknown_without_totals() {
        let mut progress = AggregateProgress::default();
        progress.apply(ProgressEvent::Started { id: 0, total: None });
        progress.apply(ProgressEvent::Advanced { id: 0, bytes: 512 });

        assert_eq!(progress.percentage(), None);
        assert_eq!(progress.bytes_received(), 512);
    }

    #[test]
    fn test_percentage_aggregates_known_totals() {
        let mut progress = AggregateProgress::default();
        progress.apply(ProgressEvent::Started { id: 0, total: Some(100) });
        progress.apply(ProgressEvent::Started { id: 1, total: Some(300) });
        progress.apply(ProgressEvent::Started { id: 2, total: None });
        progress.apply(ProgressEvent::Advanced { id: 0, bytes: 50 });
        progress.apply(ProgressEvent::Advanced { id: 1, bytes: 150 });
        progress.apply(ProgressEvent::Advanced { id: 2, bytes: 9999 });

        assert_eq!(progress.percentage(), Some(50.0));
        assert_eq!(progress.bytes_received(), 10199);
    }

    #[test]
    fn test_overshoot_is_capped_per_item() {
        let mut progress = AggregateProgress::default();
        progress.apply(ProgressEvent::Started { id: 0, total: Some(10) });
        progress.apply(ProgressEvent::Advanced { id: 0, bytes: 25 });

        assert_eq!(progress.percentage(), Some(100.0));
    }

    #[test]
    fn test_finished_count() {
        let mut progress = AggregateProgress::default();
        progress.apply(ProgressEvent::Finished { id: 0 });
        progress.apply(ProgressEvent::Finished { id: 1 });
        assert_eq!(progress.finished(), 2);
    }

    #[test]
    fn test_rainbow_sections() {
        assert_eq!(rainbow_colour(0.0), "red");
        assert_eq!(rainbow_colour(24.9), "red");
        assert_eq!(rainbow_colour(25.0), "yellow");
        assert_eq!(rainbow_colour(60.0), "green");
        assert_eq!(rainbow_colour(99.9), "blue");
        assert_eq!(rainbow_colour(100.0), "magenta");
        assert_eq!(rainbow_colour(250.0), "magenta");
    }

    #[test]
    fn test_bar_style_templates_parse() {
        for colour in RAINBOW {
            let template = format!("{{wide_bar:.{}.bold}}", colour);
            assert!(ProgressStyle::default_bar().template(&template).is_ok(), "{}", colour);
        }
    }

    #[tokio::test]
    async fn test_reporter_returns_totals_when_senders_drop() {
        let (tx, reporter) = ProgressReporter::spawn(1);
        tx.send(ProgressEvent::Started { id: 0, total: Some(4) }).unwrap();
        tx.send(ProgressEvent::Advanced { id: 0, bytes: 4 }).unwrap();
        tx.send(ProgressEvent::Finished { id: 0 }).unwrap();
        drop(tx);

        let totals = reporter.finish().await;
        assert_eq!(totals.finished(), 1);
        assert_eq!(totals.percentage(), Some(100.0));
    }
}
