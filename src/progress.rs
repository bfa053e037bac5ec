use std::io::{self, Write};
use std::sync::Arc;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

pub static GLOBAL_MP: Lazy<MultiProgress> = Lazy::new(MultiProgress::new);

fn create_bytes_progress(message: String, total: u64) -> ProgressBar {
    let pb = GLOBAL_MP.add(ProgressBar::new(total));
    pb.set_style(
        ProgressStyle::default_bar()
            .progress_chars("##-")
            .template("{msg}\n{bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
            .expect("invalid progress template"),
    );
    pb.set_message(message);
    pb
}

/// Log writer that routes `tracing` output through the global
/// `MultiProgress` so log lines don't tear an active progress bar.
pub struct MultiProgressWriter {
    mp: Arc<MultiProgress>,
}

impl MultiProgressWriter {
    pub fn new(mp: Arc<MultiProgress>) -> Self {
        Self { mp }
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.mp.println(String::from_utf8_lossy(buf).trim_end())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Receives the start/advance/finish signals of a single transfer.
pub trait ProgressSink {
    fn start(&mut self, total: u64);
    fn advance(&mut self, delta: u64);
    fn finish(&mut self);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn start(&mut self, total: u64) {
        (**self).start(total);
    }

    fn advance(&mut self, delta: u64) {
        (**self).advance(delta);
    }

    fn finish(&mut self) {
        (**self).finish();
    }
}

/// Renders transfer signals as an indicatif byte bar.
///
/// The bar is only created on `start`, so a transfer with an unknown total
/// never shows a bar at all.
pub struct BarSink {
    message: String,
    bar: Option<ProgressBar>,
}

impl BarSink {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            bar: None,
        }
    }
}

impl ProgressSink for BarSink {
    fn start(&mut self, total: u64) {
        self.bar = Some(create_bytes_progress(self.message.clone(), total));
    }

    fn advance(&mut self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

enum TransferState {
    Idle,
    InProgress { bytes_so_far: u64 },
}

/// Progress state for one transfer: `Idle` until the first position report
/// with a known total, `InProgress` until `finish`.
///
/// One value is created per download and threaded through the transfer
/// call; nothing is shared between transfers.
pub struct TransferProgress<S> {
    state: TransferState,
    sink: S,
}

impl<S: ProgressSink> TransferProgress<S> {
    pub fn new(sink: S) -> Self {
        Self {
            state: TransferState::Idle,
            sink,
        }
    }

    /// Report the current transfer position.
    ///
    /// A zero or unknown total is skipped entirely: no start signal, no
    /// percentage math. Advancement is by delta from the previously
    /// reported position, so chunk sizes don't have to be uniform.
    pub fn update(&mut self, total: u64, downloaded: u64) {
        if total == 0 {
            return;
        }

        match &mut self.state {
            TransferState::Idle => {
                self.sink.start(total);
                self.sink.advance(downloaded);
                self.state = TransferState::InProgress {
                    bytes_so_far: downloaded,
                };
            }
            TransferState::InProgress { bytes_so_far } => {
                self.sink.advance(downloaded.saturating_sub(*bytes_so_far));
                *bytes_so_far = downloaded;
            }
        }
    }

    /// Mark the transfer as complete and return to `Idle`.
    ///
    /// The finish signal fires once per started transfer; finishing an idle
    /// transfer is a no-op.
    pub fn finish(&mut self) {
        if matches!(self.state, TransferState::InProgress { .. }) {
            self.sink.finish();
        }
        self.state = TransferState::Idle;
    }
}


#[cfg(test)]
mod tests {
    use super::test_sink::RecordingSink;
    use super::*;

    #[test]
    fn zero_total_never_starts() {
        let mut sink = RecordingSink::default();
        {
            let mut progress = TransferProgress::new(&mut sink);
            progress.update(0, 128);
            progress.update(0, 512);
            progress.finish();
        }
        assert!(sink.starts.is_empty());
        assert!(sink.advances.is_empty());
        assert_eq!(sink.finishes, 0);
    }

    #[test]
    fn starts_once_and_advances_by_delta() {
        let mut sink = RecordingSink::default();
        {
            let mut progress = TransferProgress::new(&mut sink);
            progress.update(100, 10);
            progress.update(100, 35);
            progress.update(100, 100);
            progress.finish();
        }
        assert_eq!(sink.starts, vec![100]);
        assert_eq!(sink.advances, vec![10, 25, 65]);
        assert_eq!(sink.finishes, 1);
    }

    #[test]
    fn finish_fires_once_per_transfer() {
        let mut sink = RecordingSink::default();
        {
            let mut progress = TransferProgress::new(&mut sink);
            progress.update(10, 10);
            progress.finish();
            progress.finish();
        }
        assert_eq!(sink.finishes, 1);
    }

    #[test]
    fn regressing_position_does_not_underflow() {
        let mut sink = RecordingSink::default();
        {
            let mut progress = TransferProgress::new(&mut sink);
            progress.update(100, 50);
            progress.update(100, 40);
        }
        assert_eq!(sink.advances, vec![50, 0]);
    }

    #[test]
    fn reusable_after_finish() {
        let mut sink = RecordingSink::default();
        {
            let mut progress = TransferProgress::new(&mut sink);
            progress.update(100, 100);
            progress.finish();
            progress.update(200, 20);
            progress.finish();
        }
        assert_eq!(sink.starts, vec![100, 200]);
        assert_eq!(sink.finishes, 2);
    }
}
