use std::sync::Arc;
use tokio::sync::watch::{Receiver, Sender, channel};
use tokio_stream::wrappers::WatchStream;

/// Upload progress as a whole percentage, observable by any number of subscribers.
///
/// The value only ever goes up between [`UploadProgress::begin`] calls.
#[derive(Debug, Clone)]
pub struct UploadProgress {
    sender: Arc<Sender<u8>>,
}

impl Default for UploadProgress {
    fn default() -> Self {
        let (tx, _rx) = channel(0);
        Self {
            sender: Arc::new(tx),
        }
    }
}

impl UploadProgress {
    pub fn current(&self) -> u8 {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> Receiver<u8> {
        self.sender.subscribe()
    }

    pub fn stream(&self) -> WatchStream<u8> {
        WatchStream::new(self.subscribe())
    }

    ///resets to 0 and returns a tracker for an upload of `total_bytes`
    pub fn begin(&self, total_bytes: u64) -> ProgressTracker {
        self.sender.send_replace(0);
        ProgressTracker {
            progress: self.clone(),
            total: total_bytes,
            sent: 0,
        }
    }

    pub fn finish(&self) {
        self.raise_to(100);
    }

    fn raise_to(&self, percent: u8) {
        self.sender.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }
}

/// Counts bytes of a single upload as they're handed to the transport.
#[derive(Debug)]
pub struct ProgressTracker {
    progress: UploadProgress,
    total: u64,
    sent: u64,
}

impl ProgressTracker {
    ///stops at 99, only [`UploadProgress::finish`] reports 100
    pub fn advance(&mut self, bytes: usize) {
        self.sent = self.sent.saturating_add(bytes as u64).min(self.total);
        self.progress.raise_to(percentage(self.sent, self.total).min(99));
    }
}

/// `round(sent * 100 / total)`, where an empty upload is already complete.
#[allow(clippy::cast_possible_truncation)]
pub fn percentage(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = u128::from(sent.min(total));
    let total = u128::from(total);
    ((sent * 100 + total / 2) / total) as u8
}
