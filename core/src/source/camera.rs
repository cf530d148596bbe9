use crate::source::RawScan;
use crate::source::ScanSource;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::Sender;
use tokio::time::Instant;

/// Producer half handed to the camera decoder: it pushes already-decoded
/// frame text and can pause emission without tearing down the pipeline
/// (the decoder keeps running, frames are discarded).
#[derive(Clone)]
pub struct CameraFeed {
    frames: Sender<String>,
    active: Arc<AtomicBool>,
}

impl CameraFeed {
    pub async fn decoded(&self, code: impl Into<String>) {
        let _ = self.frames.send(code.into()).await;
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }
}

/// [`ScanSource`] backed by a camera frame decoder. Decoding internals
/// are out of scope; this adapter only sequences decoded text.
pub struct CameraScanner {
    frames: Receiver<String>,
    active: Arc<AtomicBool>,
}

impl CameraScanner {
    /// Builds a connected feed/scanner pair. `buffer` bounds how many
    /// decoded frames may queue before the decoder is backpressured.
    pub fn channel(buffer: usize) -> (CameraFeed, CameraScanner) {
        let (tx, rx) = mpsc::channel(buffer);
        let active = Arc::new(AtomicBool::new(true));
        (
            CameraFeed {
                frames: tx,
                active: Arc::clone(&active),
            },
            CameraScanner { frames: rx, active },
        )
    }
}

#[async_trait]
impl ScanSource for CameraScanner {
    async fn next_scan(&mut self) -> Option<RawScan> {
        loop {
            let code = self.frames.recv().await?;
            if !self.active.load(Ordering::Relaxed) {
                // Paused: the decoder still produces frames but the
                // source emits nothing.
                continue;
            }
            if code.trim().is_empty() {
                continue;
            }
            return Some(RawScan {
                code,
                at: Instant::now(),
            });
        }
    }
}
