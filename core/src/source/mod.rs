//! Decoded-barcode event sources.
//!
//! The engine is indifferent to which hardware produced a scan; both the
//! camera decoder and the keyboard-wedge scanner surface the same
//! [`RawScan`] stream. Dedupe of repeated identical codes happens in the
//! session kernel, not here, so sources stay thin.

mod camera;
mod wedge;

pub use camera::CameraFeed;
pub use camera::CameraScanner;
pub use wedge::WedgeAssembler;
pub use wedge::WedgeScanner;
pub use wedge::WedgeSuffix;

use async_trait::async_trait;
use tokio::time::Instant;

/// One decoded code with its arrival time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScan {
    pub code: String,
    pub at: Instant,
}

/// A lazy, indefinite stream of decoded scans. `None` means the source
/// has shut down for good; an inactive-but-open source simply does not
/// yield.
#[async_trait]
pub trait ScanSource: Send {
    async fn next_scan(&mut self) -> Option<RawScan>;
}
