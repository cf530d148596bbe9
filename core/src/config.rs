use crate::resolver::ScopePolicy;
use std::time::Duration;
use tally_protocol::CountId;

pub const QTY_PER_SCAN_MIN: u32 = 1;
pub const QTY_PER_SCAN_MAX: u32 = 10;

/// Engine settings for one count session.
///
/// `debounce_window` bounds write amplification to roughly one bump per
/// pause-in-scanning; `dedupe_window` suppresses double-reads of the same
/// code from a single trigger pull or a lingering camera frame.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub count_id: CountId,
    /// Treat the first scan against a barcode-less item as that item's
    /// new barcode.
    pub attach_first_scan: bool,
    /// Scanning another in-scope item's barcode selects that item.
    pub auto_select_by_barcode: bool,
    /// When auto-select finds a different item, switch immediately
    /// instead of surfacing a switch suggestion.
    pub auto_switch_on_match: bool,
    pub qty_per_scan: u32,
    pub dedupe_window: Duration,
    pub debounce_window: Duration,
    /// Attempt ceiling for one batch, connectivity failures only.
    pub max_bump_attempts: u32,
    pub scope: ScopePolicy,
}

impl EngineConfig {
    pub fn new(count_id: CountId) -> Self {
        Self {
            count_id,
            attach_first_scan: true,
            auto_select_by_barcode: false,
            auto_switch_on_match: true,
            qty_per_scan: 1,
            dedupe_window: Duration::from_millis(500),
            debounce_window: Duration::from_millis(325),
            max_bump_attempts: 3,
            scope: ScopePolicy::CountLinesOnly,
        }
    }

    pub fn clamp_qty(qty: u32) -> u32 {
        qty.clamp(QTY_PER_SCAN_MIN, QTY_PER_SCAN_MAX)
    }
}
