use crate::service::ServiceError;
use serde::Deserialize;
use serde::Serialize;
use tally_protocol::ItemId;

/// Why a scan was not counted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RejectReason {
    NoItemSelected,
    /// Scanned code does not equal the selected item's existing barcode.
    Mismatch { scanned: String, expected: String },
    /// Code resolves to nothing eligible for this count.
    NotInScope { code: String },
    EmptyCode,
}

/// Failure classification surfaced to the operator, one variant per
/// distinct user-facing message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    InvalidIdentifier,
    PermissionDenied,
    Connectivity,
    AttachmentConflict,
    Unknown,
}

impl From<&ServiceError> for FailureKind {
    fn from(err: &ServiceError) -> Self {
        match err {
            ServiceError::InvalidIdentifier(_) => FailureKind::InvalidIdentifier,
            ServiceError::PermissionDenied(_) => FailureKind::PermissionDenied,
            ServiceError::Connectivity(_) => FailureKind::Connectivity,
            ServiceError::AttachmentConflict(_) => FailureKind::AttachmentConflict,
            ServiceError::Unknown(_) => FailureKind::Unknown,
        }
    }
}

/// Operator-facing feedback stream; the UI layer renders these as toasts,
/// haptics, or log lines as it sees fit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    ScanAccepted {
        item_id: ItemId,
        qty: u32,
        /// `confirmed + session delta` at the moment of acceptance.
        displayed_actual: u32,
    },
    /// Short vibration cue where the host platform supports it.
    Feedback,
    SwitchedItem {
        from: Option<ItemId>,
        to: ItemId,
    },
    /// Auto-select found a match but auto-switch is disabled; the UI may
    /// offer a one-tap switch.
    SwitchSuggested {
        item_id: ItemId,
    },
    ScanRejected {
        reason: RejectReason,
    },
    BarcodeAttached {
        item_id: ItemId,
        code: String,
    },
    AttachFailed {
        item_id: ItemId,
        code: String,
        kind: FailureKind,
        message: String,
    },
    PersistRetrying {
        item_id: ItemId,
        attempt: u32,
        max_attempts: u32,
        delay_ms: u64,
    },
    PersistConfirmed {
        item_id: ItemId,
        confirmed: u32,
    },
    PersistFailed {
        item_id: ItemId,
        kind: FailureKind,
        /// True when the optimistic delta was preserved and a later
        /// batch will carry these scans; false never discards scans
        /// either, it only means automatic retry is pointless.
        will_retry: bool,
        message: String,
    },
    ActualOverridden {
        item_id: ItemId,
        quantity: u32,
    },
    OverrideFailed {
        item_id: ItemId,
        kind: FailureKind,
        message: String,
    },
}
