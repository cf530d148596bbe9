use async_trait::async_trait;
use tally_protocol::CountId;
use tally_protocol::CountLine;
use tally_protocol::Item;
use tally_protocol::ItemId;
use thiserror::Error;

/// Classified failures from the remote count/catalog service.
///
/// Implementors are responsible for mapping their transport's raw errors
/// (HTTP status, row-level-security violations, timeouts) onto these
/// variants; the engine never inspects message strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("connectivity failure: {0}")]
    Connectivity(String),
    #[error("barcode already attached to another item: {0}")]
    AttachmentConflict(String),
    #[error("service error: {0}")]
    Unknown(String),
}

impl ServiceError {
    /// Only connectivity failures are worth retrying; identifier and
    /// permission failures will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Connectivity(_))
    }
}

/// The one seam to the remote data service that owns counts and items.
///
/// `bump_actual_quantity` must be additive and atomic on the server side:
/// concurrent operators counting the same item all land correctly
/// regardless of interleaving, so the engine never does distributed
/// locking or read-modify-write of a cached absolute value.
#[async_trait]
pub trait CountService: Send + Sync {
    /// Catalog-wide barcode lookup for host UIs (item search, labeling
    /// scan feedback). The scan path never calls this; the engine
    /// resolves scans against its local session index.
    async fn lookup_item_by_barcode(&self, code: &str) -> Result<Option<Item>, ServiceError>;

    async fn bump_actual_quantity(
        &self,
        count_id: CountId,
        item_id: ItemId,
        delta: u32,
    ) -> Result<(), ServiceError>;

    async fn attach_barcode(&self, item_id: ItemId, code: &str) -> Result<(), ServiceError>;

    async fn refetch_count_lines(&self, count_id: CountId) -> Result<Vec<CountLine>, ServiceError>;

    /// Absolute overwrite of a count line's actual quantity, used by the
    /// manual override path rather than the scan path.
    async fn set_actual_quantity(
        &self,
        count_id: CountId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), ServiceError>;

    /// Cheap connectivity probe consulted before an outbound batch. A
    /// `false` here keeps the optimistic delta visible instead of burning
    /// retry attempts on a network that is known to be absent.
    fn is_reachable(&self) -> bool {
        true
    }
}
