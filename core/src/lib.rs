//! Barcode-driven count-session reconciliation engine.
//!
//! The engine turns a rapid, unreliable stream of decoded barcode scans
//! into durable quantity updates on a shared remote counter. Scans are
//! accepted synchronously into an optimistic per-item session delta, then
//! coalesced by a debounced persistence coordinator into one additive
//! "bump" write per pause-in-scanning, with retry, rollback, and
//! refetch-based reconciliation against the authoritative count lines.
//!
//! The invariant that holds at every observable point: the displayed
//! actual quantity for an item equals the confirmed server quantity plus
//! that item's session delta, and a confirmed scan is never silently
//! dropped nor a failed persistence turned into fabricated quantity.

mod config;
mod engine;
pub mod persist;
pub mod policy;
mod progress;
mod resolver;
mod service;
pub mod session;
pub mod source;
mod util;

pub use config::EngineConfig;
pub use engine::ScanEngine;
pub use progress::Progress;
pub use resolver::ItemResolver;
pub use resolver::Resolution;
pub use resolver::ScopePolicy;
pub use service::CountService;
pub use service::ServiceError;
pub use session::FailureKind;
pub use session::RejectReason;
pub use session::SessionAction;
pub use session::SessionEvent;
pub use session::SessionSnapshot;
