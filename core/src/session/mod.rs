//! Count-session kernel: the synchronous decision core that owns the
//! selected item, the per-scan quantity, and the confirmed-line snapshot
//! used for display. User intent arrives as [`SessionAction`] values;
//! operator feedback leaves as [`SessionEvent`] values; render state is a
//! [`SessionSnapshot`]. The asynchronous persistence side lives in
//! [`crate::persist`].

mod action;
mod event;
mod snapshot;
mod state;

pub use action::SessionAction;
pub use event::FailureKind;
pub use event::RejectReason;
pub use event::SessionEvent;
pub use snapshot::SessionSnapshot;
pub use state::SessionState;
