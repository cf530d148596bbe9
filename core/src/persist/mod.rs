//! Debounced persistence coordinator.
//!
//! Converts a burst of optimistic per-item increments into one additive
//! bump per pause-in-scanning, retries connectivity failures with
//! exponential backoff, and reconciles the optimistic delta against the
//! authoritative count lines after every acknowledged write.
//!
//! All bookkeeping lives in an explicit per-item [`ItemRecord`] owned by
//! the coordinator; there is no shadow copy of the delta anywhere else.
//! The two terminal outcomes for any batch are "merged into the
//! confirmed total" or "preserved in the delta for retry" — a batch is
//! never discarded.

use crate::service::CountService;
use crate::session::FailureKind;
use crate::session::SessionEvent;
use crate::session::SessionState;
use crate::util::backoff;
use crate::util::lock_unpoisoned;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tally_protocol::CountId;
use tally_protocol::ItemId;
use tokio::sync::mpsc::UnboundedSender;

/// Per-item persistence bookkeeping.
///
/// `delta` is the session delta: scans accepted locally and not yet
/// reflected in a confirmed refetch. `settled` is the slice of `delta`
/// the server has acknowledged but a refetch has not confirmed yet; it
/// keeps a retried or subsequent batch from re-sending quantity the
/// server already took, without ever shrinking the displayed value.
#[derive(Debug, Default)]
struct ItemRecord {
    delta: u32,
    settled: u32,
    /// Debounce generation token. A timer task only flushes if its
    /// generation is still current, so every new scan restarts the
    /// window instead of issuing a write.
    generation: u64,
    in_flight: bool,
    /// A timer fired while a batch was in flight; re-flush after settle.
    dirty: bool,
}

impl ItemRecord {
    fn unsent(&self) -> u32 {
        self.delta.saturating_sub(self.settled)
    }
}

pub struct PersistCoordinator {
    count_id: CountId,
    debounce_window: Duration,
    max_attempts: u32,
    service: Arc<dyn CountService>,
    state: Arc<Mutex<SessionState>>,
    records: Mutex<HashMap<ItemId, ItemRecord>>,
    events: UnboundedSender<SessionEvent>,
}

impl PersistCoordinator {
    pub fn new(
        count_id: CountId,
        debounce_window: Duration,
        max_attempts: u32,
        service: Arc<dyn CountService>,
        state: Arc<Mutex<SessionState>>,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            count_id,
            debounce_window,
            max_attempts: max_attempts.max(1),
            service,
            state,
            records: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn delta(&self, item_id: ItemId) -> u32 {
        lock_unpoisoned(&self.records)
            .get(&item_id)
            .map(|rec| rec.delta)
            .unwrap_or(0)
    }

    /// Non-zero session deltas, for snapshot assembly.
    pub fn deltas(&self) -> HashMap<ItemId, u32> {
        lock_unpoisoned(&self.records)
            .iter()
            .filter(|(_, rec)| rec.delta > 0)
            .map(|(id, rec)| (*id, rec.delta))
            .collect()
    }

    pub fn is_persisting(&self) -> bool {
        lock_unpoisoned(&self.records)
            .values()
            .any(|rec| rec.in_flight)
    }

    /// Accepts a scan: grows the item's delta synchronously and
    /// (re)arms the debounce timer. Returns the new delta.
    pub fn increment(self: &Arc<Self>, item_id: ItemId, qty: u32) -> u32 {
        let (generation, new_delta) = {
            let mut records = lock_unpoisoned(&self.records);
            let rec = records.entry(item_id).or_default();
            rec.delta = rec.delta.saturating_add(qty);
            rec.generation += 1;
            (rec.generation, rec.delta)
        };
        tracing::debug!(%item_id, qty, new_delta, "scan accepted into session delta");
        self.arm(item_id, generation);
        new_delta
    }

    /// Manual override confirmed an absolute quantity; the session delta
    /// for the item no longer represents anything.
    pub fn clear_delta(&self, item_id: ItemId) {
        let mut records = lock_unpoisoned(&self.records);
        if let Some(rec) = records.get_mut(&item_id) {
            rec.delta = 0;
            rec.settled = 0;
        }
    }

    fn arm(self: &Arc<Self>, item_id: ItemId, generation: u64) {
        let this = Arc::clone(self);
        let window = self.debounce_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            this.flush(item_id, generation).await;
        });
    }

    /// Timer body. Captures the pending batch, validates, checks
    /// reachability, then bumps with backoff and reconciles.
    async fn flush(self: Arc<Self>, item_id: ItemId, generation: u64) {
        let batch = {
            let mut records = lock_unpoisoned(&self.records);
            let Some(rec) = records.get_mut(&item_id) else {
                return;
            };
            if rec.generation != generation {
                // A newer scan restarted the window.
                return;
            }
            if rec.in_flight {
                rec.dirty = true;
                return;
            }
            let magnitude = rec.unsent();
            if magnitude == 0 && rec.settled == 0 {
                return;
            }
            rec.in_flight = true;
            magnitude
        };

        if batch == 0 {
            // Nothing new to send, but an earlier refetch failed to
            // confirm acknowledged quantity; try to reconcile it now.
            self.reconcile(item_id).await;
            self.settle(item_id);
            return;
        }

        if !self.count_id.is_valid() || !item_id.is_valid() {
            tracing::warn!(count_id = %self.count_id, %item_id, "refusing bump with invalid identifiers");
            self.emit(SessionEvent::PersistFailed {
                item_id,
                kind: FailureKind::InvalidIdentifier,
                will_retry: false,
                message: "count or item identifier is invalid".to_string(),
            });
            self.settle(item_id);
            return;
        }

        if !self.service.is_reachable() {
            // Pure connectivity absence: keep the optimistic delta so
            // the operator can keep scanning; the next accepted scan
            // re-arms the window and retries naturally.
            tracing::debug!(%item_id, batch, "offline, batch kept for retry");
            self.emit(SessionEvent::PersistFailed {
                item_id,
                kind: FailureKind::Connectivity,
                will_retry: true,
                message: "offline — scans are kept and will retry".to_string(),
            });
            self.settle(item_id);
            return;
        }

        let mut attempt = 1;
        loop {
            match self
                .service
                .bump_actual_quantity(self.count_id, item_id, batch)
                .await
            {
                Ok(()) => {
                    // Acknowledged: mark settled first so no later batch
                    // can re-send this magnitude, then reconcile.
                    {
                        let mut records = lock_unpoisoned(&self.records);
                        if let Some(rec) = records.get_mut(&item_id) {
                            rec.settled = rec.settled.saturating_add(batch);
                        }
                    }
                    self.reconcile(item_id).await;
                    break;
                }
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = backoff(attempt);
                    tracing::warn!(
                        %item_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        "bump failed: {err}; retrying in {delay:?}"
                    );
                    self.emit(SessionEvent::PersistRetrying {
                        item_id,
                        attempt,
                        max_attempts: self.max_attempts,
                        delay_ms: delay.as_millis() as u64,
                    });
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    // Terminal for this batch. The delta was never
                    // reduced, so the rollback is implicit: the batch
                    // plus any scans accepted mid-flight stay visible
                    // and will ride the next batch.
                    tracing::warn!(%item_id, batch, "bump failed terminally: {err}");
                    self.emit(SessionEvent::PersistFailed {
                        item_id,
                        kind: FailureKind::from(&err),
                        will_retry: err.is_retryable(),
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }
        self.settle(item_id);
    }

    /// Refetches authoritative lines and only then collapses the settled
    /// slice out of the delta, so the displayed value moves from
    /// `stale_confirmed + delta` to `fresh_confirmed + remainder`
    /// without a dip or jump. A failed refetch leaves the delta intact
    /// rather than risking an under-count display.
    async fn reconcile(&self, item_id: ItemId) {
        match self.service.refetch_count_lines(self.count_id).await {
            Ok(lines) => {
                let confirmed = {
                    let mut state = lock_unpoisoned(&self.state);
                    state.apply_refetch(lines);
                    state.confirmed(item_id)
                };
                {
                    let mut records = lock_unpoisoned(&self.records);
                    if let Some(rec) = records.get_mut(&item_id) {
                        rec.delta = rec.delta.saturating_sub(rec.settled);
                        rec.settled = 0;
                    }
                }
                tracing::debug!(%item_id, confirmed, "batch merged into confirmed total");
                self.emit(SessionEvent::PersistConfirmed { item_id, confirmed });
            }
            Err(err) => {
                tracing::warn!(%item_id, "refetch failed after acknowledged bump: {err}");
            }
        }
    }

    fn settle(self: &Arc<Self>, item_id: ItemId) {
        let rearm = {
            let mut records = lock_unpoisoned(&self.records);
            let Some(rec) = records.get_mut(&item_id) else {
                return;
            };
            rec.in_flight = false;
            let dirty = std::mem::take(&mut rec.dirty);
            if dirty && (rec.unsent() > 0 || rec.settled > 0) {
                rec.generation += 1;
                Some(rec.generation)
            } else {
                None
            }
        };
        if let Some(generation) = rearm {
            self.arm(item_id, generation);
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
