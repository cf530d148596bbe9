use crate::config::EngineConfig;
use crate::persist::PersistCoordinator;
use crate::policy;
use crate::policy::PolicyContext;
use crate::policy::ScanDecision;
use crate::progress::Progress;
use crate::service::CountService;
use crate::session::RejectReason;
use crate::session::SessionAction;
use crate::session::SessionEvent;
use crate::session::SessionSnapshot;
use crate::session::SessionState;
use crate::util::lock_unpoisoned;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tally_protocol::CountLine;
use tally_protocol::Item;
use tally_protocol::ItemId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

/// One scan burst gets one attachment attempt.
const ATTACH_DEDUPE_WINDOW: Duration = Duration::from_secs(1);

/// Facade over the count-session kernel and the persistence
/// coordinator. Scan ingestion and the optimistic increment are
/// synchronous; the only suspension points are the barcode attachment
/// and the manual override, both explicit service calls. Bump and
/// refetch I/O happens on coordinator tasks and never blocks a scan.
pub struct ScanEngine {
    config: Mutex<EngineConfig>,
    state: Arc<Mutex<SessionState>>,
    coordinator: Arc<PersistCoordinator>,
    service: Arc<dyn CountService>,
    events: UnboundedSender<SessionEvent>,
}

impl ScanEngine {
    /// Builds an engine seeded with the session's catalog scope and
    /// count lines. The returned receiver carries operator feedback.
    pub fn new(
        config: EngineConfig,
        service: Arc<dyn CountService>,
        items: Vec<Item>,
        lines: Vec<CountLine>,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(SessionState::new(
            items,
            lines,
            config.scope,
            EngineConfig::clamp_qty(config.qty_per_scan),
        )));
        let coordinator = Arc::new(PersistCoordinator::new(
            config.count_id,
            config.debounce_window,
            config.max_bump_attempts,
            Arc::clone(&service),
            Arc::clone(&state),
            events.clone(),
        ));
        (
            Self {
                config: Mutex::new(config),
                state,
                coordinator,
                service,
                events,
            },
            events_rx,
        )
    }

    pub async fn dispatch(&self, action: SessionAction) {
        match action {
            SessionAction::ItemSelected { item_id } => self.handle_item_selected(item_id),
            SessionAction::ScanDetected { code } => self.handle_scan_detected(&code).await,
            SessionAction::SetQtyPerScan { qty } => self.set_qty_per_scan(qty),
            SessionAction::SetActual { quantity } => self.set_actual(quantity).await,
        }
    }

    pub fn handle_item_selected(&self, item_id: ItemId) {
        let from = lock_unpoisoned(&self.state).select_item(item_id);
        if from != Some(item_id) {
            self.emit(SessionEvent::SwitchedItem { from, to: item_id });
        }
    }

    pub async fn handle_scan_detected(&self, code: &str) {
        let code = code.trim();
        if code.is_empty() {
            self.emit(SessionEvent::ScanRejected {
                reason: RejectReason::EmptyCode,
            });
            return;
        }
        let now = Instant::now();
        let (attach_first_scan, auto_select, auto_switch, dedupe_window) = {
            let config = lock_unpoisoned(&self.config);
            (
                config.attach_first_scan,
                config.auto_select_by_barcode,
                config.auto_switch_on_match,
                config.dedupe_window,
            )
        };

        let (decision, current_id) = {
            let mut state = lock_unpoisoned(&self.state);
            if state.is_duplicate_scan(code, now, dedupe_window) {
                tracing::debug!(code, "duplicate scan suppressed");
                return;
            }
            let resolved = state.resolver().resolve(code);
            let recently_attached = state.recently_attached(code, now, ATTACH_DEDUPE_WINDOW);
            let decision = policy::decide(
                code,
                PolicyContext {
                    current: state.current_item(),
                    resolved,
                    attach_first_scan,
                    auto_select_by_barcode: auto_select,
                    auto_switch_on_match: auto_switch,
                    recently_attached,
                },
            );
            (decision, state.current_item_id())
        };

        match decision {
            ScanDecision::Reject(reason) => {
                tracing::debug!(code, ?reason, "scan rejected");
                self.emit(SessionEvent::ScanRejected { reason });
            }
            ScanDecision::Ignore => {}
            ScanDecision::Switch { to } => {
                let from = lock_unpoisoned(&self.state).select_item(to);
                tracing::debug!(code, %to, "auto-select switched item");
                self.emit(SessionEvent::SwitchedItem { from, to });
            }
            ScanDecision::SuggestSwitch { item_id } => {
                self.emit(SessionEvent::SwitchSuggested { item_id });
            }
            ScanDecision::AttachAndCount => {
                // Two sequential, independently-failable sub-operations:
                // a failed attachment aborts the scan; a successful one
                // still counts it.
                let Some(item_id) = current_id else {
                    return;
                };
                lock_unpoisoned(&self.state).note_attach_attempt(code, now);
                match self.service.attach_barcode(item_id, code).await {
                    Ok(()) => {
                        lock_unpoisoned(&self.state).apply_attach(item_id, code);
                        tracing::debug!(%item_id, code, "barcode attached");
                        self.emit(SessionEvent::BarcodeAttached {
                            item_id,
                            code: code.to_string(),
                        });
                        self.accept(item_id);
                    }
                    Err(err) => {
                        tracing::warn!(%item_id, code, "barcode attach failed: {err}");
                        self.emit(SessionEvent::AttachFailed {
                            item_id,
                            code: code.to_string(),
                            kind: (&err).into(),
                            message: err.to_string(),
                        });
                    }
                }
            }
            ScanDecision::Count => {
                let Some(item_id) = current_id else {
                    return;
                };
                self.accept(item_id);
            }
        }
    }

    /// Optimistic acceptance: delta grows synchronously and the
    /// displayed value reflects it before any network I/O starts.
    fn accept(&self, item_id: ItemId) {
        let (qty, confirmed) = {
            let state = lock_unpoisoned(&self.state);
            (state.qty_per_scan(), state.confirmed(item_id))
        };
        let new_delta = self.coordinator.increment(item_id, qty);
        self.emit(SessionEvent::ScanAccepted {
            item_id,
            qty,
            displayed_actual: confirmed + new_delta,
        });
        self.emit(SessionEvent::Feedback);
    }

    pub fn set_qty_per_scan(&self, qty: u32) {
        let qty = EngineConfig::clamp_qty(qty);
        lock_unpoisoned(&self.state).set_qty_per_scan(qty);
        lock_unpoisoned(&self.config).qty_per_scan = qty;
    }

    pub fn set_attach_first_scan(&self, enabled: bool) {
        lock_unpoisoned(&self.config).attach_first_scan = enabled;
    }

    pub fn set_auto_select_by_barcode(&self, enabled: bool) {
        lock_unpoisoned(&self.config).auto_select_by_barcode = enabled;
    }

    pub fn set_auto_switch_on_match(&self, enabled: bool) {
        lock_unpoisoned(&self.config).auto_switch_on_match = enabled;
    }

    /// Manual override of the selected item's actual quantity. On
    /// success the item's session delta is cleared: the operator just
    /// asserted the absolute truth.
    pub async fn set_actual(&self, quantity: u32) {
        let (count_id, item_id) = {
            let config = lock_unpoisoned(&self.config);
            let state = lock_unpoisoned(&self.state);
            let Some(item_id) = state.current_item_id() else {
                tracing::debug!("manual override ignored: no item selected");
                return;
            };
            (config.count_id, item_id)
        };
        match self
            .service
            .set_actual_quantity(count_id, item_id, quantity)
            .await
        {
            Ok(()) => {
                lock_unpoisoned(&self.state).apply_override(item_id, quantity);
                self.coordinator.clear_delta(item_id);
                self.emit(SessionEvent::ActualOverridden { item_id, quantity });
            }
            Err(err) => {
                tracing::warn!(%item_id, quantity, "manual override failed: {err}");
                self.emit(SessionEvent::OverrideFailed {
                    item_id,
                    kind: (&err).into(),
                    message: err.to_string(),
                });
            }
        }
    }

    /// Render-ready view; `displayed_actual` is always
    /// `confirmed + session delta` for every known count line.
    pub fn snapshot(&self) -> SessionSnapshot {
        let session_deltas = self.coordinator.deltas();
        let state = lock_unpoisoned(&self.state);
        let displayed_actual: HashMap<ItemId, u32> = state
            .lines()
            .map(|line| {
                let delta = session_deltas.get(&line.item_id).copied().unwrap_or(0);
                (line.item_id, line.confirmed() + delta)
            })
            .collect();
        SessionSnapshot {
            current_item_id: state.current_item_id(),
            qty_per_scan: state.qty_per_scan(),
            progress: Progress::of(state.lines()),
            session_deltas,
            displayed_actual,
            is_persisting: self.coordinator.is_persisting(),
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
