#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use tally_core::CountService;
use tally_core::EngineConfig;
use tally_core::ScanEngine;
use tally_core::ServiceError;
use tally_core::SessionEvent;
use tally_protocol::CountId;
use tally_protocol::CountLine;
use tally_protocol::Item;
use tally_protocol::ItemId;
use tokio::sync::mpsc::UnboundedReceiver;

/// Scriptable in-memory stand-in for the remote count service: records
/// every call, can fail on cue, and can simulate a slow or absent
/// network.
pub struct MockService {
    inner: Mutex<MockInner>,
}

struct MockInner {
    items: HashMap<ItemId, Item>,
    lines: HashMap<ItemId, CountLine>,
    bump_calls: Vec<(ItemId, u32)>,
    attach_calls: Vec<(ItemId, String)>,
    set_calls: Vec<(ItemId, u32)>,
    refetch_calls: usize,
    fail_bumps: VecDeque<ServiceError>,
    fail_attaches: VecDeque<ServiceError>,
    fail_refetches: VecDeque<ServiceError>,
    bump_delay: Duration,
    reachable: bool,
}

impl MockService {
    pub fn new(items: Vec<Item>, lines: Vec<CountLine>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(MockInner {
                items: items.into_iter().map(|item| (item.id, item)).collect(),
                lines: lines.into_iter().map(|line| (line.item_id, line)).collect(),
                bump_calls: Vec::new(),
                attach_calls: Vec::new(),
                set_calls: Vec::new(),
                refetch_calls: 0,
                fail_bumps: VecDeque::new(),
                fail_attaches: VecDeque::new(),
                fail_refetches: VecDeque::new(),
                bump_delay: Duration::ZERO,
                reachable: true,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fail_next_bump(&self, err: ServiceError) {
        self.lock().fail_bumps.push_back(err);
    }

    pub fn fail_next_attach(&self, err: ServiceError) {
        self.lock().fail_attaches.push_back(err);
    }

    pub fn fail_next_refetch(&self, err: ServiceError) {
        self.lock().fail_refetches.push_back(err);
    }

    pub fn set_bump_delay(&self, delay: Duration) {
        self.lock().bump_delay = delay;
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    pub fn bump_calls(&self) -> Vec<(ItemId, u32)> {
        self.lock().bump_calls.clone()
    }

    pub fn attach_calls(&self) -> Vec<(ItemId, String)> {
        self.lock().attach_calls.clone()
    }

    pub fn set_calls(&self) -> Vec<(ItemId, u32)> {
        self.lock().set_calls.clone()
    }

    pub fn refetch_calls(&self) -> usize {
        self.lock().refetch_calls
    }

    pub fn confirmed(&self, item_id: ItemId) -> Option<u32> {
        self.lock()
            .lines
            .get(&item_id)
            .and_then(|line| line.confirmed_actual_quantity)
    }

    pub fn barcode(&self, item_id: ItemId) -> Option<String> {
        self.lock()
            .items
            .get(&item_id)
            .and_then(|item| item.barcode.clone())
    }
}

#[async_trait]
impl CountService for MockService {
    async fn lookup_item_by_barcode(&self, code: &str) -> Result<Option<Item>, ServiceError> {
        Ok(self
            .lock()
            .items
            .values()
            .find(|item| item.barcode.as_deref() == Some(code))
            .cloned())
    }

    async fn bump_actual_quantity(
        &self,
        _count_id: CountId,
        item_id: ItemId,
        delta: u32,
    ) -> Result<(), ServiceError> {
        let delay = {
            let mut inner = self.lock();
            inner.bump_calls.push((item_id, delta));
            inner.bump_delay
        };
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.lock();
        if let Some(err) = inner.fail_bumps.pop_front() {
            return Err(err);
        }
        let line = inner
            .lines
            .get_mut(&item_id)
            .ok_or_else(|| ServiceError::InvalidIdentifier(item_id.to_string()))?;
        line.confirmed_actual_quantity = Some(line.confirmed() + delta);
        Ok(())
    }

    async fn attach_barcode(&self, item_id: ItemId, code: &str) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        inner.attach_calls.push((item_id, code.to_string()));
        if let Some(err) = inner.fail_attaches.pop_front() {
            return Err(err);
        }
        let item = inner
            .items
            .get_mut(&item_id)
            .ok_or_else(|| ServiceError::InvalidIdentifier(item_id.to_string()))?;
        item.barcode = Some(code.to_string());
        Ok(())
    }

    async fn refetch_count_lines(&self, _count_id: CountId) -> Result<Vec<CountLine>, ServiceError> {
        let mut inner = self.lock();
        inner.refetch_calls += 1;
        if let Some(err) = inner.fail_refetches.pop_front() {
            return Err(err);
        }
        Ok(inner.lines.values().cloned().collect())
    }

    async fn set_actual_quantity(
        &self,
        _count_id: CountId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        inner.set_calls.push((item_id, quantity));
        let line = inner
            .lines
            .get_mut(&item_id)
            .ok_or_else(|| ServiceError::InvalidIdentifier(item_id.to_string()))?;
        line.confirmed_actual_quantity = Some(quantity);
        Ok(())
    }

    fn is_reachable(&self) -> bool {
        self.lock().reachable
    }
}

/// A two-item session: "Olive oil" with barcode "111" and in-stock 5,
/// "Flour" with barcode "222" and in-stock 8, both with count lines.
pub struct Fixture {
    pub count_id: CountId,
    pub oil: Item,
    pub flour: Item,
    pub items: Vec<Item>,
    pub lines: Vec<CountLine>,
}

impl Fixture {
    pub fn new() -> Self {
        let count_id = CountId::new();
        let oil = Item::new("Olive oil").with_barcode("111");
        let flour = Item::new("Flour").with_barcode("222");
        let lines = vec![
            CountLine::new(count_id, oil.id, 5),
            CountLine::new(count_id, flour.id, 8),
        ];
        Self {
            count_id,
            items: vec![oil.clone(), flour.clone()],
            lines,
            oil,
            flour,
        }
    }

    pub fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::new(self.count_id);
        // Hardware-scanner sessions fire distinct trigger pulls; only
        // camera sessions need the lingering-frame dedupe.
        config.dedupe_window = Duration::ZERO;
        config
    }

    pub fn engine(
        &self,
        config: EngineConfig,
        service: Arc<MockService>,
    ) -> (ScanEngine, UnboundedReceiver<SessionEvent>) {
        ScanEngine::new(config, service, self.items.clone(), self.lines.clone())
    }
}

/// Drains every event currently buffered on the receiver.
pub fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
