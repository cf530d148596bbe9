use crate::resolver::ItemResolver;
use crate::resolver::ScopePolicy;
use std::collections::HashMap;
use std::time::Duration;
use tally_protocol::CountLine;
use tally_protocol::Item;
use tally_protocol::ItemId;
use tokio::time::Instant;

/// Mutable session bookkeeping behind the engine's lock. Session deltas
/// are deliberately *not* here; they live in the persistence
/// coordinator's per-item records so optimistic display and batch
/// capture cannot drift apart.
#[derive(Debug)]
pub struct SessionState {
    current_item_id: Option<ItemId>,
    qty_per_scan: u32,
    items: HashMap<ItemId, Item>,
    lines: HashMap<ItemId, CountLine>,
    resolver: ItemResolver,
    last_scan: Option<(String, Instant)>,
    /// Short-lived dedupe key so one scan burst cannot re-attempt a
    /// barcode attachment.
    last_attached: Option<(String, Instant)>,
}

impl SessionState {
    pub fn new(
        items: Vec<Item>,
        lines: Vec<CountLine>,
        scope: ScopePolicy,
        qty_per_scan: u32,
    ) -> Self {
        let resolver = ItemResolver::new(&items, &lines, scope);
        Self {
            current_item_id: None,
            qty_per_scan,
            items: items.into_iter().map(|item| (item.id, item)).collect(),
            lines: lines.into_iter().map(|line| (line.item_id, line)).collect(),
            resolver,
            last_scan: None,
            last_attached: None,
        }
    }

    pub fn current_item_id(&self) -> Option<ItemId> {
        self.current_item_id
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.current_item_id.and_then(|id| self.items.get(&id))
    }

    /// Selecting an item never touches per-item deltas; it only resets
    /// the attach bookkeeping tied to the previous active edit.
    pub fn select_item(&mut self, item_id: ItemId) -> Option<ItemId> {
        let previous = self.current_item_id.replace(item_id);
        self.last_attached = None;
        previous
    }

    pub fn qty_per_scan(&self) -> u32 {
        self.qty_per_scan
    }

    pub fn set_qty_per_scan(&mut self, qty: u32) {
        self.qty_per_scan = qty;
    }

    pub fn item(&self, item_id: ItemId) -> Option<&Item> {
        self.items.get(&item_id)
    }

    pub fn line(&self, item_id: ItemId) -> Option<&CountLine> {
        self.lines.get(&item_id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &CountLine> {
        self.lines.values()
    }

    pub fn confirmed(&self, item_id: ItemId) -> u32 {
        self.lines.get(&item_id).map(CountLine::confirmed).unwrap_or(0)
    }

    pub fn resolver(&self) -> &ItemResolver {
        &self.resolver
    }

    /// Applies a refetched authoritative snapshot of the count lines.
    pub fn apply_refetch(&mut self, lines: Vec<CountLine>) {
        for line in lines {
            self.lines.insert(line.item_id, line);
        }
    }

    /// Records a confirmed absolute quantity from a manual override.
    pub fn apply_override(&mut self, item_id: ItemId, quantity: u32) {
        if let Some(line) = self.lines.get_mut(&item_id) {
            line.confirmed_actual_quantity = Some(quantity);
        }
    }

    /// Records a successful barcode attachment on the catalog snapshot
    /// and the resolver index.
    pub fn apply_attach(&mut self, item_id: ItemId, code: &str) {
        if let Some(item) = self.items.get_mut(&item_id) {
            item.barcode = Some(code.to_string());
            self.resolver.attach(item);
        }
    }

    /// Dedupe for immediately-repeated identical codes. Records the scan
    /// as a side effect so bursts collapse to the first read.
    pub fn is_duplicate_scan(&mut self, code: &str, now: Instant, window: Duration) -> bool {
        let duplicate = matches!(
            &self.last_scan,
            Some((last, at)) if last == code && now.duration_since(*at) < window
        );
        self.last_scan = Some((code.to_string(), now));
        duplicate
    }

    pub fn note_attach_attempt(&mut self, code: &str, now: Instant) {
        self.last_attached = Some((code.to_string(), now));
    }

    pub fn recently_attached(&self, code: &str, now: Instant, window: Duration) -> bool {
        matches!(
            &self.last_attached,
            Some((last, at)) if last == code && now.duration_since(*at) < window
        )
    }
}
