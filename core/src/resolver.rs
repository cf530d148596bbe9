use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::HashSet;
use tally_protocol::CountLine;
use tally_protocol::Item;
use tally_protocol::ItemId;

/// Which items are eligible targets for a scan within the active count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopePolicy {
    /// Any catalog item known to the session.
    AllItems,
    /// Only items that already have a count line (template-limited count).
    CountLinesOnly,
}

/// Outcome of resolving a decoded code against the session scope.
/// Resolution never fails; callers must handle every arm explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exact barcode match on an in-scope item.
    Match(Item),
    /// Barcode matches a known item that is outside the count scope.
    NotInScope(Item),
    /// No item carries this barcode.
    NoMatch,
}

/// Exact-string barcode lookup over the session catalog. No fuzzy
/// matching, no normalization beyond trimming.
#[derive(Debug, Clone)]
pub struct ItemResolver {
    by_barcode: HashMap<String, Item>,
    in_scope: HashSet<ItemId>,
    policy: ScopePolicy,
}

impl ItemResolver {
    pub fn new(items: &[Item], lines: &[CountLine], policy: ScopePolicy) -> Self {
        let by_barcode = items
            .iter()
            .filter_map(|item| {
                item.barcode
                    .as_ref()
                    .map(|code| (code.clone(), item.clone()))
            })
            .collect();
        let in_scope = lines.iter().map(|line| line.item_id).collect();
        Self {
            by_barcode,
            in_scope,
            policy,
        }
    }

    pub fn resolve(&self, code: &str) -> Resolution {
        let code = code.trim();
        if code.is_empty() {
            return Resolution::NoMatch;
        }
        match self.by_barcode.get(code) {
            Some(item) => match self.policy {
                ScopePolicy::AllItems => Resolution::Match(item.clone()),
                ScopePolicy::CountLinesOnly if self.in_scope.contains(&item.id) => {
                    Resolution::Match(item.clone())
                }
                ScopePolicy::CountLinesOnly => Resolution::NotInScope(item.clone()),
            },
            None => Resolution::NoMatch,
        }
    }

    /// Reflects a freshly attached barcode so the same session can
    /// auto-select the item on subsequent scans.
    pub fn attach(&mut self, item: &Item) {
        if let Some(code) = item.barcode.as_ref() {
            self.by_barcode.insert(code.clone(), item.clone());
        }
    }

    pub fn add_to_scope(&mut self, item_id: ItemId) {
        self.in_scope.insert(item_id);
    }
}
