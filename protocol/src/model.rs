use crate::ids::CountId;
use crate::ids::ItemId;
use serde::Deserialize;
use serde::Serialize;

/// A catalog entry. Owned by the remote catalog; the engine mutates only
/// `barcode`, and only once per item when attaching a first scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            sku: None,
            barcode: None,
        }
    }

    pub fn with_barcode(mut self, code: impl Into<String>) -> Self {
        self.barcode = Some(code.into());
        self
    }
}

/// One row per (count, item). `confirmed_actual_quantity` is `None` until
/// the item has been counted at least once; `in_stock_quantity` is the
/// expected/reference quantity and is read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountLine {
    pub count_id: CountId,
    pub item_id: ItemId,
    pub confirmed_actual_quantity: Option<u32>,
    pub in_stock_quantity: u32,
    #[serde(default)]
    pub template_minimum_quantity: Option<u32>,
    #[serde(default)]
    pub template_maximum_quantity: Option<u32>,
}

impl CountLine {
    pub fn new(count_id: CountId, item_id: ItemId, in_stock_quantity: u32) -> Self {
        Self {
            count_id,
            item_id,
            confirmed_actual_quantity: None,
            in_stock_quantity,
            template_minimum_quantity: None,
            template_maximum_quantity: None,
        }
    }

    pub fn is_counted(&self) -> bool {
        self.confirmed_actual_quantity.is_some()
    }

    pub fn confirmed(&self) -> u32 {
        self.confirmed_actual_quantity.unwrap_or(0)
    }
}
