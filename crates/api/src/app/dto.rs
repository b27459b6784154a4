use serde::{Deserialize, Serialize};

use stockpile_inventory::{InventoryItem, ItemState, Notice};
use stockpile_infra::MutationReport;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub name: String,
    /// Initial quantity for a new item (default 1); ignored for existing items.
    pub quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Force a full re-read of the store.
    #[serde(default)]
    pub reconcile: bool,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub name: String,
    pub display_name: String,
    pub quantity: u64,
}

impl From<&InventoryItem> for ItemResponse {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name.to_string(),
            display_name: item.name.display_name(),
            quantity: item.quantity.get(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoticeResponse {
    #[serde(flatten)]
    pub notice: Notice,
    pub dismiss_after_ms: u64,
}

impl NoticeResponse {
    pub fn new(notice: Notice, dismiss_after_ms: u64) -> Self {
        Self {
            notice,
            dismiss_after_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub items: Vec<ItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub notice: NoticeResponse,
    pub item: String,
    /// Quantity after the mutation; `null` when the item no longer exists.
    pub quantity: Option<u64>,
    pub items: Vec<ItemResponse>,
    pub stale: bool,
    pub attempts: u32,
}

pub fn items_to_json(items: &[InventoryItem]) -> Vec<ItemResponse> {
    items.iter().map(ItemResponse::from).collect()
}

pub fn report_to_json(report: &MutationReport, notice: NoticeResponse) -> MutationResponse {
    let quantity = match report.outcome.state {
        ItemState::Present(q) => Some(q.get()),
        ItemState::Absent => None,
    };
    MutationResponse {
        notice,
        item: report.outcome.name.to_string(),
        quantity,
        items: items_to_json(&report.items),
        stale: report.stale,
        attempts: report.attempts,
    }
}
