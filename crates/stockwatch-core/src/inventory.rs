//! Normalized inventory model shared by the monitor and the CLI.

use serde::Serialize;

/// Inventory label used when a store reports no inventory figure.
pub const UNKNOWN_INVENTORY: &str = "unknown";

/// Pickup availability of the watched product at one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreRecord {
    pub name: String,
    pub is_buyable: bool,
    /// Inventory figure as reported (e.g. `"50+"`), or [`UNKNOWN_INVENTORY`].
    pub inventory_label: String,
}

impl StoreRecord {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        is_buyable: bool,
        inventory_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            is_buyable,
            inventory_label: inventory_label.into(),
        }
    }
}

/// Store records returned by a single poll, in response order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollResult {
    pub records: Vec<StoreRecord>,
}

impl PollResult {
    #[must_use]
    pub fn new(records: Vec<StoreRecord>) -> Self {
        Self { records }
    }

    /// Records that can currently be bought, preserving order.
    pub fn available(&self) -> impl Iterator<Item = &StoreRecord> {
        self.records.iter().filter(|r| r.is_buyable)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
