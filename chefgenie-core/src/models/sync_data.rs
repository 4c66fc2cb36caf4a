use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::history_item::HistoryItem;
use super::ingredient::Ingredient;
use super::recipe::Recipe;

/// The whole shared household document.
///
/// Writes replace the document wholesale, so the last device to push wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    #[serde(default)]
    pub shopping_list: Vec<Ingredient>,
    /// Absent in documents written before plans were shared; such documents
    /// leave the local plan untouched when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipes: Option<Vec<Recipe>>,
    /// Epoch milliseconds of the push that wrote this document
    #[serde(default)]
    pub last_updated: i64,
}

impl SyncData {
    pub fn new(history: Vec<HistoryItem>, shopping_list: Vec<Ingredient>, recipes: Vec<Recipe>) -> Self {
        Self {
            history,
            shopping_list,
            recipes: Some(recipes),
            last_updated: 0,
        }
    }

    /// Returns the bundle stamped with the current time.
    pub fn stamped(mut self) -> Self {
        self.last_updated = Utc::now().timestamp_millis();
        self
    }

    /// Compares content, ignoring the push timestamp.
    pub fn same_content(&self, other: &SyncData) -> bool {
        self.history == other.history
            && self.shopping_list == other.shopping_list
            && self.recipes == other.recipes
    }
}
