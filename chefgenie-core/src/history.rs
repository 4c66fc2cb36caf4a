//! The cookbook: every recipe ever committed from a plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{HistoryItem, Recipe};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    items: Vec<HistoryItem>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<HistoryItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<HistoryItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Commits a plan, stamping new entries with the current time.
    pub fn commit(&mut self, recipes: &[Recipe]) -> usize {
        self.commit_at(recipes, Utc::now())
    }

    /// Appends each recipe whose name (case-insensitive) is not already in
    /// the cookbook. Repeats within `recipes` are only added once.
    ///
    /// Returns the number of entries added.
    pub fn commit_at(&mut self, recipes: &[Recipe], now: DateTime<Utc>) -> usize {
        let mut known: HashSet<String> = self
            .items
            .iter()
            .map(|item| item.name().to_lowercase())
            .collect();

        let before = self.items.len();
        for recipe in recipes {
            if known.insert(recipe.name.to_lowercase()) {
                self.items.push(HistoryItem::from_recipe(recipe, now));
            } else {
                tracing::debug!("Skipping '{}': already in history", recipe.name);
            }
        }
        self.items.len() - before
    }

    /// Flips the star on the entry with `id`.
    ///
    /// Returns the new starred state, or `None` if no entry matched.
    pub fn toggle_star(&mut self, id: &str) -> Option<bool> {
        self.items
            .iter_mut()
            .find(|item| item.id() == id)
            .map(HistoryItem::toggle_star)
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn starred(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter().filter(|item| item.is_starred)
    }

    /// Entries in display order: starred first, newest first within each
    /// group.
    pub fn sorted(&self) -> Vec<&HistoryItem> {
        let mut sorted: Vec<&HistoryItem> = self.items.iter().collect();
        sorted.sort_by(|a, b| {
            b.is_starred
                .cmp(&a.is_starred)
                .then_with(|| b.date_added.cmp(&a.date_added))
        });
        sorted
    }

    /// Entries whose name contains `term` (case-insensitive), in display
    /// order.
    pub fn search(&self, term: &str) -> Vec<&HistoryItem> {
        let term = term.to_lowercase();
        self.sorted()
            .into_iter()
            .filter(|item| item.name().to_lowercase().contains(&term))
            .collect()
    }
}
