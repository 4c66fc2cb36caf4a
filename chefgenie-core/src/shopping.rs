//! Shopping list derived from the active plan.
//!
//! The list stores one row per recipe ingredient, tagged with the recipe it
//! came from, plus any items the user added by hand. Rows are addressed by
//! ingredient name: toggling "Flour" flips every "Flour" row, and the display
//! view merges them into a single line.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::models::{Ingredient, IngredientName, Recipe, MANUAL_CATEGORY};

/// Quantity recorded for a manual item added without one.
pub const DEFAULT_MANUAL_QUANTITY: &str = "1";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShoppingList {
    items: Vec<Ingredient>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Ingredient>) -> Self {
        Self { items }
    }

    /// Flattens every recipe's ingredients into unchecked rows tagged with
    /// the recipe name.
    pub fn from_recipes(recipes: &[Recipe]) -> Self {
        let items = recipes
            .iter()
            .flat_map(|recipe| {
                recipe.ingredients.iter().map(move |ingredient| Ingredient {
                    checked: false,
                    source_recipe: Some(recipe.name.clone()),
                    ..ingredient.clone()
                })
            })
            .collect();
        Self { items }
    }

    /// Builds the list for a regenerated plan. Any name checked in the
    /// current list stays checked, whichever recipe it now comes from.
    pub fn regenerated(&self, recipes: &[Recipe]) -> Self {
        let checked: HashSet<&str> = self
            .items
            .iter()
            .filter(|i| i.checked)
            .map(|i| i.name.as_str())
            .collect();

        let mut next = Self::from_recipes(recipes);
        for item in &mut next.items {
            item.checked = checked.contains(item.name.as_str());
        }
        next
    }

    pub fn items(&self) -> &[Ingredient] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Ingredient> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any row with this name is checked.
    pub fn is_checked(&self, name: &str) -> bool {
        self.items.iter().any(|i| i.name == name && i.checked)
    }

    /// Flips `checked` on every row named `name`.
    ///
    /// Returns the number of rows touched.
    pub fn toggle(&mut self, name: &str) -> usize {
        let mut touched = 0;
        for item in self.items.iter_mut().filter(|i| i.name == name) {
            item.checked = !item.checked;
            touched += 1;
        }
        touched
    }

    /// Appends a hand-entered item. Blank names are ignored.
    ///
    /// Returns true if an item was added.
    pub fn add_manual(&mut self, name: &str, quantity: Option<&str>) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let quantity = quantity
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_MANUAL_QUANTITY);

        self.items
            .push(Ingredient::new(name, quantity, MANUAL_CATEGORY));
        true
    }

    /// Removes every checked row.
    ///
    /// Returns the number of rows removed.
    pub fn clear_purchased(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|i| !i.checked);
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Rows still to buy.
    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|i| !i.checked).count()
    }

    /// Display view: one entry per distinct name, in first-seen order.
    pub fn merged(&self) -> Vec<MergedItem> {
        let mut merged: Vec<MergedItem> = Vec::new();

        for item in &self.items {
            match merged.iter_mut().find(|m| m.name == item.name) {
                Some(entry) => entry.absorb(item),
                None => merged.push(MergedItem::from_ingredient(item)),
            }
        }

        merged
    }

    /// Merged view grouped by category, categories sorted by name.
    pub fn by_category(&self) -> BTreeMap<String, Vec<MergedItem>> {
        let mut groups: BTreeMap<String, Vec<MergedItem>> = BTreeMap::new();
        for item in self.merged() {
            groups.entry(item.category.clone()).or_default().push(item);
        }
        groups
    }
}

/// One display line of the shopping list, standing for every row that shares
/// its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedItem {
    pub name: IngredientName,
    /// Distinct quantities of the merged rows
    pub quantities: Vec<String>,
    /// Distinct recipes the merged rows came from
    pub sources: Vec<String>,
    /// Category of the first row
    pub category: String,
    /// True only when every merged row is checked
    pub checked: bool,
}

impl MergedItem {
    fn from_ingredient(item: &Ingredient) -> Self {
        Self {
            name: item.name.clone(),
            quantities: vec![item.quantity.clone()],
            sources: item.source_recipe.iter().cloned().collect(),
            category: item.category.clone(),
            checked: item.checked,
        }
    }

    fn absorb(&mut self, item: &Ingredient) {
        if !self.quantities.contains(&item.quantity) {
            self.quantities.push(item.quantity.clone());
        }
        if let Some(source) = &item.source_recipe {
            if !self.sources.contains(source) {
                self.sources.push(source.clone());
            }
        }
        self.checked = self.checked && item.checked;
    }

    pub fn quantity(&self) -> String {
        self.quantities.join(" + ")
    }
}

impl fmt::Display for MergedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.checked { "[x]" } else { "[ ]" };
        write!(f, "{} {:<25} {}", check, self.name, self.quantity())?;
        if !self.sources.is_empty() {
            write!(f, "  ({})", self.sources.join(", "))?;
        }
        Ok(())
    }
}
