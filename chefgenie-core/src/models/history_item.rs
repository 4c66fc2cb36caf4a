use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::recipe::Recipe;

/// A recipe committed to the cookbook.
///
/// The embedded recipe carries a fresh id; `original_id` keeps the id the
/// recipe had in the plan it was committed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(default)]
    pub is_starred: bool,
    pub date_added: DateTime<Utc>,
    pub original_id: String,
}

impl HistoryItem {
    pub fn from_recipe(recipe: &Recipe, date_added: DateTime<Utc>) -> Self {
        let mut copy = recipe.clone();
        copy.id = Uuid::new_v4().to_string();
        Self {
            recipe: copy,
            is_starred: false,
            date_added,
            original_id: recipe.id.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.recipe.id
    }

    pub fn name(&self) -> &str {
        &self.recipe.name
    }

    pub fn toggle_star(&mut self) -> bool {
        self.is_starred = !self.is_starred;
        self.is_starred
    }
}

impl fmt::Display for HistoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let star = if self.is_starred { "*" } else { " " };
        write!(
            f,
            "[{}] {:<36} {:<9} added {}",
            star,
            self.recipe.name,
            self.recipe.meal_type,
            self.date_added.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;

    #[test]
    fn test_from_recipe_assigns_new_id() {
        let recipe = Recipe::new("abc", "Ramen", 1, MealType::Dinner);
        let item = HistoryItem::from_recipe(&recipe, Utc::now());

        assert_ne!(item.id(), "abc");
        assert_eq!(item.original_id, "abc");
        assert_eq!(item.name(), "Ramen");
        assert!(!item.is_starred);
    }

    #[test]
    fn test_ids_are_distinct_within_same_instant() {
        let recipe = Recipe::new("abc", "Ramen", 1, MealType::Dinner);
        let now = Utc::now();
        let first = HistoryItem::from_recipe(&recipe, now);
        let second = HistoryItem::from_recipe(&recipe, now);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_wire_format_flattens_recipe() {
        let recipe = Recipe::new("abc", "Ramen", 2, MealType::Lunch);
        let item = HistoryItem::from_recipe(&recipe, Utc::now());
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["name"], "Ramen");
        assert_eq!(json["mealType"], "Lunch");
        assert_eq!(json["originalId"], "abc");
        assert_eq!(json["isStarred"], false);
        assert!(json["dateAdded"].is_string());

        let parsed: HistoryItem = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_toggle_star() {
        let recipe = Recipe::new("abc", "Ramen", 1, MealType::Dinner);
        let mut item = HistoryItem::from_recipe(&recipe, Utc::now());
        assert!(item.toggle_star());
        assert!(!item.toggle_star());
    }
}
