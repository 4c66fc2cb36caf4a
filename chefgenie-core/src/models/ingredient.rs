use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Shopping categories advertised to the generation service.
pub const CATEGORIES: [&str; 9] = [
    "Produce",
    "Meat",
    "Dairy",
    "Bakery",
    "Frozen",
    "Pantry",
    "Beverages",
    "Household",
    "Other",
];

/// Category given to items the user adds by hand.
pub const MANUAL_CATEGORY: &str = "Other";

/// The identity of an ingredient on the shopping list.
///
/// Rows are merged and toggled by exact, case-sensitive name. Two rows with
/// the same name are the same item as far as the list is concerned, even if
/// they came from different recipes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientName(String);

impl IngredientName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for IngredientName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for IngredientName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for IngredientName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for IngredientName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for IngredientName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for IngredientName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for IngredientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: IngredientName,
    /// Free-form amount as written by the recipe ("200 g", "a pinch")
    pub quantity: String,
    pub category: String,
    #[serde(default)]
    pub checked: bool,
    /// Name of the recipe this row was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_recipe: Option<String>,
}

impl Ingredient {
    pub fn new(
        name: impl Into<IngredientName>,
        quantity: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            category: category.into(),
            checked: false,
            source_recipe: None,
        }
    }

    pub fn with_source(mut self, recipe_name: impl Into<String>) -> Self {
        self.source_recipe = Some(recipe_name.into());
        self
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantity.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.quantity, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_new() {
        let ingredient = Ingredient::new("Flour", "500 g", "Pantry");
        assert_eq!(ingredient.name, "Flour");
        assert_eq!(ingredient.quantity, "500 g");
        assert_eq!(ingredient.category, "Pantry");
        assert!(!ingredient.checked);
        assert!(ingredient.source_recipe.is_none());
    }

    #[test]
    fn test_ingredient_display() {
        let ingredient = Ingredient::new("Flour", "500 g", "Pantry");
        assert_eq!(format!("{}", ingredient), "500 g Flour");

        let bare = Ingredient::new("Salt", "", "Pantry");
        assert_eq!(format!("{}", bare), "Salt");
    }

    #[test]
    fn test_name_is_case_sensitive() {
        assert_ne!(IngredientName::from("Milk"), IngredientName::from("milk"));
    }

    #[test]
    fn test_wire_format_uses_camel_case() {
        let ingredient = Ingredient::new("Basil", "1 bunch", "Produce").with_source("Pesto Pasta");
        let json = serde_json::to_value(&ingredient).unwrap();
        assert_eq!(json["name"], "Basil");
        assert_eq!(json["sourceRecipe"], "Pesto Pasta");
        assert_eq!(json["checked"], false);
    }

    #[test]
    fn test_checked_defaults_when_absent() {
        // Generated recipes never carry a checked flag
        let parsed: Ingredient =
            serde_json::from_str(r#"{"name":"Eggs","quantity":"6","category":"Dairy"}"#).unwrap();
        assert!(!parsed.checked);
        assert!(parsed.source_recipe.is_none());
    }
}
