use serde::{Deserialize, Serialize};
use std::fmt;

use super::ingredient::Ingredient;
use super::meal_type::MealType;
use super::nutrition::Nutrition;

/// A generated recipe placed on a specific day and meal of the plan.
///
/// `id` comes from the generation service and is only unique within the
/// batch that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub day: u32,
    pub meal_type: MealType,
    pub prep_time: String,
    pub cook_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
}

impl Recipe {
    pub fn new(id: impl Into<String>, name: impl Into<String>, day: u32, meal_type: MealType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            day,
            meal_type,
            prep_time: String::new(),
            cook_time: String::new(),
            nutrition: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_times(mut self, prep: impl Into<String>, cook: impl Into<String>) -> Self {
        self.prep_time = prep.into();
        self.cook_time = cook.into();
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_instructions(mut self, instructions: Vec<String>) -> Self {
        self.instructions = instructions;
        self
    }

    /// Sort key placing recipes by day, then breakfast/lunch/dinner.
    pub fn plan_position(&self) -> (u32, u8) {
        (self.day, self.meal_type.rank())
    }
}

/// Orders a plan by ascending day, then meal rank. The sort is stable so
/// recipes sharing a slot keep their relative order.
pub fn sort_plan(recipes: &mut [Recipe]) {
    recipes.sort_by_key(Recipe::plan_position);
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("Day {} {}: {}", self.day, self.meal_type, self.name);
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.chars().count()))?;

        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        writeln!(f, "Prep: {}  Cook: {}", self.prep_time, self.cook_time)?;

        if let Some(nutrition) = &self.nutrition {
            writeln!(f, "Nutrition: {}", nutrition)?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.instructions.is_empty() {
            writeln!(f, "\nInstructions:")?;
            for (i, step) in self.instructions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, step)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_builder() {
        let recipe = Recipe::new("r1", "Shakshuka", 1, MealType::Breakfast)
            .with_description("Eggs poached in spiced tomato sauce")
            .with_times("10 mins", "20 mins")
            .with_ingredients(vec![Ingredient::new("Eggs", "4", "Dairy")])
            .with_instructions(vec!["Simmer sauce".into(), "Add eggs".into()]);

        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.instructions.len(), 2);
        assert_eq!(recipe.prep_time, "10 mins");
    }

    #[test]
    fn test_sort_plan_orders_by_day_then_meal() {
        let mut plan = vec![
            Recipe::new("a", "Stew", 2, MealType::Dinner),
            Recipe::new("b", "Toast", 2, MealType::Breakfast),
            Recipe::new("c", "Soup", 1, MealType::Lunch),
            Recipe::new("d", "Curry", 1, MealType::Dinner),
        ];

        sort_plan(&mut plan);

        let ids: Vec<&str> = plan.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "b", "a"]);
    }

    #[test]
    fn test_description_and_nutrition_are_optional() {
        let json = r#"{
            "id": "x1",
            "name": "Tacos",
            "day": 3,
            "mealType": "Dinner",
            "prepTime": "15 mins",
            "cookTime": "10 mins",
            "ingredients": [],
            "instructions": ["Assemble"]
        }"#;

        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert!(recipe.description.is_empty());
        assert!(recipe.nutrition.is_none());
        assert_eq!(recipe.meal_type, MealType::Dinner);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let json = r#"{"id": "x1", "name": "Tacos", "day": 3}"#;
        assert!(serde_json::from_str::<Recipe>(json).is_err());
    }

    #[test]
    fn test_recipe_display() {
        let recipe = Recipe::new("r1", "Pancakes", 1, MealType::Breakfast)
            .with_times("5 mins", "15 mins")
            .with_ingredients(vec![Ingredient::new("Flour", "200 g", "Pantry")])
            .with_instructions(vec!["Whisk".into()]);

        let output = format!("{}", recipe);
        assert!(output.contains("Day 1 Breakfast: Pancakes"));
        assert!(output.contains("200 g Flour"));
        assert!(output.contains("1. Whisk"));
    }
}
