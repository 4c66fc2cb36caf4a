//! Response schema sent with every generation request.
//!
//! Uses the OpenAPI subset accepted by `generationConfig.responseSchema`.

use serde_json::{json, Value};

use crate::models::{MealType, CATEGORIES};

fn ingredient_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "quantity": { "type": "STRING" },
            "category": {
                "type": "STRING",
                "description": format!("One of: {}", CATEGORIES.join(", "))
            }
        },
        "required": ["name", "quantity", "category"]
    })
}

fn nutrition_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "calories": { "type": "STRING", "description": "e.g. 500 kcal" },
            "protein": { "type": "STRING", "description": "e.g. 25g" },
            "carbs": { "type": "STRING", "description": "e.g. 40g" },
            "fats": { "type": "STRING", "description": "e.g. 15g" }
        },
        "required": ["calories", "protein", "carbs", "fats"]
    })
}

fn recipe_schema() -> Value {
    let meal_types: Vec<&str> = MealType::ALL.iter().map(MealType::as_str).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "STRING", "description": "A unique random string ID for this recipe" },
            "name": { "type": "STRING" },
            "description": { "type": "STRING", "description": "A short appetizing description" },
            "day": { "type": "INTEGER" },
            "mealType": { "type": "STRING", "enum": meal_types },
            "prepTime": { "type": "STRING", "description": "Preparation time (e.g., '15 mins')" },
            "cookTime": { "type": "STRING", "description": "Cooking time (e.g., '30 mins')" },
            "nutrition": nutrition_schema(),
            "ingredients": { "type": "ARRAY", "items": ingredient_schema() },
            "instructions": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": [
            "id", "name", "day", "mealType", "ingredients",
            "instructions", "prepTime", "cookTime", "nutrition"
        ]
    })
}

/// `{ recipes: Recipe[] }`
pub fn meal_plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "recipes": { "type": "ARRAY", "items": recipe_schema() }
        },
        "required": ["recipes"]
    })
}
