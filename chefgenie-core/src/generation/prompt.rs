//! Prompt construction for generation and regeneration requests.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::models::{GenerationSettings, HistoryItem, MealType, Recipe};

/// Upper bound on favorites woven into a single plan.
pub const MAX_FAVORITES: usize = 3;

const CHEF_MADE: &str = "Chef Made";

const METRIC_DIRECTIVE: &str =
    "IMPORTANT: Use METRIC units (grams, milliliters, celsius) for all measurements.";

/// Picks up to [`MAX_FAVORITES`] starred recipes whose meal type is part of
/// the requested plan.
pub fn select_favorites<R: Rng + ?Sized>(
    settings: &GenerationSettings,
    pool: &[HistoryItem],
    rng: &mut R,
) -> Vec<String> {
    let mut compatible: Vec<String> = pool
        .iter()
        .filter(|item| item.is_starred && settings.meals.includes(item.recipe.meal_type))
        .map(|item| item.name().to_string())
        .collect();

    compatible.shuffle(rng);
    let count = rng.random_range(0..=MAX_FAVORITES);
    compatible.truncate(count);
    compatible
}

pub fn generation_prompt(settings: &GenerationSettings, favorites: &[String]) -> String {
    let meal_types: Vec<&str> = settings
        .meals
        .meal_types()
        .into_iter()
        .map(|m| m.as_str())
        .collect();

    let guidelines = if settings.guidelines.is_empty() {
        "None specified".to_string()
    } else {
        settings.guidelines.join(", ")
    };

    let mut prompt = String::new();
    prompt.push_str(&format!("Generate a meal plan for {} days.\n", settings.days));
    prompt.push_str(&format!(
        "Include the following meal types for each day: {}.\n\n",
        meal_types.join(", ")
    ));
    prompt.push_str(&format!(
        "Portion each recipe for {} adults and {} children.\n\n",
        settings.adults, settings.kids
    ));
    prompt.push_str(&format!(
        "Dietary Guidelines & Preferences: {}.\n",
        guidelines
    ));
    if settings.guidelines.iter().any(|g| g == CHEF_MADE) {
        prompt.push_str(
            "For 'Chef Made' recipes, create gourmet, restaurant-quality dishes with \
             detailed steps and comprehensive ingredient lists.\n",
        );
    }
    prompt.push('\n');
    prompt.push_str(METRIC_DIRECTIVE);
    prompt.push_str("\n\n");

    if !favorites.is_empty() {
        prompt.push_str(&format!(
            "You MUST include these {} favorite recipes (or extremely close variations) \
             in the plan: {}. IMPORTANT: For these specific favorite recipes, IGNORE the \
             dietary guidelines provided above and generate them in their traditional/classic \
             style, but adjusted for the requested portion sizes.\n\n",
            favorites.len(),
            favorites.join(", ")
        ));
    }

    prompt.push_str("Ensure the shopping list categories are accurate.\n");
    prompt.push_str("Provide nutrition facts for every recipe.\n");
    prompt
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Replacement<'a> {
    day: u32,
    meal_type: MealType,
    old_name: &'a str,
}

/// Options joined by ", ", followed by the custom instruction if any.
pub fn regeneration_instruction(options: &[String], custom: Option<&str>) -> String {
    let mut instruction = options.join(", ");
    if let Some(custom) = custom.map(str::trim).filter(|c| !c.is_empty()) {
        instruction.push_str(&format!(". Additional specific instruction: {}", custom));
    }
    instruction
}

pub fn regeneration_prompt(
    to_replace: &[&Recipe],
    options: &[String],
    custom: Option<&str>,
) -> Result<String, serde_json::Error> {
    let replacements: Vec<Replacement<'_>> = to_replace
        .iter()
        .map(|r| Replacement {
            day: r.day,
            meal_type: r.meal_type,
            old_name: &r.name,
        })
        .collect();
    let listing = serde_json::to_string(&replacements)?;

    let mut prompt = format!(
        "I have a list of recipes. I want to REGENERATE specific recipes based on these \
         instructions: \"{}\".\n\n",
        regeneration_instruction(options, custom)
    );
    prompt.push_str(METRIC_DIRECTIVE);
    prompt.push_str("\n\n");
    prompt.push_str(
        "Here are the recipes to regenerate (keep the same Day and Meal Type, but change the dish):\n",
    );
    prompt.push_str(&listing);
    prompt.push_str("\n\n");
    prompt.push_str(
        "Please return a valid JSON object containing ONLY the new versions of these specific \
         recipes.\nUse the same schema as before, including nutrition info.\n",
    );
    Ok(prompt)
}
