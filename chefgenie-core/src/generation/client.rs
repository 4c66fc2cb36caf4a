use futures::future::BoxFuture;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::error::GenerationError;
use super::prompt::{generation_prompt, regeneration_prompt, select_favorites};
use super::schema::meal_plan_schema;
use crate::models::{sort_plan, GenerationSettings, HistoryItem, Recipe};

/// A single structured-output request: the prompt and the JSON schema the
/// answer must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub schema: Value,
}

/// A backend that turns a prompt into JSON text.
pub trait GenerationService: Send + Sync {
    fn generate_json(&self, request: GenerationRequest)
        -> BoxFuture<'_, Result<String, GenerationError>>;
}

#[derive(Deserialize)]
struct MealPlanResponse {
    #[serde(default)]
    recipes: Vec<Recipe>,
}

/// Parses the `{ recipes: [...] }` envelope. Blank text is an empty plan.
pub fn parse_recipes(text: &str) -> Result<Vec<Recipe>, GenerationError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let response: MealPlanResponse = serde_json::from_str(text)?;
    Ok(response.recipes)
}

/// Gives every recipe an id unused by `taken` and by the recipes before it.
/// Model ids are only unique within one response, so a colliding or blank id
/// is replaced with a fresh short one.
fn assign_plan_ids(recipes: &mut [Recipe], taken: &mut HashSet<String>) {
    for recipe in recipes {
        if !recipe.id.is_empty() && taken.insert(recipe.id.clone()) {
            continue;
        }
        let id = loop {
            let candidate = Uuid::new_v4().simple().to_string()[..8].to_string();
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        tracing::debug!(
            "Re-keying '{}' from id '{}' to '{}'",
            recipe.name,
            recipe.id,
            id
        );
        taken.insert(id.clone());
        recipe.id = id;
    }
}

/// Generates and regenerates meal plans through a [`GenerationService`].
#[derive(Clone)]
pub struct RecipeGenerator {
    service: Arc<dyn GenerationService>,
}

impl RecipeGenerator {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }

    /// Generates a fresh plan, weaving in a random handful of starred
    /// favorites from `favorites`.
    pub async fn generate(
        &self,
        settings: &GenerationSettings,
        favorites: &[HistoryItem],
    ) -> Result<Vec<Recipe>, GenerationError> {
        settings.validate()?;
        let chosen = select_favorites(settings, favorites, &mut rand::rng());
        self.request_plan(settings, &chosen).await
    }

    /// Like [`generate`](Self::generate) with a caller-supplied random source.
    pub async fn generate_with<R: Rng + ?Sized>(
        &self,
        settings: &GenerationSettings,
        favorites: &[HistoryItem],
        rng: &mut R,
    ) -> Result<Vec<Recipe>, GenerationError> {
        settings.validate()?;
        let chosen = select_favorites(settings, favorites, rng);
        self.request_plan(settings, &chosen).await
    }

    async fn request_plan(
        &self,
        settings: &GenerationSettings,
        favorites: &[String],
    ) -> Result<Vec<Recipe>, GenerationError> {
        tracing::info!(
            "Generating {} day plan ({} favorites)",
            settings.days,
            favorites.len()
        );
        let request = GenerationRequest {
            prompt: generation_prompt(settings, favorites),
            schema: meal_plan_schema(),
        };
        let text = self.service.generate_json(request).await?;
        let mut recipes = parse_recipes(&text)?;
        assign_plan_ids(&mut recipes, &mut HashSet::new());
        sort_plan(&mut recipes);
        tracing::debug!("Received {} recipes", recipes.len());
        Ok(recipes)
    }

    /// Replaces the recipes whose ids are in `ids`, keeping every other
    /// recipe as is. The merged plan is ordered by day, then meal, and its
    /// ids stay unique.
    ///
    /// Returns `current` untouched, without calling the service, when no id
    /// matches.
    pub async fn regenerate(
        &self,
        current: &[Recipe],
        ids: &[String],
        options: &[String],
        custom: Option<&str>,
    ) -> Result<Vec<Recipe>, GenerationError> {
        let (to_replace, kept): (Vec<&Recipe>, Vec<&Recipe>) =
            current.iter().partition(|r| ids.contains(&r.id));

        if to_replace.is_empty() {
            return Ok(current.to_vec());
        }

        tracing::info!("Regenerating {} recipes", to_replace.len());
        let request = GenerationRequest {
            prompt: regeneration_prompt(&to_replace, options, custom)?,
            schema: meal_plan_schema(),
        };
        let text = self.service.generate_json(request).await?;
        let mut replacements = parse_recipes(&text)?;
        let mut taken: HashSet<String> = kept.iter().map(|r| r.id.clone()).collect();
        assign_plan_ids(&mut replacements, &mut taken);

        let mut merged: Vec<Recipe> = kept.into_iter().cloned().collect();
        merged.extend(replacements);
        sort_plan(&mut merged);
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealSelection, MealType, ValidationError};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies with canned text and records every request.
    struct StubService {
        reply: Result<String, u16>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl StubService {
        fn replying(text: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(status),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_prompt(&self) -> String {
            self.requests.lock().unwrap().last().unwrap().prompt.clone()
        }
    }

    impl GenerationService for StubService {
        fn generate_json(
            &self,
            request: GenerationRequest,
        ) -> BoxFuture<'_, Result<String, GenerationError>> {
            self.requests.lock().unwrap().push(request);
            let reply = match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(GenerationError::from_response(*status, "stub failure")),
            };
            Box::pin(async move { reply })
        }
    }

    fn recipe_json(id: &str, name: &str, day: u32, meal_type: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "description": "",
            "day": day,
            "mealType": meal_type,
            "prepTime": "10 mins",
            "cookTime": "20 mins",
            "nutrition": { "calories": "500 kcal", "protein": "20g", "carbs": "50g", "fats": "10g" },
            "ingredients": [ { "name": "Rice", "quantity": "200g", "category": "Pantry" } ],
            "instructions": ["Cook."]
        })
    }

    fn plan_text(recipes: Vec<Value>) -> String {
        json!({ "recipes": recipes }).to_string()
    }

    #[tokio::test]
    async fn test_generate_three_days_lunch_and_dinner() {
        let reply = plan_text(vec![
            recipe_json("6", "Stew", 3, "Dinner"),
            recipe_json("1", "Salad", 1, "Lunch"),
            recipe_json("4", "Curry", 2, "Dinner"),
            recipe_json("2", "Pasta", 1, "Dinner"),
            recipe_json("5", "Wrap", 3, "Lunch"),
            recipe_json("3", "Soup", 2, "Lunch"),
        ]);
        let service = StubService::replying(reply);
        let generator = RecipeGenerator::new(service.clone());
        let settings = GenerationSettings {
            days: 3,
            meals: MealSelection {
                breakfast: false,
                lunch: true,
                dinner: true,
            },
            guidelines: vec![],
            adults: 2,
            kids: 0,
        };

        let recipes = generator.generate(&settings, &[]).await.unwrap();

        let days: Vec<u32> = recipes.iter().map(|r| r.day).collect();
        assert_eq!(days, vec![1, 1, 2, 2, 3, 3]);
        assert!(recipes
            .iter()
            .all(|r| matches!(r.meal_type, MealType::Lunch | MealType::Dinner)));
        assert_eq!(recipes[0].meal_type, MealType::Lunch);
        assert_eq!(recipes[1].meal_type, MealType::Dinner);

        let prompt = service.last_prompt();
        assert!(prompt.contains("Generate a meal plan for 3 days."));
        assert!(prompt.contains("Lunch, Dinner"));
        assert!(prompt.contains("2 adults and 0 children"));
    }

    #[tokio::test]
    async fn test_generate_validation_never_calls_service() {
        let service = StubService::replying(plan_text(vec![]));
        let generator = RecipeGenerator::new(service.clone());

        let mut settings = GenerationSettings::default();
        settings.days = 0;
        let err = generator.generate(&settings, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Validation(ValidationError::DaysOutOfRange(0))
        ));

        let mut settings = GenerationSettings::default();
        settings.meals = MealSelection {
            breakfast: false,
            lunch: false,
            dinner: false,
        };
        let err = generator.generate(&settings, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Validation(ValidationError::NoMealsSelected)
        ));

        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_blank_or_missing_recipes_is_empty() {
        let generator = RecipeGenerator::new(StubService::replying("  "));
        let recipes = generator
            .generate(&GenerationSettings::default(), &[])
            .await
            .unwrap();
        assert!(recipes.is_empty());

        let generator = RecipeGenerator::new(StubService::replying("{}"));
        let recipes = generator
            .generate(&GenerationSettings::default(), &[])
            .await
            .unwrap();
        assert!(recipes.is_empty());
    }

    #[tokio::test]
    async fn test_generate_malformed_json_is_parse_error() {
        let generator = RecipeGenerator::new(StubService::replying("{not json"));
        let err = generator
            .generate(&GenerationSettings::default(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Parse(_)));
    }

    #[tokio::test]
    async fn test_generate_auth_failure() {
        let service = StubService::failing(403);
        let generator = RecipeGenerator::new(service.clone());
        let err = generator
            .generate(&GenerationSettings::default(), &[])
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_with_seeded_favorites() {
        let service = StubService::replying(plan_text(vec![]));
        let generator = RecipeGenerator::new(service.clone());
        let mut favorite = HistoryItem::from_recipe(
            &Recipe::new("f", "Grandma's Roast", 1, MealType::Dinner),
            chrono::Utc::now(),
        );
        favorite.is_starred = true;

        // Some seed eventually picks the single compatible favorite.
        let mut included = false;
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            generator
                .generate_with(&GenerationSettings::default(), &[favorite.clone()], &mut rng)
                .await
                .unwrap();
            if service.last_prompt().contains("Grandma's Roast") {
                included = true;
                break;
            }
        }
        assert!(included);
    }

    #[tokio::test]
    async fn test_regenerate_no_matching_ids_skips_service() {
        let service = StubService::replying(plan_text(vec![]));
        let generator = RecipeGenerator::new(service.clone());
        let current = vec![Recipe::new("a", "Soup", 1, MealType::Lunch)];

        let result = generator
            .regenerate(&current, &["missing".to_string()], &[], None)
            .await
            .unwrap();

        assert_eq!(result, current);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_regenerate_merges_and_sorts() {
        let service = StubService::replying(plan_text(vec![recipe_json(
            "n1",
            "Veggie Tacos",
            1,
            "Lunch",
        )]));
        let generator = RecipeGenerator::new(service.clone());
        let current = vec![
            Recipe::new("a", "Beef Tacos", 1, MealType::Lunch),
            Recipe::new("b", "Roast", 1, MealType::Dinner),
            Recipe::new("c", "Oats", 2, MealType::Breakfast),
        ];

        let result = generator
            .regenerate(
                &current,
                &["a".to_string()],
                &["Make it vegetarian".to_string()],
                Some("no beans"),
            )
            .await
            .unwrap();

        let names: Vec<&str> = result.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Veggie Tacos", "Roast", "Oats"]);

        let prompt = service.last_prompt();
        assert!(prompt.contains("Beef Tacos"));
        assert!(!prompt.contains("Roast"));
        assert!(prompt.contains("Additional specific instruction: no beans"));
    }

    #[tokio::test]
    async fn test_regenerate_rekeys_colliding_ids() {
        let current = vec![
            Recipe::new("1", "Beef Tacos", 1, MealType::Lunch),
            Recipe::new("2", "Roast", 1, MealType::Dinner),
        ];

        // The replacement reuses the id of the kept Roast.
        let generator = RecipeGenerator::new(StubService::replying(plan_text(vec![
            recipe_json("2", "Veggie Tacos", 1, "Lunch"),
        ])));
        let plan = generator
            .regenerate(&current, &["1".to_string()], &[], None)
            .await
            .unwrap();
        assert_eq!(plan[0].name, "Veggie Tacos");
        assert_eq!(plan[1].name, "Roast");
        assert_eq!(plan[1].id, "2");
        assert_ne!(plan[0].id, "2");

        // Replacing the Roast must leave the lunch slot alone.
        let service = StubService::replying(plan_text(vec![recipe_json(
            "9", "Lamb", 1, "Dinner",
        )]));
        let generator = RecipeGenerator::new(service.clone());
        let plan = generator
            .regenerate(&plan, &["2".to_string()], &[], None)
            .await
            .unwrap();

        let names: Vec<&str> = plan.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Veggie Tacos", "Lamb"]);
        assert!(!service.last_prompt().contains("Veggie Tacos"));
    }

    #[tokio::test]
    async fn test_generate_gives_unique_ids() {
        let reply = plan_text(vec![
            recipe_json("1", "Salad", 1, "Dinner"),
            recipe_json("1", "Soup", 2, "Dinner"),
            recipe_json("", "Stew", 3, "Dinner"),
        ]);
        let generator = RecipeGenerator::new(StubService::replying(reply));

        let recipes = generator
            .generate(&GenerationSettings::default(), &[])
            .await
            .unwrap();

        assert_eq!(recipes[0].id, "1");
        let ids: HashSet<&str> = recipes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(!ids.contains(""));
    }

    #[test]
    fn test_parse_recipes_reads_envelope() {
        let text = plan_text(vec![recipe_json("1", "Salad", 1, "Lunch")]);
        let recipes = parse_recipes(&text).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].ingredients[0].name, "Rice");
        assert!(recipes[0].nutrition.is_some());
    }
}
