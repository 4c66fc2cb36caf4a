//! Meal plan generation through a structured-output language model.
//!
//! [`RecipeGenerator`] builds prompts and parses plans; the transport sits
//! behind the [`GenerationService`] trait so tests can answer with canned
//! JSON. [`GeminiService`] is the production backend.

mod client;
mod error;
mod gemini;
mod prompt;
mod schema;

pub use client::{parse_recipes, GenerationRequest, GenerationService, RecipeGenerator};
pub use error::GenerationError;
pub use gemini::{GeminiService, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use prompt::{regeneration_instruction, select_favorites, MAX_FAVORITES};
pub use schema::meal_plan_schema;
