//! ChefGenie Core Library
//!
//! Meal plan generation, shopping lists, the recipe cookbook and household
//! sync.

pub mod generation;
pub mod history;
pub mod household;
pub mod models;
pub mod planner;
pub mod shopping;
pub mod storage;
pub mod sync;

pub use generation::{
    GeminiService, GenerationError, GenerationRequest, GenerationService, RecipeGenerator,
};
pub use history::History;
pub use household::HouseholdCode;
pub use models::{
    GenerationSettings, HistoryItem, Ingredient, IngredientName, MealSelection, MealType,
    Nutrition, Recipe, SyncData, ValidationError,
};
pub use planner::{Planner, PlannerError, PlannerEvent, PlannerState, RequestKind};
pub use shopping::{MergedItem, ShoppingList};
pub use storage::{LocalStorage, StorageError};
pub use sync::{
    DocumentSnapshot, DocumentStore, FirestoreStore, MemoryDocumentStore, Origin, PushScheduler,
    StateChange, Subscription, SyncCoordinator, SyncError,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
