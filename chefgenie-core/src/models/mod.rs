mod history_item;
mod ingredient;
mod meal_type;
mod nutrition;
mod recipe;
mod settings;
mod sync_data;

pub use history_item::HistoryItem;
pub use ingredient::{Ingredient, IngredientName, CATEGORIES, MANUAL_CATEGORY};
pub use meal_type::MealType;
pub use nutrition::Nutrition;
pub use recipe::{sort_plan, Recipe};
pub use settings::{
    GenerationSettings, MealSelection, ValidationError, DEFAULT_REGENERATE_OPTION,
    GUIDELINE_OPTIONS, MAX_DAYS, MIN_DAYS, REGENERATE_OPTIONS,
};
pub use sync_data::SyncData;
