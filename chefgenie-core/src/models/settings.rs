use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::meal_type::MealType;

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 14;

/// Guidelines offered when configuring a plan.
pub const GUIDELINE_OPTIONS: [&str; 12] = [
    "Kid Friendly",
    "Healthy",
    "Vegetarian",
    "Mediterranean",
    "Asian",
    "Mexican",
    "Italian",
    "Quick & Easy",
    "Budget Friendly",
    "Extravagant",
    "No Cook",
    "Chef Made",
];

/// Adjustments offered when regenerating selected recipes.
pub const REGENERATE_OPTIONS: [&str; 7] = [
    "Make more kid friendly",
    "Make it vegetarian",
    "More protein",
    "Different cuisine",
    "Quick and easy",
    "Budget friendly",
    "Surprise me",
];

pub const DEFAULT_REGENERATE_OPTION: &str = "Different cuisine";

/// Settings rejected before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please choose between {} and {} days.", MIN_DAYS, MAX_DAYS)]
    DaysOutOfRange(u32),

    #[error("Please select at least one meal type.")]
    NoMealsSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSelection {
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
}

impl MealSelection {
    pub fn includes(&self, meal_type: MealType) -> bool {
        match meal_type {
            MealType::Breakfast => self.breakfast,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
        }
    }

    pub fn set(&mut self, meal_type: MealType, enabled: bool) {
        match meal_type {
            MealType::Breakfast => self.breakfast = enabled,
            MealType::Lunch => self.lunch = enabled,
            MealType::Dinner => self.dinner = enabled,
        }
    }

    /// Selected meal types in serving order.
    pub fn meal_types(&self) -> Vec<MealType> {
        MealType::ALL
            .into_iter()
            .filter(|m| self.includes(*m))
            .collect()
    }

    pub fn any(&self) -> bool {
        self.breakfast || self.lunch || self.dinner
    }
}

impl Default for MealSelection {
    fn default() -> Self {
        Self {
            breakfast: false,
            lunch: false,
            dinner: true,
        }
    }
}

/// What the user asks the generator for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub days: u32,
    pub meals: MealSelection,
    pub guidelines: Vec<String>,
    pub adults: u32,
    pub kids: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            days: 5,
            meals: MealSelection::default(),
            guidelines: Vec::new(),
            adults: 2,
            kids: 0,
        }
    }
}

impl GenerationSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_DAYS..=MAX_DAYS).contains(&self.days) {
            return Err(ValidationError::DaysOutOfRange(self.days));
        }
        if !self.meals.any() {
            return Err(ValidationError::NoMealsSelected);
        }
        Ok(())
    }

    /// Adds the guideline if absent, removes it otherwise.
    /// Returns whether the guideline is now selected.
    pub fn toggle_guideline(&mut self, guideline: &str) -> bool {
        if let Some(pos) = self.guidelines.iter().position(|g| g == guideline) {
            self.guidelines.remove(pos);
            false
        } else {
            self.guidelines.push(guideline.to_string());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.days, 5);
        assert_eq!(settings.meals.meal_types(), vec![MealType::Dinner]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_days_out_of_range() {
        let mut settings = GenerationSettings::default();
        settings.days = 0;
        assert_eq!(settings.validate(), Err(ValidationError::DaysOutOfRange(0)));

        settings.days = 15;
        assert_eq!(
            settings.validate(),
            Err(ValidationError::DaysOutOfRange(15))
        );

        settings.days = 14;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_no_meals_selected() {
        let mut settings = GenerationSettings::default();
        settings.meals.set(MealType::Dinner, false);
        let err = settings.validate().unwrap_err();
        assert_eq!(err, ValidationError::NoMealsSelected);
        assert_eq!(err.to_string(), "Please select at least one meal type.");
    }

    #[test]
    fn test_days_message() {
        let err = ValidationError::DaysOutOfRange(20);
        assert_eq!(err.to_string(), "Please choose between 1 and 14 days.");
    }

    #[test]
    fn test_meal_types_in_serving_order() {
        let meals = MealSelection {
            breakfast: true,
            lunch: false,
            dinner: true,
        };
        assert_eq!(
            meals.meal_types(),
            vec![MealType::Breakfast, MealType::Dinner]
        );
    }

    #[test]
    fn test_toggle_guideline() {
        let mut settings = GenerationSettings::default();
        assert!(settings.toggle_guideline("Healthy"));
        assert_eq!(settings.guidelines, vec!["Healthy".to_string()]);
        assert!(!settings.toggle_guideline("Healthy"));
        assert!(settings.guidelines.is_empty());
    }
}
