use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-serving nutrition facts, kept as the strings the model writes
/// ("500 kcal", "25g").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fats: String,
}

impl Nutrition {
    pub fn new(
        calories: impl Into<String>,
        protein: impl Into<String>,
        carbs: impl Into<String>,
        fats: impl Into<String>,
    ) -> Self {
        Self {
            calories: calories.into(),
            protein: protein.into(),
            carbs: carbs.into(),
            fats: fats.into(),
        }
    }
}

impl fmt::Display for Nutrition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | protein {} | carbs {} | fats {}",
            self.calories, self.protein, self.carbs, self.fats
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrition_display() {
        let nutrition = Nutrition::new("500 kcal", "25g", "40g", "15g");
        assert_eq!(
            format!("{}", nutrition),
            "500 kcal | protein 25g | carbs 40g | fats 15g"
        );
    }
}
