//! Plan commands: settings, viewing, selection and regeneration.

use clap::Args;

use chefgenie_core::models::{
    MealSelection, MealType, DEFAULT_REGENERATE_OPTION, GUIDELINE_OPTIONS, REGENERATE_OPTIONS,
};
use chefgenie_core::{Planner, PlannerState};

#[derive(Args)]
pub struct SettingsCommand {
    /// Number of days to plan (1-14)
    #[arg(long, short)]
    days: Option<u32>,

    /// Meal types to include, comma separated (breakfast,lunch,dinner)
    #[arg(long, short, value_delimiter = ',')]
    meals: Option<Vec<MealType>>,

    /// Toggle a dietary guideline (repeatable)
    #[arg(long, short)]
    guideline: Vec<String>,

    /// Number of adults to portion for
    #[arg(long)]
    adults: Option<u32>,

    /// Number of children to portion for
    #[arg(long)]
    kids: Option<u32>,
}

impl SettingsCommand {
    pub fn run(&self, planner: &mut Planner) -> Result<(), Box<dyn std::error::Error>> {
        for guideline in &self.guideline {
            if !GUIDELINE_OPTIONS.contains(&guideline.as_str()) {
                return Err(format!(
                    "Unknown guideline '{}'. Options: {}",
                    guideline,
                    GUIDELINE_OPTIONS.join(", ")
                )
                .into());
            }
        }

        let settings = planner.settings_mut();
        if let Some(days) = self.days {
            settings.days = days;
        }
        if let Some(meals) = &self.meals {
            let mut selection = MealSelection {
                breakfast: false,
                lunch: false,
                dinner: false,
            };
            for meal in meals {
                selection.set(*meal, true);
            }
            settings.meals = selection;
        }
        for guideline in &self.guideline {
            settings.toggle_guideline(guideline);
        }
        if let Some(adults) = self.adults {
            settings.adults = adults;
        }
        if let Some(kids) = self.kids {
            settings.kids = kids;
        }

        let settings = &planner.state().settings;
        println!("Days:       {}", settings.days);
        println!("Meals:      {}", meal_list(&settings.meals));
        println!(
            "Guidelines: {}",
            if settings.guidelines.is_empty() {
                "none".to_string()
            } else {
                settings.guidelines.join(", ")
            }
        );
        println!(
            "Portions:   {} adults, {} kids",
            settings.adults, settings.kids
        );
        Ok(())
    }
}

#[derive(Args)]
pub struct SelectCommand {
    /// Recipe ID (see `plan`)
    id: String,
}

impl SelectCommand {
    pub fn run(&self, planner: &mut Planner) {
        if !planner.state().recipes.iter().any(|r| r.id == self.id) {
            println!("No recipe with ID '{}' in the current plan.", self.id);
            return;
        }
        let selected = planner.toggle_selection(&self.id);
        println!(
            "{} '{}' ({} selected)",
            if selected { "Selected" } else { "Deselected" },
            self.id,
            planner.state().selected.len()
        );
    }
}

#[derive(Args)]
pub struct RegenCommand {
    /// How to change the selected recipes (repeatable)
    #[arg(long, short)]
    option: Vec<String>,

    /// Free-form instruction added to the request
    #[arg(long, short)]
    custom: Option<String>,
}

impl RegenCommand {
    pub fn run(&self, planner: &mut Planner) -> Result<(), Box<dyn std::error::Error>> {
        let options = if self.option.is_empty() {
            vec![DEFAULT_REGENERATE_OPTION.to_string()]
        } else {
            for option in &self.option {
                if !REGENERATE_OPTIONS.contains(&option.as_str()) {
                    return Err(format!(
                        "Unknown option '{}'. Options: {}",
                        option,
                        REGENERATE_OPTIONS.join(", ")
                    )
                    .into());
                }
            }
            self.option.clone()
        };

        let count = planner.state().selected.len();
        planner.start_regeneration(options, self.custom.clone())?;
        println!("Regenerating {} recipes...", count);
        Ok(())
    }
}

/// Prints the plan as a table, grouped by day.
pub fn print_plan(state: &PlannerState) {
    if state.recipes.is_empty() {
        println!("No plan yet. Use `generate` to create one.");
        return;
    }

    println!(
        "{:<3} {:<4} {:<10} {:<36} {:<12}",
        "", "DAY", "MEAL", "NAME", "ID"
    );
    println!("{}", "-".repeat(68));
    for recipe in &state.recipes {
        let mark = if state.selected.contains(&recipe.id) {
            "[x]"
        } else {
            "[ ]"
        };
        println!(
            "{:<3} {:<4} {:<10} {:<36} {:<12}",
            mark,
            recipe.day,
            recipe.meal_type.as_str(),
            truncate(&recipe.name, 34),
            recipe.id
        );
    }
    println!("\n{} recipes", state.recipes.len());
}

fn meal_list(meals: &MealSelection) -> String {
    meals
        .meal_types()
        .into_iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max - 3).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_list() {
        let meals = MealSelection {
            breakfast: true,
            lunch: false,
            dinner: true,
        };
        assert_eq!(meal_list(&meals), "Breakfast, Dinner");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Soup", 10), "Soup");
        assert_eq!(truncate("Slow Cooker Chicken", 10), "Slow Co...");
    }
}
