//! Cookbook commands.

use clap::Args;

use chefgenie_core::Planner;

#[derive(Args)]
pub struct HistoryCommand {
    /// Only show recipes whose name contains this text
    #[arg(long, short)]
    search: Option<String>,

    /// Only show starred recipes
    #[arg(long)]
    starred: bool,

    /// Print the full recipe with this ID
    #[arg(long)]
    show: Option<String>,
}

impl HistoryCommand {
    pub fn run(&self, planner: &mut Planner) {
        let history = &planner.state().history;

        if let Some(id) = &self.show {
            match history.get(id) {
                Some(item) => println!("{}", item.recipe),
                None => println!("No cookbook recipe with ID '{}'.", id),
            }
            return;
        }

        let items = history.search(self.search.as_deref().unwrap_or(""));
        let items: Vec<_> = items
            .into_iter()
            .filter(|item| !self.starred || item.is_starred)
            .collect();

        if items.is_empty() {
            println!("No recipes found.");
            return;
        }
        for item in &items {
            println!("{}  {}", item, item.id());
        }
        println!("\n{} recipes", items.len());
    }
}

#[derive(Args)]
pub struct StarCommand {
    /// Cookbook recipe ID (see `history`)
    id: String,
}

impl StarCommand {
    pub fn run(&self, planner: &mut Planner) -> Result<(), Box<dyn std::error::Error>> {
        match planner.toggle_star(&self.id) {
            Some(true) => println!("Starred '{}'", self.id),
            Some(false) => println!("Unstarred '{}'", self.id),
            None => return Err(format!("No cookbook recipe with ID '{}'", self.id).into()),
        }
        Ok(())
    }
}
