//! Shopping list commands.

use clap::{Args, Subcommand, ValueEnum};

use chefgenie_core::{Planner, ShoppingList};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Args)]
pub struct ShopCommand {
    #[command(subcommand)]
    pub command: Option<ShopSubcommand>,
}

#[derive(Subcommand)]
pub enum ShopSubcommand {
    /// List items, merged by name and grouped by category
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Add an item by hand
    Add {
        /// Item name
        name: String,

        /// Quantity (default: 1)
        #[arg(long, short)]
        qty: Option<String>,
    },

    /// Check or uncheck every row with this name
    Toggle {
        /// Item name
        name: String,
    },

    /// Remove checked items
    ClearPurchased,

    /// Remove every item
    Clear,
}

impl ShopCommand {
    pub fn run(&self, planner: &mut Planner) {
        let list_table = ShopSubcommand::List {
            format: OutputFormat::Table,
        };
        match self.command.as_ref().unwrap_or(&list_table) {
            ShopSubcommand::List { format } => match format {
                OutputFormat::Table => print_list(&planner.state().shopping),
                OutputFormat::Json => match serde_json::to_string_pretty(&planner.state().shopping)
                {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Error: {}", e),
                },
            },
            ShopSubcommand::Add { name, qty } => {
                if planner.add_item(name, qty.as_deref()) {
                    println!("Added '{}'", name.trim());
                } else {
                    println!("Item name cannot be blank.");
                }
            }
            ShopSubcommand::Toggle { name } => match planner.toggle_item(name) {
                0 => println!("'{}' is not on the list.", name),
                _ => {
                    let state = if planner.state().shopping.is_checked(name) {
                        "checked"
                    } else {
                        "unchecked"
                    };
                    println!("'{}' {}", name, state);
                }
            },
            ShopSubcommand::ClearPurchased => {
                let removed = planner.clear_purchased();
                println!("Removed {} purchased items.", removed);
            }
            ShopSubcommand::Clear => {
                planner.clear_shopping();
                println!("Shopping list cleared.");
            }
        }
    }
}

fn print_list(list: &ShoppingList) {
    if list.is_empty() {
        println!("Your shopping list is empty.");
        return;
    }

    for (category, items) in list.by_category() {
        println!("{}", category);
        for item in items {
            println!("  {}", item);
        }
        println!();
    }
    println!("{} of {} items remaining", list.remaining(), list.len());
}
