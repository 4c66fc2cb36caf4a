//! Shell commands.
//!
//! Each line typed into the shell is split into words and parsed with clap,
//! so every command gets the usual `--help` and argument errors.

mod history;
mod plan;
mod shopping;
mod sync_cmd;

use clap::{Parser, Subcommand};

use chefgenie_core::Planner;

pub use history::{HistoryCommand, StarCommand};
pub use plan::{print_plan, RegenCommand, SelectCommand, SettingsCommand};
pub use shopping::ShopCommand;
pub use sync_cmd::SyncCommand;

#[derive(Parser)]
#[command(name = "chefgenie", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand)]
pub enum ShellCommand {
    /// Generate a new meal plan from the current settings
    Generate,

    /// Show or change generation settings
    Settings(SettingsCommand),

    /// Show the current plan
    Plan,

    /// Select or deselect a recipe for regeneration
    Select(SelectCommand),

    /// Regenerate the selected recipes
    Regen(RegenCommand),

    /// Stop waiting for the running generation; its result is discarded
    Cancel,

    /// Save the current plan to the cookbook
    Commit,

    /// Manage the shopping list
    Shop(ShopCommand),

    /// Browse the cookbook
    History(HistoryCommand),

    /// Star or unstar a cookbook recipe
    Star(StarCommand),

    /// Household sync
    Sync(SyncCommand),

    /// Exit, sending any pending changes
    #[command(alias = "exit")]
    Quit,
}

/// What the shell should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl ShellCommand {
    pub async fn run(self, planner: &mut Planner) -> Result<Flow, Box<dyn std::error::Error>> {
        match self {
            ShellCommand::Generate => {
                planner.start_generation()?;
                println!("Generating your meal plan...");
            }
            ShellCommand::Settings(cmd) => cmd.run(planner)?,
            ShellCommand::Plan => print_plan(planner.state()),
            ShellCommand::Select(cmd) => cmd.run(planner),
            ShellCommand::Regen(cmd) => cmd.run(planner)?,
            ShellCommand::Cancel => {
                if planner.cancel_generation() {
                    println!("Cancelled.");
                } else {
                    println!("Nothing is generating.");
                }
            }
            ShellCommand::Commit => {
                let added = planner.commit_to_history();
                let skipped = planner.state().recipes.len() - added;
                println!("Added {} recipes to your cookbook.", added);
                if skipped > 0 {
                    println!("Skipped {} already in the cookbook.", skipped);
                }
            }
            ShellCommand::Shop(cmd) => cmd.run(planner),
            ShellCommand::History(cmd) => cmd.run(planner),
            ShellCommand::Star(cmd) => cmd.run(planner)?,
            ShellCommand::Sync(cmd) => cmd.run(planner).await?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

/// Splits a shell line into words. Double or single quotes group words,
/// so `shop add "olive oil"` yields three words.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {} quote", q));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
