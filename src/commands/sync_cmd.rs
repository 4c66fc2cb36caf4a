//! Household sync commands.

use clap::{Args, Subcommand};

use chefgenie_core::Planner;

#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub command: Option<SyncSubcommand>,
}

#[derive(Subcommand)]
pub enum SyncSubcommand {
    /// Show the household code and sync state
    Status,

    /// Join a household with an existing code
    Connect {
        /// Household code, e.g. CHEF-K3Q9ZP1
        code: String,
    },

    /// Start a new household with a fresh code
    New,

    /// Stop syncing and forget the household code
    Disconnect,

    /// Save the current state to the household now
    Push,

    /// Load the household state now
    Pull,
}

impl SyncCommand {
    pub async fn run(&self, planner: &mut Planner) -> Result<(), Box<dyn std::error::Error>> {
        match self.command.as_ref().unwrap_or(&SyncSubcommand::Status) {
            SyncSubcommand::Status => {
                match planner.code() {
                    Some(code) => println!("Household code: {}", code),
                    None => println!("Household code: (none)"),
                }
                if planner.is_sync_configured() {
                    println!("Sync: enabled");
                } else {
                    println!("Sync: not configured (set sync.project_id in config)");
                }
            }
            SyncSubcommand::Connect { code } => {
                let code = planner.connect(code)?;
                println!("Connected to household {}", code);
            }
            SyncSubcommand::New => {
                let code = planner.generate_code()?;
                println!("New household code: {}", code);
                println!("Enter it on your other devices with `sync connect {}`.", code);
            }
            SyncSubcommand::Disconnect => {
                planner.disconnect()?;
                println!("Disconnected. Local data is kept.");
            }
            SyncSubcommand::Push => {
                planner.push_now().await;
            }
            SyncSubcommand::Pull => {
                planner.pull_now().await;
            }
        }
        Ok(())
    }
}
