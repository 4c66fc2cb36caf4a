use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod shell;

use chefgenie_core::{
    DocumentStore, FirestoreStore, GeminiService, LocalStorage, Planner, RecipeGenerator,
};
use config::Config;

#[derive(Parser)]
#[command(name = "chefgenie")]
#[command(version)]
#[command(about = "Plan meals, build shopping lists and share them with your household", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Join this household on startup
    #[arg(long)]
    code: Option<String>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chefgenie=info,chefgenie_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    if cli.show_config {
        print_config(&config);
        return Ok(());
    }

    let api_key = match &config.generation.api_key {
        Some(key) => key.clone(),
        None => {
            tracing::warn!("No Gemini API key configured; set GEMINI_API_KEY");
            String::new()
        }
    };
    let service = GeminiService::new(api_key)
        .with_model(config.generation.model())
        .with_base_url(config.generation.base_url());

    let store: Option<Arc<dyn DocumentStore>> = match &config.sync.project_id {
        Some(project_id) => Some(Arc::new(
            FirestoreStore::new(project_id.clone(), config.sync.api_key.clone())
                .with_poll_interval(config.sync.poll_interval()),
        )),
        None => {
            tracing::info!("Household sync disabled; no sync.project_id configured");
            None
        }
    };

    let mut planner = Planner::new(
        RecipeGenerator::new(Arc::new(service)),
        LocalStorage::new(config.data_dir.value.clone()),
    )
    .with_store(store)
    .with_quiet_period(config.sync.debounce());
    planner.start()?;

    if let Some(code) = &cli.code {
        planner.connect(code)?;
    }
    if let Some(code) = planner.code() {
        println!("Household code: {}", code);
    }

    shell::run(planner).await
}

fn print_config(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        ),
    }
    println!();

    println!("data_dir: {}", config.data_dir.value.display());
    println!("  source: {}", config.data_dir.source);
    println!();

    println!("generation.model: {}", config.generation.model());
    println!(
        "generation.api_key: {}",
        if config.generation.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!();

    match &config.sync.project_id {
        Some(project) => println!("sync.project_id: {}", project),
        None => println!("sync.project_id: not set (sync disabled)"),
    }
    println!("sync.debounce: {:?}", config.sync.debounce());
    println!("sync.poll_interval: {:?}", config.sync.poll_interval());
}
