//! Stagehand CLI - plan and resolve payload documents

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use stagehand::error::{FixSuggestion, StagehandError};
use stagehand::{PayloadDocument, Resolver, StagehandConfig, UnplannablePolicy};

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Stagehand - staged resolution of async payloads")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stage plan of a payload document
    Plan {
        /// Path to the payload YAML file
        file: String,
    },

    /// Resolve a payload document and print the result as JSON
    Resolve {
        /// Path to the payload YAML file
        file: String,

        /// Extra argument passed to every producer (JSON, repeatable)
        #[arg(short, long = "arg")]
        args: Vec<String>,

        /// Skip entries that can never be planned instead of failing
        #[arg(long)]
        drop_unplannable: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Plan { file } => plan_document(&file).await,
        Commands::Resolve {
            file,
            args,
            drop_unplannable,
        } => resolve_document(&file, &args, drop_unplannable).await,
        Commands::Config { action } => handle_config_command(action),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config() -> Result<StagehandConfig, StagehandError> {
    Ok(StagehandConfig::load()?.with_env())
}

async fn read_document(file: &str) -> Result<PayloadDocument, StagehandError> {
    let yaml = tokio::fs::read_to_string(file).await?;
    PayloadDocument::from_yaml(&yaml)
}

async fn plan_document(file: &str) -> Result<(), StagehandError> {
    let payload = read_document(file).await?.into_payload()?;
    let resolver = Resolver::new(load_config()?.resolver);
    let plan = resolver.plan(&payload)?;

    println!(
        "{} {} stages for {} entries",
        "→".cyan(),
        plan.len(),
        payload.len()
    );
    print!("{}", plan);
    if !plan.is_complete() {
        println!(
            "  {} cycle: {}",
            "!".yellow(),
            plan.cycle_path().yellow()
        );
    }
    Ok(())
}

async fn resolve_document(
    file: &str,
    raw_args: &[String],
    drop_unplannable: bool,
) -> Result<(), StagehandError> {
    let payload = read_document(file).await?.into_payload()?;
    let args = raw_args
        .iter()
        .map(|raw| serde_json::from_str(raw))
        .collect::<Result<Vec<Value>, _>>()?;

    let mut config = load_config()?.resolver;
    if drop_unplannable {
        config.unplannable = UnplannablePolicy::Drop;
    }

    let resolved = Resolver::new(config).run(payload, &args).await?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

fn handle_config_command(action: ConfigAction) -> Result<(), StagehandError> {
    match action {
        ConfigAction::Show => {
            let config = load_config()?;
            let rendered =
                toml::to_string_pretty(&config).map_err(|e| StagehandError::ConfigError {
                    reason: format!("Failed to serialize config: {}", e),
                })?;
            print!("{}", rendered);
        }
        ConfigAction::Path => println!("{}", StagehandConfig::config_path().display()),
    }
    Ok(())
}
