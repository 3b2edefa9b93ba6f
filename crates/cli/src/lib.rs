pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use storefront_core::config::{ConfigOverrides, LoadOptions};
use storefront_core::PartnerFill;

#[derive(Debug, Parser)]
#[command(
    name = "storefront",
    about = "Storefront recommendation CLI",
    long_about = "Query recommendations, inspect configuration, and check artifact readiness.",
    after_help = "Examples:\n  storefront recommend 00a1b2 --limit 5\n  storefront also-bought 00a1b2\n  storefront search denim\n  storefront doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a storefront.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the artifact directory")]
    artifacts_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Override how co-purchase partners are collected")]
    partner_fill: Option<PartnerFill>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Personalized recommendations for a user")]
    Recommend {
        user_id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "Items bought together with a user's recent purchases")]
    AlsoBought {
        user_id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "Case-insensitive catalog search")]
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(about = "Run load and resolution checks with per-check timing details")]
    Smoke,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and report per-artifact readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                artifacts_dir: self.artifacts_dir.clone(),
                partner_fill: self.partner_fill,
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let result = match cli.command {
        Command::Recommend { user_id, limit } => {
            commands::recommend::run(&options, &user_id, limit)
        }
        Command::AlsoBought { user_id, limit } => {
            commands::also_bought::run(&options, &user_id, limit)
        }
        Command::Search { query, limit } => commands::search::run(&options, &query, limit),
        Command::Smoke => commands::smoke::run(&options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(&options, json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
