use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

use qaflow_report::config::{self, DEFAULT_CONFIG_FILE};

/// QAFlow Report - project scaffolding for the test reporter
#[derive(Parser, Debug)]
#[command(
    name = "qaflow-report",
    about = "Set up client-side test reporting for this project",
    after_help = "ENVIRONMENT VARIABLES:\n\
        QAFLOW_API_KEY       API key for the collection service\n\
        QAFLOW_ENDPOINT      Collection API base URL\n\
        QAFLOW_CONFIG_PATH   Config file location override"
)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a starter reporter.config.json in the current directory
    Init {
        /// API key to embed in the config (placeholder if omitted)
        #[arg(long, env = "QAFLOW_API_KEY")]
        key: Option<String>,

        /// Where to write the config file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing config file
        #[arg(long, short = 'f')]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Init { key, path, force } => {
            let api_key = key.unwrap_or_else(|| "YOUR_API_KEY_HERE".to_string());

            match config::write_config_file(&path, &api_key, force) {
                Ok(()) => {
                    println!("Config file generated at: {}", path.display());
                    if api_key == "YOUR_API_KEY_HERE" {
                        println!("Edit it and fill in your QAFlow API key.");
                    }
                }
                Err(config::ConfigError::AlreadyExists(existing)) => {
                    eprintln!(
                        "Warning: {} already exists. Re-run with --force to overwrite.",
                        existing.display()
                    );
                    std::process::exit(1);
                }
                Err(err) => return Err(Box::new(err)),
            }
        }
    }

    Ok(())
}
