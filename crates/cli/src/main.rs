//! Shanghan CLI: the main entry point.
//!
//! Commands:
//! - `serve`         Start the HTTP chat server
//! - `ask`           One question, or an interactive session
//! - `doctor`        Check configuration and API connectivity
//! - `hash-password` Produce a password hash for `[[users]]`
//! - `init`          Write a default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shanghan_config::AppConfig;

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "shanghan",
    about = "Shang Han Lun evidence chat service",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $SHANGHAN_CONFIG, then ./shanghan.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a question from the terminal
    Ask {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Check configuration, credentials and API connectivity
    Doctor,

    /// Hash a password for the `[[users]]` section of the config
    ///
    /// The hash is a single salted HMAC-SHA256 pass. That is fast to compute,
    /// so it does not slow down offline guessing the way a password KDF
    /// (argon2, scrypt) would. Keep the config file private and use long
    /// passwords.
    HashPassword {
        /// The password (read from stdin when omitted)
        password: Option<String>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}").into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::HashPassword { password } => {
            logging::init(cli.verbose, None);
            commands::hash_password::run(password).await?;
        }
        Commands::Init { force } => {
            logging::init(cli.verbose, None);
            commands::init::run(config_path, force).await?;
        }
        Commands::Serve { port } => {
            let config = load_config(config_path)?;
            let _guard = logging::init(cli.verbose, Some(&config.logging));
            commands::serve::run(config, port).await?;
        }
        Commands::Ask { message } => {
            let config = load_config(config_path)?;
            let _guard = logging::init(cli.verbose, Some(&config.logging));
            commands::ask::run(&config, message).await?;
        }
        Commands::Doctor => {
            logging::init(cli.verbose, None);
            commands::doctor::run(config_path).await?;
        }
    }

    Ok(())
}
