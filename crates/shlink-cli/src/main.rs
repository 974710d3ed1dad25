//! Shlink CLI - keys, request signing, configuration and a guided demo for
//! the link-sharing core.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shlink_telemetry::{LogConfig, LogFormat};

mod commands;
mod home;
mod theme;

use commands::{config, demo, keys, sign};
use home::ShlinkHome;

/// Shlink - capability links for health data
#[derive(Parser)]
#[command(name = "shlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to an additional configuration file
    #[arg(short, long, global = true, env = "SHLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Signing key file (defaults to ~/.shlink/keys/client.key)
    #[arg(long, global = true)]
    key: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the client signing key
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Sign a request and print its headers and body
    Sign {
        /// HTTP method
        method: String,
        /// Full request URL
        url: String,
        /// JSON body (ignored for GET, HEAD and OPTIONS)
        #[arg(short, long)]
        body: Option<String>,
        /// Access token to present and bind
        #[arg(short, long)]
        token: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Walk through initialize, share, claim and read in-process
    Demo {
        /// How many recipients try to claim
        #[arg(long, default_value = "3")]
        claimants: u32,
        /// Claim limit for the shared link
        #[arg(long, default_value = "2")]
        claim_limit: u32,
        /// Protect the link with a PIN
        #[arg(long)]
        pin: Option<String>,
        /// FHIR bundle (JSON) to serve instead of the built-in sample
        #[arg(long)]
        bundle: Option<PathBuf>,
        /// File to share; its name selects the bundle entries
        #[arg(long, default_value = "glucose.json")]
        file: String,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Show the current key (thumbprint and public key)
    Show,
    /// Generate a new key (prompts if one already exists)
    Generate {
        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show resolved configuration with source annotations
    Show {
        /// Output format (toml or json)
        #[arg(short, long, default_value = "toml")]
        format: String,
        /// Show only a specific section (e.g. tokens, links, logging)
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Show config file paths being checked
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let home = ShlinkHome::resolve()?;

    let resolved = shlink_config::Config::load_with_home(cli.config.as_deref(), home.root());

    // Set up logging from config, with --verbose override.
    let log_config = match resolved.as_ref().map(|r| LogConfig::try_from(&r.config.logging)) {
        Ok(Ok(mut lc)) => {
            if cli.verbose {
                "debug".clone_into(&mut lc.level);
            }
            lc
        },
        _ => {
            let level = if cli.verbose { "debug" } else { "info" };
            LogConfig::new(level).with_format(LogFormat::Compact)
        },
    };
    if let Err(e) = shlink_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let key_path = cli.key.clone().unwrap_or_else(|| home.key_path());

    match cli.command {
        Commands::Keys { command } => match command {
            KeyCommands::Show => keys::show_key(&key_path)?,
            KeyCommands::Generate { force } => keys::generate_key(&key_path, force)?,
        },
        Commands::Sign {
            method,
            url,
            body,
            token,
            json,
        } => {
            let args = sign::SignArgs {
                method: &method,
                url: &url,
                body: body.as_deref(),
                token: token.as_deref(),
            };
            sign::run_sign(&key_path, &args, json)?;
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show { format, section } => {
                config::show_config(&home, cli.config.as_deref(), &format, section.as_deref())?;
            },
            ConfigCommands::Paths => config::show_paths(&home, cli.config.as_deref()),
        },
        Commands::Demo {
            claimants,
            claim_limit,
            pin,
            bundle,
            file,
        } => {
            let cfg = resolved?.config;
            let options = demo::DemoOptions {
                claimants,
                claim_limit,
                pin,
                bundle,
                file,
            };
            demo::run_demo(&cfg, &options).await?;
        },
    }

    Ok(())
}
