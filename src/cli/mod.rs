//! Command-line interface parsing and handling
//!
//! With no subcommand the full-screen ritual starts. The other subcommands
//! run one step of the ritual on plain stdout, or manage the config file.

pub mod ask;
pub mod draw;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::ask::run_ask;
use crate::cli::draw::{run_draw, run_lot, run_status, run_throw};
use crate::core::client::FortuneClient;
use crate::core::config::data::{path_display, SERVER_URL_ENV};
use crate::core::config::Config;
use crate::logging::{self, LogTarget};
use crate::ui::ritual_loop::run_ritual;

#[derive(Parser)]
#[command(name = "qiuqian")]
#[command(version)]
#[command(about = "Consult the temple: throw the moon blocks, draw a lot, ask about it")]
#[command(
    long_about = "qiuqian walks through the fortune-stick ritual in the terminal. Ask your \
question in your heart, throw the moon blocks until the deity agrees, draw a lot, then \
talk the lot over with the temple's AI interpreter.\n\n\
Server:\n\
  The temple backend defaults to http://127.0.0.1:8000. Override it with --server, the \
QIUQIAN_SERVER_URL environment variable, or 'qiuqian set server-url <url>'.\n\n\
Controls:\n\
  Enter             Begin, throw, draw, or send a question\n\
  Shift/Alt+Enter   New line in the question box\n\
  Esc               Close the lot and start over\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Temple backend base URL
    #[arg(short = 's', long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub debug_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the full-screen ritual (default)
    Ritual,
    /// Throw the blocks until they agree, then draw a lot
    Draw {
        /// Draw straight away without asking the blocks
        #[arg(long)]
        skip_blocks: bool,
    },
    /// Throw the moon blocks once
    Throw,
    /// Show the lot with the given number
    Lot {
        /// Lot number
        number: u32,
    },
    /// Check whether the AI interpreter is reachable
    Status,
    /// Ask the AI interpreter about a lot
    Ask {
        /// Number of the lot to discuss
        #[arg(short, long, value_name = "NUMBER")]
        lot: u32,
        /// Your question
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key
        value: String,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Show the current configuration
    Config,
}

impl Commands {
    fn is_interactive(&self) -> bool {
        matches!(self, Commands::Ritual)
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let command = args.command.unwrap_or(Commands::Ritual);
    logging::init(&LogTarget::choose(
        args.debug_log.as_deref(),
        command.is_interactive(),
    ))?;

    let mut config = Config::load()?;
    match command {
        Commands::Set { key, value } => set_config_value(&mut config, &key, &value),
        Commands::Unset { key } => unset_config_value(&mut config, &key),
        Commands::Config => {
            config.print_all();
            println!("  config file: {}", path_display(Config::config_path()?));
            Ok(())
        }
        Commands::Throw => {
            run_throw(&mut std::io::stdout())?;
            Ok(())
        }
        command => {
            let client = build_client(&config, args.server.as_deref())?;
            run_remote(command, client).await
        }
    }
}

async fn run_remote(command: Commands, client: FortuneClient) -> Result<(), Box<dyn Error>> {
    let mut out = std::io::stdout();
    let outcome = match command {
        Commands::Ritual => return run_ritual(client).await,
        Commands::Draw { skip_blocks } => run_draw(&client, skip_blocks, &mut out).await,
        Commands::Lot { number } => run_lot(&client, number, &mut out).await,
        Commands::Status => run_status(&client, &mut out).await,
        Commands::Ask { lot, question } => run_ask(&client, lot, &question.join(" "), &mut out).await,
        Commands::Throw | Commands::Set { .. } | Commands::Unset { .. } | Commands::Config => {
            Ok(())
        }
    };

    if let Err(err) = outcome {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
    Ok(())
}

pub fn build_client(config: &Config, server: Option<&str>) -> Result<FortuneClient, Box<dyn Error>> {
    let env_url = std::env::var(SERVER_URL_ENV).ok();
    let url = config.resolve_server_url(server, env_url.as_deref());
    Ok(FortuneClient::new(&url, config.request_timeout())?)
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    match key {
        "server-url" => {
            let url = value.trim();
            if reqwest::Url::parse(url).is_err() {
                eprintln!("❌ Not a valid URL: {url}");
                eprintln!("Example: qiuqian set server-url http://127.0.0.1:8000");
                std::process::exit(1);
            }
            config.server_url = Some(url.to_string());
            config.save()?;
            println!("✅ Set server-url to: {url}");
        }
        "request-timeout-secs" => {
            let Ok(secs) = value.trim().parse::<u64>() else {
                eprintln!("❌ Expected a number of seconds, got: {value}");
                std::process::exit(1);
            };
            config.request_timeout_secs = Some(secs);
            config.save()?;
            println!("✅ Set request-timeout-secs to: {secs}");
        }
        _ => {
            eprintln!("❌ Unknown config key: {key}");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn unset_config_value(config: &mut Config, key: &str) -> Result<(), Box<dyn Error>> {
    match key {
        "server-url" => config.server_url = None,
        "request-timeout-secs" => config.request_timeout_secs = None,
        _ => {
            eprintln!("❌ Unknown config key: {key}");
            std::process::exit(1);
        }
    }
    config.save()?;
    println!("✅ Unset {key}");
    Ok(())
}
