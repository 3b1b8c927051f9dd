//! orghook - keeps GitHub organization webhooks alive

use clap::Parser;

mod cli;
mod client;
mod config;
mod error;
mod models;
mod output;
mod reconcile;
mod store;

use cli::{Cli, Commands, GlobalOptions, HookCommands, OrgCommands, UserCommands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init {
            prefix,
            database,
            force,
        } => cli::init::run(&opts, prefix, database, force),
        Commands::Status => cli::status::run(&opts),
        Commands::Org(org_cmd) => match org_cmd {
            OrgCommands::Add { org } => cli::org::add(&opts, &org),
            OrgCommands::Remove { org } => cli::org::remove(&opts, &org),
            OrgCommands::List => cli::org::list(&opts),
        },
        Commands::User(user_cmd) => match user_cmd {
            UserCommands::Add {
                login,
                token,
                scopes,
            } => cli::user::add(&opts, &login, token.as_deref(), &scopes),
            UserCommands::Link { org, login } => cli::user::link(&opts, &org, &login),
        },
        Commands::Hook(hook_cmd) => match hook_cmd {
            HookCommands::Show { org } => cli::hook::show(&opts, &org),
            HookCommands::Ensure { org, token } => {
                cli::hook::ensure(&opts, &org, token.as_deref()).await
            }
            HookCommands::EnsureAll { token } => {
                cli::hook::ensure_all(&opts, token.as_deref()).await
            }
        },
    }
}

/// RUST_LOG wins over --debug
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
