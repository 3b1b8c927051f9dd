//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod context;
pub mod hook;
pub mod init;
pub mod org;
pub mod status;
pub mod user;

pub use context::{CommandContext, GlobalOptions};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON for scripts
    Json,
}

/// orghook - keeps GitHub organization webhooks alive
#[derive(Parser, Debug)]
#[command(name = "orghook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(
        long,
        global = true,
        env = "ORGHOOK_FORMAT",
        default_value = "table",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "ORGHOOK_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Base URL GitHub delivers hook events to
    #[arg(long, global = true, env = "ORGHOOK_WEBHOOK_URL_PREFIX", hide_env = true)]
    pub webhook_url_prefix: Option<String>,

    /// GitHub API base URL (GitHub Enterprise, testing)
    #[arg(long, global = true, env = "ORGHOOK_API_BASE_URL", hide_env = true)]
    pub api_base_url: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "ORGHOOK_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a config file
    Init {
        /// Base URL GitHub should deliver hook events to
        #[arg(long = "prefix")]
        prefix: Option<String>,

        /// SQLite database location
        #[arg(long)]
        database: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration and database status
    Status,

    /// Manage linked organizations
    #[command(subcommand)]
    Org(OrgCommands),

    /// Manage users whose tokens can manage hooks
    #[command(subcommand)]
    User(UserCommands),

    /// Inspect and reconcile organization hooks
    #[command(subcommand)]
    Hook(HookCommands),
}

/// Organization subcommands
#[derive(Subcommand, Debug)]
pub enum OrgCommands {
    /// Link an organization and create its webhook record
    Add {
        /// Organization login on GitHub
        org: String,
    },
    /// Unlink an organization and drop its webhook record
    Remove {
        /// Organization login on GitHub
        org: String,
    },
    /// List linked organizations
    List,
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Add a user or replace its token and scopes
    Add {
        /// GitHub login
        login: String,

        /// Access token
        #[arg(long, env = "ORGHOOK_USER_TOKEN", hide_env = true)]
        token: Option<String>,

        /// Scope granted to the token (repeatable)
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
    /// Link a user to an organization
    Link {
        /// Organization login on GitHub
        org: String,
        /// GitHub login
        login: String,
    },
}

/// Hook subcommands
#[derive(Subcommand, Debug)]
pub enum HookCommands {
    /// Show the webhook record of an organization
    Show {
        /// Organization login on GitHub
        org: String,
    },
    /// Make sure an organization has an active hook
    Ensure {
        /// Organization login on GitHub
        org: String,

        /// Use this token instead of a linked user's
        #[arg(long, env = "ORGHOOK_TOKEN", hide_env = true)]
        token: Option<String>,
    },
    /// Make sure every linked organization has an active hook
    EnsureAll {
        /// Use this token instead of linked users' tokens
        #[arg(long, env = "ORGHOOK_TOKEN", hide_env = true)]
        token: Option<String>,
    },
}
