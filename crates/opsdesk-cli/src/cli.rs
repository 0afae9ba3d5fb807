use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(about = "Exercise the dashboard push-notification pipeline from a terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the config file (defaults to ./opsdesk.toml, then ~/.opsdesk/config.toml)
    #[arg(short, long, global = true, env = "OPSDESK_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a notification payload into a navigation intent
    Route(RouteArgs),
    /// Decode a notification click or cold-open URL
    DecodeUrl(DecodeUrlArgs),
    /// Sign in and render notifications fed through stdin
    Listen(ListenArgs),
    /// Inspect configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct RouteArgs {
    /// Payload entries as key=value pairs (e.g. type=MILESTONE_ACHIEVED milestone_id=m1)
    pub pairs: Vec<String>,
    /// Full notification as JSON ({"title", "body", "data"}); overrides pairs
    #[arg(long)]
    pub json: Option<String>,
}

#[derive(clap::Args)]
pub struct DecodeUrlArgs {
    /// URL carrying highlight_order / highlight_milestone parameters
    pub url: String,
    /// Treat the URL as the surface's initial location
    #[arg(long)]
    pub cold_open: bool,
}

#[derive(clap::Args)]
pub struct ListenArgs {
    /// Account id of the signed-in user
    #[arg(long)]
    pub account: String,
    /// Roles of the signed-in user (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,
    /// Registration token to use instead of platform.registration_token
    #[arg(long, env = "OPSDESK_REGISTRATION_TOKEN")]
    pub token: Option<String>,
    /// Initial surface URL, checked for cold-open routing hints
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}
