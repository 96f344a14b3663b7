use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "icinga-users")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative management of Icinga 2 users", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Users manifest (TOML or JSON)
    #[arg(short, long, global = true, env = "ICINGA_USERS_MANIFEST")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check every user declaration in the manifest
    Validate,

    /// Print declarations or the Icinga 2 fragments they render to
    Render(RenderArgs),

    /// Preview what apply would change
    Diff(DiffArgs),

    /// Write and remove user fragments to match the manifest
    Apply(ApplyArgs),

    /// Show managed and unmanaged fragments
    Status(ConfDirArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
pub struct RenderArgs {
    /// Only this user
    pub user: Option<String>,

    /// Print declarations as JSON instead of fragments
    #[arg(long)]
    pub json: bool,

    /// Print passwords instead of masking them
    #[arg(long)]
    pub show_secrets: bool,
}

#[derive(clap::Args)]
pub struct ConfDirArgs {
    /// Directory the fragments live in
    #[arg(long, env = "ICINGA_USERS_CONF_DIR")]
    pub conf_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct DiffArgs {
    /// Only users whose name contains this
    pub target: Option<String>,

    #[command(flatten)]
    pub conf: ConfDirArgs,
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    /// Only users whose name contains this
    pub target: Option<String>,

    #[command(flatten)]
    pub conf: ConfDirArgs,

    /// Show what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}
