use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "azprov")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Provision Azure virtual machines with automatic rollback", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project config file (.json or .toml)
    #[arg(short, long, global = true, env = "AZPROV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project name (a config file in the config directory)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage the project's resource group
    #[command(subcommand)]
    Group(GroupCommand),

    /// Manage the project's virtual machine stack
    #[command(subcommand)]
    Vm(VmCommand),

    /// Interactive menu
    Menu,

    /// List project configs in the config directory
    Projects,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Group Commands
// ============================================================================

#[derive(Subcommand)]
pub enum GroupCommand {
    /// Create the resource group (no-op if it exists)
    Create,

    /// Delete the resource group and everything in it
    Delete(ConfirmArgs),
}

// ============================================================================
// VM Commands
// ============================================================================

#[derive(Subcommand)]
pub enum VmCommand {
    /// Create the VM and its network, rolling back on failure
    Create(OutputArgs),

    /// Delete the VM stack in dependency order
    Delete {
        #[command(flatten)]
        confirm: ConfirmArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Power off the VM (compute stays allocated and billed)
    Stop,

    /// Deallocate the VM (stops compute billing)
    Deallocate(ConfirmArgs),

    /// Show the creation steps without calling Azure
    Plan(OutputArgs),
}

#[derive(Args, Clone, Copy, Default)]
pub struct ConfirmArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}
