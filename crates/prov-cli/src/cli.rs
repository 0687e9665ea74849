//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Provider Manager - store provider profiles, switch between them, and
/// keep the configuration protected with verified backups
#[derive(Parser, Debug)]
#[command(name = "prov")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the configuration root (defaults to ~/.provider-manager)
    #[arg(long, global = true, env = "PROV_CONFIG_ROOT")]
    pub config_root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage provider profiles
    Provider {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Print the shell snippet that loads a provider's variables
    Alias {
        /// Provider name
        name: String,

        /// Target shell (bash, zsh, fish)
        #[arg(short, long, default_value = "bash")]
        shell: String,
    },

    /// Create, inspect, and restore configuration backups
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Remove all providers and the active selection (backed up first)
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Provider profile operations
#[derive(Subcommand, Debug, Clone)]
pub enum ProviderAction {
    /// Add a new provider profile
    Add {
        /// Provider name
        name: String,

        /// API endpoint (http or https)
        #[arg(long)]
        base_url: String,

        /// API key
        #[arg(long)]
        api_key: String,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Default model
        #[arg(long)]
        model: Option<String>,
    },

    /// List provider profiles
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show one provider profile
    Show {
        /// Provider name
        name: String,
    },

    /// Mark a provider as active
    Use {
        /// Provider name
        name: String,
    },

    /// Remove a provider profile
    Remove {
        /// Provider name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Backup operations
#[derive(Subcommand, Debug, Clone)]
pub enum BackupAction {
    /// Snapshot the current configuration
    Create {
        /// Description stored with the backup
        #[arg(short, long, default_value = "manual backup")]
        description: String,
    },

    /// List backups, newest first
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Restore a backup over the live configuration
    Restore {
        /// Backup id
        id: String,

        /// Restore even if integrity verification fails
        #[arg(long)]
        force: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete one backup
    Delete {
        /// Backup id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Recompute a backup's checksum and report every discrepancy
    Verify {
        /// Backup id
        id: String,
    },

    /// Delete old backups beyond a keep count
    Clean {
        /// How many of the newest backups to keep
        #[arg(short, long)]
        keep: Option<usize>,
    },
}
