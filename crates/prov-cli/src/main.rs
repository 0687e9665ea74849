//! Provider Manager CLI
//!
//! Thin adapter over prov-core: provider profiles, alias snippets, and the
//! backup engine.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{BackupAction, Cli, Commands, ProviderAction};
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    let ctx = Context::resolve(cli.config_root)?;
    execute_command(&ctx, cli.command)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Provider { action } => match action {
            ProviderAction::Add {
                name,
                base_url,
                api_key,
                timeout_ms,
                model,
            } => commands::provider::run_add(ctx, name, base_url, api_key, timeout_ms, model),
            ProviderAction::List { json } => commands::provider::run_list(ctx, json),
            ProviderAction::Show { name } => commands::provider::run_show(ctx, &name),
            ProviderAction::Use { name } => commands::provider::run_use(ctx, &name),
            ProviderAction::Remove { name, yes } => {
                commands::provider::run_remove(ctx, &name, yes)
            }
        },
        Commands::Alias { name, shell } => commands::alias::run(ctx, &name, &shell),
        Commands::Backup { action } => match action {
            BackupAction::Create { description } => commands::backup::run_create(ctx, &description),
            BackupAction::List { json } => commands::backup::run_list(ctx, json),
            BackupAction::Restore { id, force, yes } => {
                commands::backup::run_restore(ctx, &id, force, yes)
            }
            BackupAction::Delete { id, yes } => commands::backup::run_delete(ctx, &id, yes),
            BackupAction::Verify { id } => commands::backup::run_verify(ctx, &id),
            BackupAction::Clean { keep } => commands::backup::run_clean(ctx, keep),
        },
        Commands::Reset { yes } => commands::reset::run(ctx, yes),
    }
}
