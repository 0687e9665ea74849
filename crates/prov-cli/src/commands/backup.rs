//! Backup commands: thin adapters over the BackupManager API

use colored::Colorize;

use crate::context::Context;
use crate::error::{CliError, Result};

pub fn run_create(ctx: &Context, description: &str) -> Result<()> {
    let metadata = ctx.backups().create_backup(description)?;
    println!(
        "{} backup {} ({} files, {} bytes)",
        "created".green().bold(),
        metadata.id.cyan(),
        metadata.files,
        metadata.size_bytes
    );
    Ok(())
}

pub fn run_list(ctx: &Context, json: bool) -> Result<()> {
    let entries = ctx.backups().list_backups()?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).map_err(prov_core::Error::from)?
        );
        return Ok(());
    }

    if entries.is_empty() {
        println!("no backups found");
        return Ok(());
    }

    for entry in &entries {
        if entry.corrupted {
            println!(
                "{}  {}",
                entry.id.cyan(),
                entry.description.red().bold()
            );
        } else {
            println!(
                "{}  {}  ({} bytes)",
                entry.id.cyan(),
                entry.description,
                entry.size_bytes
            );
        }
    }
    Ok(())
}

pub fn run_restore(ctx: &Context, id: &str, force: bool, yes: bool) -> Result<()> {
    let prompt = format!("Restore backup '{id}' over the live configuration?");
    if !super::confirm(&prompt, yes)? {
        println!("aborted");
        return Ok(());
    }

    let metadata = ctx.backups().restore_backup(id, force)?;
    println!(
        "{} restored backup {} ({})",
        "ok".green().bold(),
        metadata.id.cyan(),
        metadata.description
    );
    println!("a pre-restore snapshot of the previous state was kept");
    Ok(())
}

pub fn run_delete(ctx: &Context, id: &str, yes: bool) -> Result<()> {
    if !super::confirm(&format!("Delete backup '{id}'?"), yes)? {
        println!("aborted");
        return Ok(());
    }
    ctx.backups().delete_backup(id)?;
    println!("{} backup {}", "deleted".green().bold(), id.cyan());
    Ok(())
}

pub fn run_verify(ctx: &Context, id: &str) -> Result<()> {
    let report = ctx.backups().verify_backup(id)?;
    if report.is_ok() {
        println!("{} backup {} verified", "ok".green().bold(), id.cyan());
        return Ok(());
    }

    for issue in &report.issues {
        println!("{} {}", "issue:".red().bold(), issue);
    }
    Err(CliError::user(format!(
        "backup {id} failed verification with {} issue(s)",
        report.issues.len()
    )))
}

pub fn run_clean(ctx: &Context, keep: Option<usize>) -> Result<()> {
    let keep = keep.unwrap_or(ctx.settings.backup_keep_count);
    let deleted = ctx.backups().clean_old_backups(keep)?;
    if deleted.is_empty() {
        println!("nothing to clean (keeping {keep})");
    } else {
        println!(
            "{} removed {} old backup(s), keeping {}",
            "ok".green().bold(),
            deleted.len(),
            keep
        );
        for id in deleted {
            println!("  {}", id.dimmed());
        }
    }
    Ok(())
}
