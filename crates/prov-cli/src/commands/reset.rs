//! Reset command: wipe providers after a safety backup

use colored::Colorize;

use crate::context::Context;
use crate::error::Result;

pub fn run(ctx: &Context, yes: bool) -> Result<()> {
    let prompt = "Remove ALL providers and the active selection? (a backup is taken first)";
    if !super::confirm(prompt, yes)? {
        println!("aborted");
        return Ok(());
    }

    let backups = ctx.backups();
    let safety_id = ctx.providers().reset(&backups)?;
    println!(
        "{} configuration reset; previous state saved as backup {}",
        "ok".green().bold(),
        safety_id.cyan()
    );
    Ok(())
}
