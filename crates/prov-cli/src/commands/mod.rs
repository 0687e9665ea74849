//! Command implementations

pub mod alias;
pub mod backup;
pub mod provider;
pub mod reset;

use crate::error::Result;

/// Ask the user to confirm a destructive action unless `--yes` was given.
pub(crate) fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
