//! Alias snippet command

use prov_core::alias;

use crate::context::Context;
use crate::error::Result;

pub fn run(ctx: &Context, name: &str, shell: &str) -> Result<()> {
    let shell = shell.parse::<alias::Shell>()?;
    let provider = ctx.providers().get(name)?;
    // Bare snippet on stdout so it can be eval'd or appended to an rc file
    print!("{}", alias::render(shell, &provider));
    Ok(())
}
