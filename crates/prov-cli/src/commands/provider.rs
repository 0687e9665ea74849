//! Provider profile commands

use colored::Colorize;

use prov_core::{Provider, ProviderDraft};

use crate::context::Context;
use crate::error::Result;

pub fn run_add(
    ctx: &Context,
    name: String,
    base_url: String,
    api_key: String,
    timeout_ms: Option<u64>,
    model: Option<String>,
) -> Result<()> {
    let provider = ctx.providers().add(ProviderDraft {
        name,
        base_url,
        api_key,
        timeout_ms,
        model,
    })?;
    println!("{} provider {}", "added".green().bold(), provider.name.cyan());
    Ok(())
}

pub fn run_list(ctx: &Context, json: bool) -> Result<()> {
    let store = ctx.providers();
    let providers = store.list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&providers).map_err(prov_core::Error::from)?);
        return Ok(());
    }

    if providers.is_empty() {
        println!("no providers configured");
        return Ok(());
    }

    let active = store.active()?.map(|p| p.name);
    for provider in &providers {
        let marker = if active.as_deref() == Some(provider.name.as_str()) {
            "*".green().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {}  {}  {}",
            marker,
            provider.name.cyan().bold(),
            provider.base_url,
            mask_key(&provider.api_key).dimmed()
        );
    }
    Ok(())
}

pub fn run_show(ctx: &Context, name: &str) -> Result<()> {
    let provider = ctx.providers().get(name)?;
    print_provider(&provider);
    Ok(())
}

pub fn run_use(ctx: &Context, name: &str) -> Result<()> {
    ctx.providers().set_active(name)?;
    println!("{} active provider set to {}", "ok".green().bold(), name.cyan());
    Ok(())
}

pub fn run_remove(ctx: &Context, name: &str, yes: bool) -> Result<()> {
    if !super::confirm(&format!("Remove provider '{name}'?"), yes)? {
        println!("aborted");
        return Ok(());
    }
    ctx.providers().remove(name)?;
    println!("{} provider {}", "removed".green().bold(), name.cyan());
    Ok(())
}

fn print_provider(provider: &Provider) {
    println!("{}", provider.name.cyan().bold());
    println!("  base_url:   {}", provider.base_url);
    println!("  api_key:    {}", mask_key(&provider.api_key));
    if let Some(timeout) = provider.timeout_ms {
        println!("  timeout_ms: {timeout}");
    }
    if let Some(model) = &provider.model {
        println!("  model:      {model}");
    }
    println!("  created:    {}", provider.created);
    println!("  updated:    {}", provider.updated);
}

/// Show only a short prefix of the stored key.
fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(6).collect();
    format!("{prefix}...")
}
