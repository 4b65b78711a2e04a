//! Commands that only print information.

use ctrlv_client::SnippetService;
use serde_json::json;

use crate::context::AppContext;
use crate::language::{LANGUAGES, PLAIN_TEXT};

pub async fn handle_stats(ctx: &AppContext) -> anyhow::Result<()> {
    let stats = ctx.service.get_stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

pub fn list_languages() {
    println!("{:<12} {:<12} EXTENSION", "TAG", "NAME");
    for lang in LANGUAGES.iter().chain(std::iter::once(&PLAIN_TEXT)) {
        println!("{:<12} {:<12} .{}", lang.tag, lang.name, lang.extension);
    }
}

pub fn show_config(ctx: &AppContext) -> anyhow::Result<()> {
    let config = &ctx.config;
    let effective = json!({
        "api_url": config.api_url(),
        "api_prefix": config.api_prefix(),
        "origin": config.origin(),
        "timeout_secs": config.timeout().as_secs(),
        "log_level": config.log_level.map(|level| level.as_str()).unwrap_or("warn"),
    });
    println!("{}", serde_json::to_string_pretty(&effective)?);

    if ctx.sources.is_empty() {
        eprintln!("No config files found, using defaults and environment.");
    } else {
        eprintln!("Loaded from:");
        for source in &ctx.sources {
            eprintln!("  {}", source.display());
        }
    }
    Ok(())
}
