//! Listing and navigating the versions of a snippet.

use clap::Args;
use ctrlv_core::VersionNavigator;

use crate::commands::{print_diff, resolve};
use crate::context::AppContext;
use crate::render;

#[derive(Debug, Clone, Args)]
pub struct VersionsArgs {
    /// Snippet id or share link
    pub target: String,

    /// Access token (taken from the link when omitted)
    #[arg(long)]
    pub token: Option<String>,

    /// Password to try before prompting
    #[arg(short, long = "password")]
    pub passwords: Vec<String>,

    /// Re-read the version list from the service
    #[arg(long)]
    pub refresh: bool,

    /// Diff the snippet against another version
    #[arg(long, value_name = "ID", conflicts_with = "open")]
    pub diff: Option<String>,

    /// Print the link to another version
    #[arg(long, value_name = "ID")]
    pub open: Option<String>,
}

pub async fn handle_versions(ctx: &AppContext, args: VersionsArgs) -> anyhow::Result<()> {
    let mut dispatcher = ctx.dispatcher().await;
    let Some((snippet, token)) = resolve(
        ctx,
        &mut dispatcher,
        &args.target,
        args.token.as_deref(),
        args.passwords,
    )
    .await?
    else {
        return Ok(());
    };

    let mut navigator = VersionNavigator::new(ctx.service.clone(), ctx.bus.clone(), snippet, token);
    if args.refresh {
        navigator.refresh_versions().await?;
    }

    if let Some(id) = &args.open {
        let route = navigator.select(id).await?;
        dispatcher.flush();
        println!("{}", route.url(ctx.config.origin()));
        return Ok(());
    }

    if let Some(id) = &args.diff {
        let state = navigator.diff_against(id).await?.clone();
        dispatcher.flush();
        return print_diff(&state);
    }

    if !navigator.has_versions() {
        eprintln!("Only one version exists.");
    }
    println!(
        "{}",
        render::version_list(navigator.versions(), &navigator.current().id)
    );
    Ok(())
}
