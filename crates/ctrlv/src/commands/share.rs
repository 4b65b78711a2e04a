//! Sharing snippets and new versions.

use anyhow::Context as _;
use clap::Args;
use ctrlv_core::{Expiration, ShareComposer, ShareOptions};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::context::AppContext;
use crate::language::{self, PLAIN_TEXT};
use crate::render;

#[derive(Debug, Clone, Args)]
pub struct ShareArgs {
    /// File to share (reads stdin when omitted)
    pub file: Option<PathBuf>,

    /// Language tag (guessed from the file extension by default)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Expiration: 1h, 24h, 7d or a number of minutes
    #[arg(short, long, default_value = "24h")]
    pub expires: Expiration,

    /// Delete the snippet after its first view
    #[arg(long)]
    pub one_time: bool,

    /// Encrypt the content with the password
    #[arg(long)]
    pub encrypt: bool,

    /// Password protecting the snippet
    #[arg(long)]
    pub password: Option<String>,

    /// Copy the link to the clipboard
    #[arg(long)]
    pub copy: bool,
}

/// Share a new snippet, or a new version of `parent_id`.
pub async fn handle_share(
    ctx: &AppContext,
    args: ShareArgs,
    parent_id: Option<String>,
) -> anyhow::Result<()> {
    let content = read_content(args.file.as_deref()).await?;
    let language = match (&args.language, &args.file) {
        (Some(tag), _) => tag.trim().to_ascii_lowercase(),
        (None, Some(path)) => language::from_path(path).tag.to_string(),
        (None, None) => PLAIN_TEXT.tag.to_string(),
    };

    let options = ShareOptions {
        content,
        language,
        expiration: args.expires,
        one_time_view: args.one_time,
        encrypt: args.encrypt,
        password: args.password,
        is_new_version: parent_id.is_some(),
        parent_id,
    };

    let mut dispatcher = ctx.dispatcher().await;
    let composer = ShareComposer::new(ctx.service.clone(), ctx.bus.clone(), ctx.config.origin());
    let shared = composer.share(&options).await;
    dispatcher.flush();
    let shared = shared?;

    println!("{}", shared.url);
    eprintln!(
        "Version {} · Expires {}",
        shared.version,
        render::relative_time(shared.expires_at, chrono::Utc::now())
    );

    if args.copy {
        match copy_to_clipboard(&shared.url) {
            Ok(()) => eprintln!("Copied to clipboard"),
            Err(e) => tracing::warn!("could not copy link: {}", e),
        }
    }
    Ok(())
}

async fn read_content(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut content = String::new();
            tokio::io::stdin()
                .read_to_string(&mut content)
                .await
                .context("failed to read stdin")?;
            Ok(content)
        }
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text.to_string())
}
