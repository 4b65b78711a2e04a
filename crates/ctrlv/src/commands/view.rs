//! Viewing a snippet, including the password exchange.

use anyhow::{bail, Context as _};
use clap::Args;
use ctrlv_client::Snippet;
use ctrlv_core::{AccessController, AccessState, SnippetRef};
use std::io::IsTerminal;

use crate::context::AppContext;
use crate::language;
use crate::notify::Dispatcher;
use crate::prompt::PasswordReader;
use crate::render;

#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Snippet id or share link
    pub target: String,

    /// Access token (taken from the link when omitted)
    #[arg(long)]
    pub token: Option<String>,

    /// Password to try before prompting; repeat for access then decryption
    #[arg(short, long = "password")]
    pub passwords: Vec<String>,

    /// Print the content without highlighting
    #[arg(long)]
    pub raw: bool,
}

pub async fn handle_view(ctx: &AppContext, args: ViewArgs) -> anyhow::Result<()> {
    let mut dispatcher = ctx.dispatcher().await;
    let Some((snippet, _token)) = resolve(
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

    eprintln!("{}", render::header(&snippet, chrono::Utc::now()));
    let content = if args.raw || !std::io::stdout().is_terminal() {
        snippet.content.clone()
    } else {
        render::highlight(&snippet.content, language::lookup(&snippet.language))
    };
    print!("{}", content);
    if !snippet.content.ends_with('\n') {
        println!();
    }

    let versions = snippet.lineage();
    if versions.len() > 1 {
        eprintln!(
            "{} versions available, see `ctrlv versions {}`",
            versions.len(),
            snippet.id
        );
    }
    Ok(())
}

/// Run one access cycle to completion.
///
/// Passwords from the command line are used first, in order. After that the
/// user is prompted on stdin. Returns `None` when the user cancels.
pub async fn resolve(
    ctx: &AppContext,
    dispatcher: &mut Dispatcher,
    target: &str,
    token: Option<&str>,
    passwords: Vec<String>,
) -> anyhow::Result<Option<(Snippet, String)>> {
    let reference = SnippetRef::parse(target)?;
    let token = token.map(str::to_string).or(reference.token);

    let controller = AccessController::new(ctx.service.clone(), ctx.bus.clone());
    let mut state = controller.load(&reference.id, token.as_deref()).await;

    let mut given = passwords.into_iter();
    let mut reader: Option<PasswordReader> = None;
    let mut last_from_flag = false;
    let mut header_shown = false;

    loop {
        dispatcher.flush();
        let title = match &state {
            AccessState::Resolved(snippet) => {
                return Ok(Some((snippet.clone(), token.unwrap_or_default())));
            }
            AccessState::Failed(reason) => match reason.cause() {
                Some(cause) => bail!("{}: {}", reason, cause),
                None => bail!("{}", reason),
            },
            AccessState::RequiresAccessPassword(_) => "Password Protected Snippet",
            AccessState::RequiresDecryptPassword { snippet, .. } => {
                // Metadata is readable before the key is given.
                if !header_shown {
                    eprintln!("{}", render::header(snippet, chrono::Utc::now()));
                    header_shown = true;
                }
                "Encrypted Content"
            }
            AccessState::Idle | AccessState::Loading => bail!("snippet did not load"),
        };

        let error = state.prompt().and_then(|prompt| prompt.error.clone());
        if let Some(error) = &error {
            if last_from_flag {
                bail!("{}", error);
            }
            eprintln!("{}", error);
        }

        let password = match given.next() {
            Some(password) => {
                last_from_flag = true;
                Some(password)
            }
            None => {
                last_from_flag = false;
                reader
                    .get_or_insert_with(PasswordReader::new)
                    .read(title)
                    .await
                    .context("failed to read password")?
            }
        };

        let Some(password) = password else {
            controller.cancel().await;
            dispatcher.flush();
            return Ok(None);
        };
        state = controller.submit_password(&password).await?;
    }
}
