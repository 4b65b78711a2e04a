//! Diff between two snippets.

use anyhow::bail;
use ctrlv_core::{DiffState, DiffView};

use crate::context::AppContext;
use crate::render;

pub async fn handle_diff(ctx: &AppContext, source: &str, target: &str) -> anyhow::Result<()> {
    let mut dispatcher = ctx.dispatcher().await;
    let mut view = DiffView::new(ctx.service.clone(), ctx.bus.clone());
    let state = view.open(source, target).await.clone();
    dispatcher.flush();
    print_diff(&state)
}

/// Print a loaded diff or fail with the view's message.
pub fn print_diff(state: &DiffState) -> anyhow::Result<()> {
    match state {
        DiffState::Loaded(diff) if diff.diff_content.trim().is_empty() => {
            eprintln!("No differences.");
            Ok(())
        }
        DiffState::Loaded(diff) => {
            let text = if std::io::IsTerminal::is_terminal(&std::io::stdout()) {
                render::colorize_diff(&diff.diff_content)
            } else {
                diff.diff_content.clone()
            };
            println!("{}", text.trim_end_matches('\n'));
            Ok(())
        }
        DiffState::Failed { message } => bail!("{}", message),
        DiffState::Closed | DiffState::Loading { .. } => bail!("diff did not load"),
    }
}
