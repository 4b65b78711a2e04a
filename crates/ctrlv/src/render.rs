//! Terminal rendering of snippets, version lists and diffs.

use chrono::{DateTime, Utc};
use ctrlv_client::{Snippet, SnippetVersion};
use once_cell::sync::Lazy;
use syntect::{
    easy::HighlightLines,
    highlighting::ThemeSet,
    parsing::SyntaxSet,
    util::{as_24_bit_terminal_escaped, LinesWithEndings},
};

use crate::language::{self, Language};

/// Lazily loaded syntax set.
static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Lazily loaded theme set.
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";
const RESET: &str = "\x1b[0m";

/// Highlight `code` for a 24-bit color terminal.
///
/// Falls back to the code as-is when the grammar or theme is missing or a
/// line fails to highlight.
pub fn highlight(code: &str, language: &Language) -> String {
    let Some(theme) = THEME_SET.themes.get(THEME) else {
        return code.to_string();
    };
    let syntax = SYNTAX_SET
        .find_syntax_by_name(language.syntax)
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(language.extension))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = String::with_capacity(code.len() * 2);
    for line in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
            Err(e) => {
                tracing::debug!("highlighting failed: {}", e);
                return code.to_string();
            }
        }
    }
    out.push_str(RESET);
    out
}

/// "in 5 minutes", "in 3 hours", "in 2 days", or "already" for the past.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = at - now;
    if delta.num_seconds() <= 0 {
        return "already".to_string();
    }

    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("in 1 {}", unit)
        } else {
            format!("in {} {}s", n, unit)
        }
    };
    let minutes = delta.num_minutes();
    if minutes < 1 {
        "in less than a minute".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if delta.num_hours() < 48 {
        plural(delta.num_hours(), "hour")
    } else {
        plural(delta.num_days(), "day")
    }
}

/// One line of metadata shown above the content.
pub fn header(snippet: &Snippet, now: DateTime<Utc>) -> String {
    let mut parts = vec![
        language::lookup(&snippet.language).name.to_string(),
        format!("version {}", snippet.version),
    ];
    if snippet.expires_at <= now {
        parts.push("Expired".to_string());
    } else {
        parts.push(format!("Expires {}", relative_time(snippet.expires_at, now)));
    }
    if snippet.one_time_view {
        parts.push("One-time view".to_string());
    }
    if snippet.is_encrypted {
        parts.push("Encrypted".to_string());
    }
    parts.join(" · ")
}

/// The lineage with the shown version marked.
pub fn version_list(versions: &[SnippetVersion], current_id: &str) -> String {
    versions
        .iter()
        .map(|v| {
            let marker = if v.id == current_id { "*" } else { " " };
            format!(
                "{} v{:<3} {:<24} {}",
                marker,
                v.version,
                v.id,
                v.created_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Color a unified diff: additions green, removals red, hunks cyan.
pub fn colorize_diff(diff: &str) -> String {
    diff.lines()
        .map(|line| {
            let color = if line.starts_with("+++") || line.starts_with("---") {
                "\x1b[1m"
            } else if line.starts_with('+') {
                "\x1b[32m"
            } else if line.starts_with('-') {
                "\x1b[31m"
            } else if line.starts_with("@@") {
                "\x1b[36m"
            } else {
                return line.to_string();
            };
            format!("{}{}{}", color, line, RESET)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 6, 12, 0, 0).unwrap()
    }

    fn snippet() -> Snippet {
        Snippet {
            id: "abc".into(),
            content: "print(1)".into(),
            language: "python".into(),
            created_at: now(),
            expires_at: now() + Duration::hours(24),
            view_count: 0,
            one_time_view: true,
            is_encrypted: false,
            version: 2,
            versions: None,
        }
    }

    #[test]
    fn test_relative_time() {
        assert_eq!(relative_time(now() + Duration::minutes(5), now()), "in 5 minutes");
        assert_eq!(relative_time(now() + Duration::hours(1), now()), "in 1 hour");
        assert_eq!(relative_time(now() + Duration::hours(24), now()), "in 24 hours");
        assert_eq!(relative_time(now() + Duration::days(7), now()), "in 7 days");
        assert_eq!(relative_time(now() - Duration::hours(1), now()), "already");
    }

    #[test]
    fn test_header() {
        assert_eq!(
            header(&snippet(), now()),
            "Python · version 2 · Expires in 24 hours · One-time view"
        );
    }

    #[test]
    fn test_highlight_keeps_text() {
        let out = highlight("fn main() {}\n", language::lookup("rust"));
        assert!(out.contains("main"));
        assert!(out.ends_with(RESET));
    }

    #[test]
    fn test_colorize_diff() {
        let out = colorize_diff("--- a\n+++ b\n@@ -1 +1 @@\n-x\n+y\n z");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[3], "\x1b[31m-x\x1b[0m");
        assert_eq!(lines[4], "\x1b[32m+y\x1b[0m");
        assert_eq!(lines[5], " z");
    }
}
