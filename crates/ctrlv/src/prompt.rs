//! Line-based password prompt.

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads passwords from stdin, one per line.
pub struct PasswordReader {
    lines: Lines<BufReader<Stdin>>,
}

impl PasswordReader {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Ask for a password. An empty line or end of input means cancel.
    pub async fn read(&mut self, title: &str) -> std::io::Result<Option<String>> {
        eprintln!("{}", title);
        eprint!("Password (empty to cancel): ");
        let line = self.lines.next_line().await?;
        Ok(line
            .map(|l| l.trim_end_matches('\r').to_string())
            .filter(|l| !l.is_empty()))
    }
}

impl Default for PasswordReader {
    fn default() -> Self {
        Self::new()
    }
}
