//! Prints bus notifications and navigation requests to stderr.

use ctrlv_core::{Bus, NavigationRequested, Notification, Route};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Drains the bus after each step of a command.
pub struct Dispatcher {
    notes: broadcast::Receiver<Notification>,
    navigation: broadcast::Receiver<NavigationRequested>,
    origin: String,
}

impl Dispatcher {
    pub async fn attach(bus: &Bus, origin: &str) -> Self {
        Self {
            notes: bus.subscribe::<Notification>().await,
            navigation: bus.subscribe::<NavigationRequested>().await,
            origin: origin.to_string(),
        }
    }

    /// Print everything published since the last flush.
    pub fn flush(&mut self) {
        for line in self.drain() {
            eprintln!("{}", line);
        }
    }

    fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            match self.notes.try_recv() {
                Ok(note) => lines.push(format_notification(&note)),
                Err(TryRecvError::Lagged(n)) => {
                    tracing::warn!("dropped {} notifications", n);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        loop {
            match self.navigation.try_recv() {
                Ok(nav) => lines.push(format_navigation(&nav.route, &self.origin)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        lines
    }
}

pub fn format_notification(note: &Notification) -> String {
    let prefix = if note.is_error() { "error" } else { "ok" };
    match &note.description {
        Some(description) => format!("{}: {}. {}", prefix, note.title, description),
        None => format!("{}: {}", prefix, note.title),
    }
}

pub fn format_navigation(route: &Route, origin: &str) -> String {
    match route {
        Route::Create => format!("Back to {}", route.url(origin)),
        Route::Snippet { .. } => format!("Open {}", route.url(origin)),
    }
}
