//! Moving between versions of a snippet and comparing them.

use ctrlv_client::{ClientError, DiffResponse, SharedSnippetService, Snippet, SnippetVersion};
use thiserror::Error;
use tracing::{debug, warn};

use crate::bus::{Bus, NavigationRequested, Notification};
use crate::route::Route;

#[derive(Debug, Clone, Error)]
pub enum NavigatorError {
    #[error("version {0} is not part of this snippet's history")]
    UnknownVersion(String),

    #[error("version {0} is already shown")]
    CurrentVersion(String),

    #[error("could not load versions: {0}")]
    Client(#[from] ClientError),
}

/// Diff panel state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DiffState {
    #[default]
    Closed,
    Loading {
        source: String,
        target: String,
    },
    Loaded(DiffResponse),
    Failed {
        message: String,
    },
}

/// A diff between two versions, fetched fresh every time it is opened.
pub struct DiffView {
    service: SharedSnippetService,
    bus: Bus,
    state: DiffState,
}

impl DiffView {
    pub fn new(service: SharedSnippetService, bus: Bus) -> Self {
        Self {
            service,
            bus,
            state: DiffState::Closed,
        }
    }

    pub fn state(&self) -> &DiffState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, DiffState::Closed)
    }

    /// Request the diff from `source` to `target` and show it.
    pub async fn open(&mut self, source: &str, target: &str) -> &DiffState {
        self.state = DiffState::Loading {
            source: source.to_string(),
            target: target.to_string(),
        };

        debug!(source, target, "loading diff");
        self.state = match self.service.get_diff(source, target).await {
            Ok(diff) => DiffState::Loaded(diff),
            Err(err) => {
                warn!(source, target, "diff failed: {}", err);
                self.bus
                    .publish(Notification::error(
                        "Failed to load diff between versions",
                        None,
                    ))
                    .await;
                DiffState::Failed {
                    message: "Failed to load diff data".to_string(),
                }
            }
        };
        &self.state
    }

    /// Discard whatever is shown.
    pub fn close(&mut self) {
        self.state = DiffState::Closed;
    }
}

/// Navigation over the lineage of a resolved snippet.
///
/// The token the snippet was opened with is reused for every sibling.
pub struct VersionNavigator {
    service: SharedSnippetService,
    bus: Bus,
    current: Snippet,
    token: String,
    versions: Vec<SnippetVersion>,
    diff: DiffView,
}

impl VersionNavigator {
    pub fn new(
        service: SharedSnippetService,
        bus: Bus,
        snippet: Snippet,
        token: impl Into<String>,
    ) -> Self {
        let versions = snippet.lineage();
        Self {
            diff: DiffView::new(service.clone(), bus.clone()),
            service,
            bus,
            current: snippet,
            token: token.into(),
            versions,
        }
    }

    pub fn current(&self) -> &Snippet {
        &self.current
    }

    /// The lineage ordered by version ordinal.
    pub fn versions(&self) -> &[SnippetVersion] {
        &self.versions
    }

    /// Whether there is anything to navigate to.
    pub fn has_versions(&self) -> bool {
        self.versions.len() > 1
    }

    fn find(&self, version_id: &str) -> Result<&SnippetVersion, NavigatorError> {
        self.versions
            .iter()
            .find(|v| v.id == version_id)
            .ok_or_else(|| NavigatorError::UnknownVersion(version_id.to_string()))
    }

    /// Switch to a sibling version.
    ///
    /// Publishes the route; the caller loads it through a fresh access cycle.
    pub async fn select(&self, version_id: &str) -> Result<Route, NavigatorError> {
        if version_id == self.current.id {
            return Err(NavigatorError::CurrentVersion(version_id.to_string()));
        }
        let version = self.find(version_id)?;

        let route = Route::snippet(&version.id, &self.token);
        debug!(from = %self.current.id, to = %version.id, "switching version");
        self.bus
            .publish(NavigationRequested {
                route: route.clone(),
            })
            .await;
        Ok(route)
    }

    /// Re-read the lineage from the service.
    pub async fn refresh_versions(&mut self) -> Result<&[SnippetVersion], NavigatorError> {
        let mut versions = self.service.get_versions(&self.current.id).await?;
        versions.sort_by_key(|v| v.version);
        self.versions = versions;
        Ok(&self.versions)
    }

    /// Diff the current snippet against a sibling, older version first.
    pub async fn diff_against(&mut self, version_id: &str) -> Result<&DiffState, NavigatorError> {
        if version_id == self.current.id {
            return Err(NavigatorError::CurrentVersion(version_id.to_string()));
        }
        let other = self.find(version_id)?;

        let (source, target) = if other.version < self.current.version {
            (other.id.clone(), self.current.id.clone())
        } else {
            (self.current.id.clone(), other.id.clone())
        };
        Ok(self.diff.open(&source, &target).await)
    }

    pub fn diff(&self) -> &DiffView {
        &self.diff
    }

    pub fn diff_mut(&mut self) -> &mut DiffView {
        &mut self.diff
    }
}
