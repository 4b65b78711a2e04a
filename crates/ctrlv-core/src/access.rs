//! Snippet access resolution.
//!
//! [`AccessController`] takes a snippet id and its token and works out what
//! the viewer may see: the content, an access password prompt, a decryption
//! password prompt, or a failure. Both gates may apply to one snippet, in
//! which case the access check comes first and the decrypt prompt second.
//!
//! Every `load` and `cancel` starts a new cycle. Replies that arrive for an
//! older cycle are dropped without touching the state.

use ctrlv_client::{
    ClientError, ClientResult, FetchOutcome, PasswordAction, PasswordVerificationPayload,
    SharedSnippetService, Snippet, VerificationOutcome,
};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::bus::{Bus, NavigationRequested, Notification};
use crate::error::SnippetError;
use crate::route::Route;

const INVALID_PASSWORD: &str = "Invalid password";
const VERIFY_FAILED: &str = "Failed to verify password";

/// Input state of a password prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordPrompt {
    /// Message from the last rejected attempt.
    pub error: Option<String>,
    /// A verification is in flight; the prompt must not submit again.
    pub submitting: bool,
}

impl PasswordPrompt {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            submitting: false,
        }
    }
}

/// Why a snippet cannot be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No token was presented.
    InvalidToken,
    /// The snippet could not be read.
    Unavailable(SnippetError),
    /// A password was submitted but could not be checked.
    Verification(SnippetError),
}

impl FailureReason {
    /// The underlying classified error, if there was one.
    pub fn cause(&self) -> Option<&SnippetError> {
        match self {
            FailureReason::InvalidToken => None,
            FailureReason::Unavailable(err) | FailureReason::Verification(err) => Some(err),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureReason::InvalidToken => "Invalid access token",
            FailureReason::Unavailable(_) => "Snippet not found or has expired",
            FailureReason::Verification(_) => VERIFY_FAILED,
        })
    }
}

/// Where a resolution cycle stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AccessState {
    #[default]
    Idle,
    Loading,
    Resolved(Snippet),
    RequiresAccessPassword(PasswordPrompt),
    /// Metadata is known; `snippet.content` is only a placeholder.
    RequiresDecryptPassword {
        snippet: Snippet,
        prompt: PasswordPrompt,
    },
    Failed(FailureReason),
}

impl AccessState {
    pub fn prompt(&self) -> Option<&PasswordPrompt> {
        match self {
            AccessState::RequiresAccessPassword(prompt)
            | AccessState::RequiresDecryptPassword { prompt, .. } => Some(prompt),
            _ => None,
        }
    }

    fn prompt_mut(&mut self) -> Option<&mut PasswordPrompt> {
        match self {
            AccessState::RequiresAccessPassword(prompt)
            | AccessState::RequiresDecryptPassword { prompt, .. } => Some(prompt),
            _ => None,
        }
    }

    /// The resolved snippet, if any.
    pub fn snippet(&self) -> Option<&Snippet> {
        match self {
            AccessState::Resolved(snippet) => Some(snippet),
            _ => None,
        }
    }

    /// `Resolved` and `Failed` are only left by loading another snippet.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AccessState::Resolved(_) | AccessState::Failed(_))
    }

    fn name(&self) -> &'static str {
        match self {
            AccessState::Idle => "idle",
            AccessState::Loading => "loading",
            AccessState::Resolved(_) => "resolved",
            AccessState::RequiresAccessPassword(_) => "requires_access_password",
            AccessState::RequiresDecryptPassword { .. } => "requires_decrypt_password",
            AccessState::Failed(_) => "failed",
        }
    }
}

/// Reasons a password submission is refused before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("no password is being asked for")]
    NotChallenged,

    #[error("a password check is already in progress")]
    VerificationInFlight,

    #[error("Password cannot be empty")]
    EmptyPassword,
}

#[derive(Debug, Default)]
struct Cycle {
    generation: u64,
    key: Option<(String, String)>,
    verifying: bool,
}

/// Identifies the cycle an awaited reply belongs to.
#[derive(Debug, Clone)]
struct Ticket {
    generation: u64,
    id: String,
    token: String,
}

impl Ticket {
    fn is_current(&self, cycle: &Cycle) -> bool {
        cycle.generation == self.generation
            && cycle
                .key
                .as_ref()
                .is_some_and(|(id, token)| *id == self.id && *token == self.token)
    }
}

/// Drives one view's snippet resolution.
pub struct AccessController {
    service: SharedSnippetService,
    bus: Bus,
    state: watch::Sender<AccessState>,
    cycle: Mutex<Cycle>,
}

impl AccessController {
    pub fn new(service: SharedSnippetService, bus: Bus) -> Self {
        let (state, _) = watch::channel(AccessState::Idle);
        Self {
            service,
            bus,
            state,
            cycle: Mutex::new(Cycle::default()),
        }
    }

    /// Current state.
    pub fn state(&self) -> AccessState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<AccessState> {
        self.state.subscribe()
    }

    fn cycle(&self) -> MutexGuard<'_, Cycle> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start resolving `id` with `token`.
    ///
    /// A missing or empty token fails immediately without a request. Returns
    /// the state once this cycle's reply has been applied, or the current
    /// state if the cycle was superseded meanwhile.
    pub async fn load(&self, id: &str, token: Option<&str>) -> AccessState {
        let token = token.filter(|t| !t.is_empty());

        let ticket = {
            let mut cycle = self.cycle();
            cycle.generation += 1;
            cycle.verifying = false;

            let Some(token) = token else {
                cycle.key = None;
                debug!(id, "no access token, not fetching");
                self.state
                    .send_replace(AccessState::Failed(FailureReason::InvalidToken));
                return self.state();
            };

            cycle.key = Some((id.to_string(), token.to_string()));
            self.state.send_replace(AccessState::Loading);
            Ticket {
                generation: cycle.generation,
                id: id.to_string(),
                token: token.to_string(),
            }
        };

        debug!(id, generation = ticket.generation, "loading snippet");
        let fetched = self.service.get_by_id(&ticket.id, &ticket.token).await;
        let next = classify_fetch(fetched);
        self.commit(&ticket, |state| *state = next);
        self.state()
    }

    /// Submit a password for the current challenge.
    ///
    /// A wrong password keeps the prompt open with an error; it is not an
    /// `Err`. Errors are only returned when nothing could be sent.
    pub async fn submit_password(&self, password: &str) -> Result<AccessState, AccessError> {
        if password.trim().is_empty() {
            return Err(AccessError::EmptyPassword);
        }

        let (ticket, action) = {
            let mut cycle = self.cycle();
            if cycle.verifying {
                return Err(AccessError::VerificationInFlight);
            }
            let Some((id, token)) = cycle.key.clone() else {
                return Err(AccessError::NotChallenged);
            };
            let action = match &*self.state.borrow() {
                AccessState::RequiresAccessPassword(_) => PasswordAction::CheckPassword,
                AccessState::RequiresDecryptPassword { .. } => PasswordAction::Decrypt,
                _ => return Err(AccessError::NotChallenged),
            };

            cycle.verifying = true;
            self.state.send_modify(|state| {
                if let Some(prompt) = state.prompt_mut() {
                    prompt.submitting = true;
                }
            });
            let ticket = Ticket {
                generation: cycle.generation,
                id,
                token,
            };
            (ticket, action)
        };

        debug!(id = %ticket.id, action = action.as_str(), "submitting password");
        let payload = PasswordVerificationPayload::new(action, password);
        let verified = self.service.verify_password(&ticket.id, &payload).await;

        match action {
            PasswordAction::CheckPassword => self.finish_access_check(&ticket, verified).await,
            PasswordAction::Decrypt => self.finish_decrypt(&ticket, verified).await,
        }
        Ok(self.state())
    }

    /// Abandon the current cycle and ask to return to the creation page.
    ///
    /// The state is left as it is; replies still in flight are ignored.
    pub async fn cancel(&self) {
        {
            let mut cycle = self.cycle();
            cycle.generation += 1;
            cycle.key = None;
            cycle.verifying = false;
        }
        debug!("snippet view cancelled");
        self.bus
            .publish(NavigationRequested {
                route: Route::Create,
            })
            .await;
    }

    async fn finish_access_check(
        &self,
        ticket: &Ticket,
        verified: ClientResult<VerificationOutcome>,
    ) {
        match verified {
            Ok(VerificationOutcome::Verified(true)) => {
                if !self.is_current(ticket) {
                    return;
                }
                let fetched = self.service.get_by_id(&ticket.id, &ticket.token).await;
                let next = match classify_fetch(fetched) {
                    AccessState::RequiresAccessPassword(_) => {
                        warn!(id = %ticket.id, "still gated after a successful password check");
                        AccessState::Failed(FailureReason::Verification(SnippetError::Access(
                            "Password was not accepted".to_string(),
                        )))
                    }
                    other => other,
                };
                let granted = !matches!(next, AccessState::Failed(_));
                if self.commit(ticket, |state| *state = next) && granted {
                    self.bus
                        .publish(Notification::info("Access granted", None))
                        .await;
                }
            }
            // Some deployments answer the check with the content itself.
            Ok(VerificationOutcome::Resolved(snippet)) => {
                if self.commit(ticket, |state| *state = AccessState::Resolved(snippet)) {
                    self.bus
                        .publish(Notification::info("Access granted", None))
                        .await;
                }
            }
            Ok(VerificationOutcome::Verified(false)) => self.reprompt(ticket, INVALID_PASSWORD),
            Ok(VerificationOutcome::Rejected { error }) => self.reprompt(ticket, error),
            Err(err) => self.verification_failed(ticket, &err),
        }
    }

    async fn finish_decrypt(&self, ticket: &Ticket, verified: ClientResult<VerificationOutcome>) {
        match verified {
            Ok(VerificationOutcome::Resolved(snippet)) => {
                if self.commit(ticket, |state| *state = AccessState::Resolved(snippet)) {
                    self.bus
                        .publish(Notification::info("Content decrypted successfully", None))
                        .await;
                }
            }
            // Verified without content gives nothing to show.
            Ok(VerificationOutcome::Verified(true)) => self.reprompt(ticket, VERIFY_FAILED),
            Ok(VerificationOutcome::Verified(false)) => self.reprompt(ticket, INVALID_PASSWORD),
            Ok(VerificationOutcome::Rejected { error }) => self.reprompt(ticket, error),
            Err(err) => self.verification_failed(ticket, &err),
        }
    }

    fn verification_failed(&self, ticket: &Ticket, err: &ClientError) {
        let classified = SnippetError::classify(err);
        warn!(id = %ticket.id, "password verification failed: {}", err);
        match classified {
            SnippetError::Access(message) | SnippetError::Validation(message) => {
                self.reprompt(ticket, message)
            }
            SnippetError::NotFoundOrExpired => {
                self.commit(ticket, |state| {
                    *state = AccessState::Failed(FailureReason::Unavailable(
                        SnippetError::NotFoundOrExpired,
                    ))
                });
            }
            transport @ SnippetError::Transport(_) => {
                self.commit(ticket, |state| {
                    *state = AccessState::Failed(FailureReason::Verification(transport))
                });
            }
        }
    }

    /// Keep the current prompt open with `error`.
    fn reprompt(&self, ticket: &Ticket, error: impl Into<String>) {
        let error = error.into();
        self.commit(ticket, |state| {
            if let Some(prompt) = state.prompt_mut() {
                *prompt = PasswordPrompt::rejected(error);
            }
        });
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.is_current(&self.cycle())
    }

    /// Apply `update` if `ticket` still names the current cycle.
    fn commit(&self, ticket: &Ticket, update: impl FnOnce(&mut AccessState)) -> bool {
        let mut cycle = self.cycle();
        if !ticket.is_current(&cycle) {
            debug!(
                id = %ticket.id,
                generation = ticket.generation,
                "dropping reply for a superseded cycle"
            );
            return false;
        }
        cycle.verifying = false;
        self.state.send_modify(update);
        debug!(id = %ticket.id, state = self.state.borrow().name(), "access state changed");
        true
    }
}

fn classify_fetch(fetched: ClientResult<FetchOutcome>) -> AccessState {
    match fetched {
        Ok(FetchOutcome::Content(snippet)) => AccessState::Resolved(snippet),
        Ok(FetchOutcome::AccessChallenge) => {
            AccessState::RequiresAccessPassword(PasswordPrompt::default())
        }
        Ok(FetchOutcome::DecryptChallenge(snippet)) => AccessState::RequiresDecryptPassword {
            snippet,
            prompt: PasswordPrompt::default(),
        },
        Err(err) if err.requires_password() => {
            AccessState::RequiresAccessPassword(PasswordPrompt::default())
        }
        Err(err) => {
            warn!("snippet fetch failed: {}", err);
            AccessState::Failed(FailureReason::Unavailable(SnippetError::classify(&err)))
        }
    }
}
