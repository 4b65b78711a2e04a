//! Mock implementations for testing.
//!
//! [`MockSnippetService`] answers from scripted queues and records every call.
//! A queue pops its front reply while more than one is left; the last reply
//! repeats. Calls with nothing scripted fail with a 404 API error.

use async_trait::async_trait;
use ctrlv_client::{
    ClientError, ClientResult, CreateSnippetPayload, CreateSnippetResponse, DiffResponse,
    FetchOutcome, PasswordVerificationPayload, SnippetService, SnippetVersion,
    VerificationOutcome,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// A recorded service call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Create(CreateSnippetPayload),
    GetById { id: String, token: String },
    VerifyPassword {
        id: String,
        payload: PasswordVerificationPayload,
    },
    CreateVersion {
        parent_id: String,
        payload: CreateSnippetPayload,
    },
    GetVersions { id: String },
    GetDiff { source: String, target: String },
    GetStats,
}

#[derive(Default)]
struct MockState {
    fetches: HashMap<String, VecDeque<ClientResult<FetchOutcome>>>,
    verifications: HashMap<String, VecDeque<ClientResult<VerificationOutcome>>>,
    creates: VecDeque<ClientResult<CreateSnippetResponse>>,
    versions: VecDeque<ClientResult<Vec<SnippetVersion>>>,
    diffs: VecDeque<ClientResult<DiffResponse>>,
    stats: VecDeque<ClientResult<Value>>,
    gates: HashMap<String, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<MockCall>,
}

/// Holds back the next `get_by_id` reply for one snippet id.
///
/// The reply is released by [`FetchGate::release`] or by dropping the gate.
pub struct FetchGate {
    tx: oneshot::Sender<()>,
}

impl FetchGate {
    pub fn release(self) {
        let _ = self.tx.send(());
    }
}

/// A scripted snippet service.
///
/// # Example
///
/// ```rust
/// use ctrlv_client::VerificationOutcome;
/// use ctrlv_test_utils::mocks::MockSnippetService;
///
/// let service = MockSnippetService::new()
///     .with_verification("abc", Ok(VerificationOutcome::Verified(false)))
///     .with_verification("abc", Ok(VerificationOutcome::Verified(true)));
///
/// assert_eq!(service.verify_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockSnippetService {
    state: Arc<Mutex<MockState>>,
}

impl MockSnippetService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `get_by_id` reply for `id`.
    pub fn with_fetch(self, id: &str, reply: ClientResult<FetchOutcome>) -> Self {
        self.push_fetch(id, reply);
        self
    }

    /// Queue a `verify_password` reply for `id`.
    pub fn with_verification(self, id: &str, reply: ClientResult<VerificationOutcome>) -> Self {
        self.push_verification(id, reply);
        self
    }

    /// Queue a reply shared by `create` and `create_version`.
    pub fn with_create(self, reply: ClientResult<CreateSnippetResponse>) -> Self {
        self.state.lock().unwrap().creates.push_back(reply);
        self
    }

    pub fn with_versions(self, reply: ClientResult<Vec<SnippetVersion>>) -> Self {
        self.state.lock().unwrap().versions.push_back(reply);
        self
    }

    pub fn with_diff(self, reply: ClientResult<DiffResponse>) -> Self {
        self.state.lock().unwrap().diffs.push_back(reply);
        self
    }

    pub fn with_stats(self, reply: ClientResult<Value>) -> Self {
        self.state.lock().unwrap().stats.push_back(reply);
        self
    }

    /// Queue a fetch reply after construction.
    pub fn push_fetch(&self, id: &str, reply: ClientResult<FetchOutcome>) {
        self.state
            .lock()
            .unwrap()
            .fetches
            .entry(id.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn push_verification(&self, id: &str, reply: ClientResult<VerificationOutcome>) {
        self.state
            .lock()
            .unwrap()
            .verifications
            .entry(id.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Hold the next fetch of `id` until the returned gate is released.
    pub fn hold_fetch(&self, id: &str) -> FetchGate {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .unwrap()
            .gates
            .entry(id.to_string())
            .or_default()
            .push_back(rx);
        FetchGate { tx }
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn fetch_count(&self) -> usize {
        self.count(|c| matches!(c, MockCall::GetById { .. }))
    }

    pub fn verify_count(&self) -> usize {
        self.count(|c| matches!(c, MockCall::VerifyPassword { .. }))
    }

    /// `create` and `create_version` calls together.
    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Create(_) | MockCall::CreateVersion { .. }))
    }

    pub fn diff_count(&self) -> usize {
        self.count(|c| matches!(c, MockCall::GetDiff { .. }))
    }

    /// Yield until at least `n` fetches have been issued.
    pub async fn wait_for_fetches(&self, n: usize) {
        for _ in 0..10_000 {
            if self.fetch_count() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!(
            "expected {} fetches, saw {}",
            n,
            self.fetch_count()
        );
    }

    /// Yield until at least `n` verifications have been issued.
    pub async fn wait_for_verifications(&self, n: usize) {
        for _ in 0..10_000 {
            if self.verify_count() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!(
            "expected {} verifications, saw {}",
            n,
            self.verify_count()
        );
    }

    fn record(&self, call: MockCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn not_scripted(what: &str) -> ClientError {
    ClientError::api(404, &format!("{{\"detail\": \"no scripted {}\"}}", what))
}

fn next_reply<T: Clone>(
    queue: Option<&mut VecDeque<ClientResult<T>>>,
    what: &str,
) -> ClientResult<T> {
    match queue {
        Some(queue) if queue.len() > 1 => queue
            .pop_front()
            .unwrap_or_else(|| Err(not_scripted(what))),
        Some(queue) => queue
            .front()
            .cloned()
            .unwrap_or_else(|| Err(not_scripted(what))),
        None => Err(not_scripted(what)),
    }
}

#[async_trait]
impl SnippetService for MockSnippetService {
    async fn create(&self, payload: &CreateSnippetPayload) -> ClientResult<CreateSnippetResponse> {
        self.record(MockCall::Create(payload.clone()));
        next_reply(Some(&mut self.state.lock().unwrap().creates), "create")
    }

    async fn get_by_id(&self, id: &str, token: &str) -> ClientResult<FetchOutcome> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(MockCall::GetById {
                id: id.to_string(),
                token: token.to_string(),
            });
            state.gates.get_mut(id).and_then(|gates| gates.pop_front())
        };

        if let Some(gate) = gate {
            // A dropped gate releases too.
            let _ = gate.await;
        }

        next_reply(self.state.lock().unwrap().fetches.get_mut(id), "fetch")
    }

    async fn verify_password(
        &self,
        id: &str,
        payload: &PasswordVerificationPayload,
    ) -> ClientResult<VerificationOutcome> {
        self.record(MockCall::VerifyPassword {
            id: id.to_string(),
            payload: payload.clone(),
        });
        next_reply(
            self.state.lock().unwrap().verifications.get_mut(id),
            "verification",
        )
    }

    async fn create_version(
        &self,
        parent_id: &str,
        payload: &CreateSnippetPayload,
    ) -> ClientResult<CreateSnippetResponse> {
        self.record(MockCall::CreateVersion {
            parent_id: parent_id.to_string(),
            payload: payload.clone(),
        });
        next_reply(Some(&mut self.state.lock().unwrap().creates), "create")
    }

    async fn get_versions(&self, id: &str) -> ClientResult<Vec<SnippetVersion>> {
        self.record(MockCall::GetVersions { id: id.to_string() });
        next_reply(Some(&mut self.state.lock().unwrap().versions), "versions")
    }

    async fn get_diff(&self, source_id: &str, target_id: &str) -> ClientResult<DiffResponse> {
        self.record(MockCall::GetDiff {
            source: source_id.to_string(),
            target: target_id.to_string(),
        });
        next_reply(Some(&mut self.state.lock().unwrap().diffs), "diff")
    }

    async fn get_stats(&self) -> ClientResult<Value> {
        self.record(MockCall::GetStats);
        next_reply(Some(&mut self.state.lock().unwrap().stats), "stats")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::SnippetBuilder;

    #[tokio::test]
    async fn test_last_reply_repeats() {
        let service = MockSnippetService::new()
            .with_fetch("a", Ok(FetchOutcome::AccessChallenge))
            .with_fetch(
                "a",
                Ok(FetchOutcome::Content(SnippetBuilder::new("a").build())),
            );

        assert_eq!(
            service.get_by_id("a", "t").await.unwrap(),
            FetchOutcome::AccessChallenge
        );
        for _ in 0..2 {
            assert!(matches!(
                service.get_by_id("a", "t").await.unwrap(),
                FetchOutcome::Content(_)
            ));
        }
        assert_eq!(service.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_unscripted_call_is_not_found() {
        let service = MockSnippetService::new();
        let err = service.get_diff("a", "b").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            service.calls(),
            vec![MockCall::GetDiff {
                source: "a".into(),
                target: "b".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_held_fetch_waits_for_release() {
        let service = MockSnippetService::new().with_fetch("a", Ok(FetchOutcome::AccessChallenge));
        let gate = service.hold_fetch("a");

        let task = {
            let service = service.clone();
            tokio::spawn(async move { service.get_by_id("a", "t").await })
        };
        service.wait_for_fetches(1).await;
        assert!(!task.is_finished());

        gate.release();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome, FetchOutcome::AccessChallenge);
    }
}
