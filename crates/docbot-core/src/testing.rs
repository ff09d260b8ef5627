//! In-memory fakes of the core ports for unit tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use docbot_types::error::{StoreError, TransportError, VcsError};
use docbot_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason, ToolCall,
    Usage,
};
use docbot_types::project::Project;
use docbot_types::vcs::CommitSummary;

use crate::llm::LlmProvider;
use crate::store::DocumentStore;
use crate::transport::MessageTransport;
use crate::vcs::CommitLog;

type DocKey = (String, String);

/// Document store backed by a map.
pub(crate) struct MemoryDocumentStore {
    projects: Vec<Project>,
    docs: Mutex<BTreeMap<DocKey, String>>,
    unreadable: Mutex<BTreeSet<DocKey>>,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new(project_ids: &[&str]) -> Self {
        Self {
            projects: project_ids
                .iter()
                .map(|id| Project {
                    id: id.to_string(),
                    name: id.to_string(),
                    root: PathBuf::from(id),
                })
                .collect(),
            docs: Mutex::new(BTreeMap::new()),
            unreadable: Mutex::new(BTreeSet::new()),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn with_doc(self, project: &str, path: &str, content: &str) -> Self {
        self.docs
            .lock()
            .unwrap()
            .insert(key(project, path), content.to_string());
        self
    }

    pub fn get(&self, project: &str, path: &str) -> Option<String> {
        self.docs.lock().unwrap().get(&key(project, path)).cloned()
    }

    pub fn remove(&self, project: &str, path: &str) {
        self.docs.lock().unwrap().remove(&key(project, path));
    }

    /// Keep the document listed but fail every read of it.
    pub fn mark_unreadable(&self, project: &str, path: &str) {
        self.unreadable.lock().unwrap().insert(key(project, path));
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_project(&self, project: &str) -> Result<(), StoreError> {
        if self.projects.iter().any(|p| p.id == project) {
            Ok(())
        } else {
            Err(StoreError::UnknownProject(project.to_string()))
        }
    }
}

fn key(project: &str, path: &str) -> DocKey {
    (project.to_string(), path.to_string())
}

impl DocumentStore for MemoryDocumentStore {
    fn projects(&self) -> &[Project] {
        &self.projects
    }

    async fn list_documents(&self, project: &str) -> Result<Vec<String>, StoreError> {
        self.check_project(project)?;
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .keys()
            .filter(|(p, _)| p == project)
            .map(|(_, path)| path.clone())
            .collect())
    }

    async fn read(&self, project: &str, path: &str) -> Result<String, StoreError> {
        self.check_project(project)?;
        if self.unreadable.lock().unwrap().contains(&key(project, path)) {
            return Err(StoreError::Io(format!("permission denied: {project}/{path}")));
        }
        self.docs
            .lock()
            .unwrap()
            .get(&key(project, path))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{project}/{path}")))
    }

    async fn write(&self, project: &str, path: &str, content: &str) -> Result<(), StoreError> {
        self.check_project(project)?;
        self.docs
            .lock()
            .unwrap()
            .insert(key(project, path), content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Provider that replays scripted responses and records every request.
pub(crate) struct ScriptedProvider {
    capabilities: ProviderCapabilities,
    responses: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    requests: std::sync::Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<CompletionResponse, LlmError>>) -> Self {
        Self {
            capabilities: ProviderCapabilities {
                tool_calling: true,
                max_context_tokens: 200_000,
                max_output_tokens: 8192,
            },
            responses: Mutex::new(responses.into()),
            requests: std::sync::Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleep before answering, to exercise the inference timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared handle on recorded requests, usable after the provider is boxed.
    pub fn requests(&self) -> std::sync::Arc<Mutex<Vec<CompletionRequest>>> {
        std::sync::Arc::clone(&self.requests)
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::Provider {
                    message: "script exhausted".to_string(),
                })
            })
    }
}

pub(crate) fn text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        id: "msg_test".to_string(),
        content: text.to_string(),
        model: "test-model".to_string(),
        stop_reason: StopReason::EndTurn,
        usage: Usage {
            input_tokens: 10,
            output_tokens: 5,
        },
        tool_calls: Vec::new(),
    }
}

pub(crate) fn tool_response(calls: Vec<(&str, serde_json::Value)>) -> CompletionResponse {
    CompletionResponse {
        stop_reason: StopReason::ToolUse,
        content: String::new(),
        tool_calls: calls
            .into_iter()
            .enumerate()
            .map(|(i, (name, input))| ToolCall {
                id: format!("toolu_{i}"),
                name: name.to_string(),
                input,
            })
            .collect(),
        ..text_response("")
    }
}

pub(crate) fn edit_call(file_path: &str, find: &str, replace: &str) -> (&'static str, serde_json::Value) {
    (
        "edit_file",
        serde_json::json!({
            "file_path": file_path,
            "find_text": find,
            "replace_text": replace,
        }),
    )
}

/// Transport that records sends, optionally failing them.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl MessageTransport for RecordingTransport {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Send("connection reset".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Commit log returning a fixed result and recording the requested window.
pub(crate) struct StaticCommitLog {
    result: Result<Vec<CommitSummary>, VcsError>,
    requested: Mutex<Vec<u32>>,
}

impl StaticCommitLog {
    pub fn new(commits: Vec<CommitSummary>) -> Self {
        Self {
            result: Ok(commits),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(VcsError::Failed("not a git repository".to_string())),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

impl CommitLog for StaticCommitLog {
    async fn recent(&self, days: u32) -> Result<Vec<CommitSummary>, VcsError> {
        self.requested.lock().unwrap().push(days);
        self.result.clone()
    }
}
