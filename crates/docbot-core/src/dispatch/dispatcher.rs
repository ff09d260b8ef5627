//! Dispatcher: one inbound message in, one reply out.
//!
//! The channel's session lock is held for the whole run, so messages from
//! one channel are processed strictly in arrival order while other channels
//! proceed concurrently. Session turns change only on `Answered`, `Edited`,
//! and `EditFailed`; a refused or failed message leaves history untouched.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{Instrument, debug, error, field, info, info_span, warn};

use docbot_types::edit::{EditDirective, EditReport};
use docbot_types::error::{EditRejection, InferenceError};
use docbot_types::llm::{CompletionRequest, CompletionResponse};
use docbot_types::message::{InboundMessage, PipelineState};

use super::report;
use crate::access::{AccessGate, mentioned_projects};
use crate::edit::EditEngine;
use crate::inference::prompt::attach_commit_log;
use crate::inference::{Interpretation, RequestSettings, build_request, interpret};
use crate::llm::BoxLlmProvider;
use crate::retrieval::RetrievalEngine;
use crate::session::SessionManager;
use crate::store::DocumentStore;
use crate::transport::MessageTransport;
use crate::vcs::{CommitLog, render_commit_log};

/// Pipeline tuning taken from configuration.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub request: RequestSettings,
    pub inference_timeout: Duration,
    /// Character budget for retrieved context.
    pub context_budget: usize,
}

/// Terminal state of a run and the reply that was (or would have been) sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub state: PipelineState,
    pub reply: String,
}

/// Tracks the state of one run and logs every transition.
struct Run<'a> {
    channel: &'a str,
    state: PipelineState,
}

impl Run<'_> {
    fn advance(&mut self, next: PipelineState) {
        debug!(channel = self.channel, from = %self.state, to = %next, "pipeline transition");
        self.state = next;
    }

    fn finish(mut self, terminal: PipelineState, reply: String) -> PipelineOutcome {
        self.advance(terminal);
        PipelineOutcome {
            state: terminal,
            reply,
        }
    }
}

/// Wires the session manager, access gate, retrieval, inference, and edit
/// engine into the per-message pipeline.
pub struct Dispatcher<S, T, G> {
    store: Arc<S>,
    sessions: Arc<SessionManager>,
    gate: AccessGate,
    retrieval: RetrievalEngine<S>,
    edits: EditEngine<S>,
    provider: BoxLlmProvider,
    transport: Arc<T>,
    commits: Arc<G>,
    settings: DispatchSettings,
}

impl<S, T, G> Dispatcher<S, T, G>
where
    S: DocumentStore,
    T: MessageTransport,
    G: CommitLog,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<S>,
        sessions: Arc<SessionManager>,
        gate: AccessGate,
        provider: BoxLlmProvider,
        transport: Arc<T>,
        commits: Arc<G>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            retrieval: RetrievalEngine::new(Arc::clone(&store)),
            edits: EditEngine::new(Arc::clone(&store)),
            store,
            sessions,
            gate,
            provider,
            transport,
            commits,
            settings,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Run the pipeline for `message` and send the reply to its channel.
    ///
    /// A failed send is logged; it does not change the outcome.
    pub async fn handle(&self, message: &InboundMessage) -> PipelineOutcome {
        let outcome = self.process(message).await;

        if let Err(e) = self.transport.send(&message.channel_id, &outcome.reply).await {
            error!(channel = %message.channel_id, error = %e, "failed to send reply");
        }
        info!(
            channel = %message.channel_id,
            author = %message.author_id,
            state = %outcome.state,
            "message handled"
        );
        outcome
    }

    /// Run the pipeline without sending anything.
    pub async fn process(&self, message: &InboundMessage) -> PipelineOutcome {
        let channel = message.channel_id.as_str();
        let mut run = Run {
            channel,
            state: PipelineState::Received,
        };

        let mut session = match self.sessions.lock(channel).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "rejecting message");
                return run.finish(PipelineState::Failed, report::invalid_channel());
            }
        };
        session.refresh_at(Utc::now());
        // The only expiry check of the run; commits below append unconditionally.
        let history = session.snapshot();

        run.advance(PipelineState::Authorizing);
        let requested = self.requested_projects(channel, &message.text);
        let allowed = match self.gate.authorize(channel, &requested) {
            Ok(allowed) => allowed,
            Err(e) => return run.finish(PipelineState::Refused, report::refusal(&e)),
        };

        run.advance(PipelineState::Retrieving);
        let excerpts = self
            .retrieval
            .retrieve(&message.text, &allowed, self.settings.context_budget)
            .await;

        run.advance(PipelineState::Inferring);
        let mut request = build_request(
            &self.settings.request,
            &excerpts,
            &history,
            &message.text,
            true,
        );
        let interpretation = match self.infer(&mut request, &mut run).await {
            Ok(interpretation) => interpretation,
            Err(e) => {
                warn!(channel, error = %e, "inference failed");
                return run.finish(PipelineState::Failed, report::inference_failure(&e));
            }
        };

        match interpretation {
            Interpretation::Answer(text) => {
                session.commit_exchange_at(&message.text, &text, Utc::now());
                run.finish(PipelineState::Answered, text)
            }
            Interpretation::Edits(directives) => {
                run.advance(PipelineState::Editing);
                let edit_report = self.apply_edits(channel, &directives).await;
                let reply = report::edit_summary(&edit_report);
                session.commit_exchange_at(&message.text, &reply, Utc::now());
                let terminal = if edit_report.is_success() {
                    PipelineState::Edited
                } else {
                    PipelineState::EditFailed
                };
                run.finish(terminal, reply)
            }
            // `infer` resolves recent-update requests before returning.
            Interpretation::RecentUpdates { .. } => run.finish(
                PipelineState::Failed,
                report::inference_failure(&InferenceError::Malformed(
                    "unresolved recent-updates request".to_string(),
                )),
            ),
        }
    }

    /// Projects named in the message, or everything the channel may see.
    fn requested_projects(&self, channel: &str, text: &str) -> BTreeSet<String> {
        let mentioned = mentioned_projects(text, self.store.projects());
        if mentioned.is_empty() {
            self.gate.allowed_projects(channel)
        } else {
            mentioned
        }
    }

    /// Call the model and interpret the result, resolving one round of
    /// `get_recent_updates` by fetching the commit log and asking again.
    async fn infer(
        &self,
        request: &mut CompletionRequest,
        run: &mut Run<'_>,
    ) -> Result<Interpretation, InferenceError> {
        let default_days = self.settings.request.recent_updates_days;

        let response = self.complete(request).await?;
        run.advance(PipelineState::Interpreting);
        let days = match interpret(&response, default_days)? {
            Interpretation::RecentUpdates { days } => days,
            other => return Ok(other),
        };

        let log = match self.commits.recent(days).await {
            Ok(commits) => render_commit_log(days, &commits),
            Err(e) => {
                warn!(error = %e, days, "could not read commit log");
                format!("The repository history could not be read ({e}).")
            }
        };
        attach_commit_log(request, &log);

        run.advance(PipelineState::Inferring);
        let response = self.complete(request).await?;
        run.advance(PipelineState::Interpreting);
        match interpret(&response, default_days)? {
            Interpretation::RecentUpdates { .. } => Err(InferenceError::Malformed(
                "repeated recent-updates request".to_string(),
            )),
            other => Ok(other),
        }
    }

    /// One provider call, bounded by the inference timeout.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, InferenceError> {
        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.tools = request.tools.len(),
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
            gen_ai.response.stop_reason = field::Empty,
        );

        let timeout = self.settings.inference_timeout;
        let response = tokio::time::timeout(
            timeout,
            self.provider.complete(request).instrument(span.clone()),
        )
        .await
        .map_err(|_| InferenceError::Timeout(timeout))??;

        span.record("gen_ai.usage.input_tokens", response.usage.input_tokens);
        span.record("gen_ai.usage.output_tokens", response.usage.output_tokens);
        span.record(
            "gen_ai.response.stop_reason",
            field::display(&response.stop_reason),
        );
        Ok(response)
    }

    /// Apply directives in order, stopping at the first failure.
    async fn apply_edits(&self, channel: &str, directives: &[EditDirective]) -> EditReport {
        let mut report = EditReport::default();

        for (index, directive) in directives.iter().enumerate() {
            let result = match self.gate.authorize_edit(channel, &directive.project) {
                Ok(()) => self.edits.apply(directive).await.map(|_| ()),
                Err(_) => Err(EditRejection::AccessDenied(directive.project.clone())),
            };

            if let Err(rejection) = result {
                warn!(channel, target = %directive.target(), reason = %rejection, "edit failed");
                report.failed = Some((directive.target(), rejection));
                report.skipped = directives.len() - index - 1;
                break;
            }
            report.applied.push(directive.target());
        }
        report
    }
}
