//! Application state wiring all components together.
//!
//! `Runtime` holds everything loaded from configuration (projects, store,
//! sessions, commit log, pipeline settings) and builds a `Dispatcher` for a
//! given transport. `AppState` pins that dispatcher to Slack for the HTTP
//! server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use docbot_core::access::AccessGate;
use docbot_core::dispatch::{DispatchSettings, Dispatcher};
use docbot_core::inference::RequestSettings;
use docbot_core::llm::BoxLlmProvider;
use docbot_core::session::SessionManager;
use docbot_core::store::DocumentStore;
use docbot_core::transport::MessageTransport;
use docbot_infra::config::{
    config_base_dir, load_config, resolve_config_path, resolve_projects, resolve_repository_root,
    resolve_shared_docs,
};
use docbot_infra::filesystem::LocalDocumentStore;
use docbot_infra::llm::{ANTHROPIC_API_KEY_ENV, create_provider};
use docbot_infra::secret::EnvSecrets;
use docbot_infra::slack::{SLACK_BOT_TOKEN_ENV, SLACK_SIGNING_SECRET_ENV, SlackTransport};
use docbot_infra::vcs::GitCommitLog;
use docbot_types::chat::SessionPolicy;
use docbot_types::config::DocbotConfig;
use docbot_types::error::ConfigError;
use docbot_types::project::Project;

/// How often expired sessions are purged.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Concrete dispatcher for the Slack server.
pub type SlackDispatcher = Dispatcher<LocalDocumentStore, SlackTransport, GitCommitLog>;

/// Everything derived from the config file and environment.
pub struct Runtime {
    pub config: DocbotConfig,
    pub config_path: PathBuf,
    pub projects: Vec<Project>,
    pub store: Arc<LocalDocumentStore>,
    pub sessions: Arc<SessionManager>,
    pub commits: Arc<GitCommitLog>,
    pub secrets: EnvSecrets,
}

impl Runtime {
    /// Load configuration and build the shared components.
    pub async fn load(explicit_config: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(explicit_config);
        let config = load_config(&config_path).await?;
        Ok(Self::from_config(config, config_path, EnvSecrets::load())?)
    }

    pub fn from_config(
        config: DocbotConfig,
        config_path: PathBuf,
        secrets: EnvSecrets,
    ) -> Result<Self, ConfigError> {
        let base_dir = config_base_dir(&config_path);
        let repo_root = resolve_repository_root(&config, &base_dir);
        let timeout = config.session_timeout().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "session_timeout_secs out of range: {}",
                config.session_timeout_secs
            ))
        })?;
        let policy = SessionPolicy::new(config.max_session_turns, timeout);

        let mut store = LocalDocumentStore::new(resolve_projects(&config, &base_dir));
        if let Some(shared) = resolve_shared_docs(&config, &base_dir) {
            store = store.with_shared(shared);
        }
        // Includes the shared-docs project, so the gate hands it to every
        // unrestricted channel and to no restricted one.
        let projects = store.projects().to_vec();

        Ok(Self {
            store: Arc::new(store),
            sessions: Arc::new(SessionManager::new(policy)),
            commits: Arc::new(GitCommitLog::new(repo_root)),
            projects,
            config,
            config_path,
            secrets,
        })
    }

    pub fn settings(&self) -> DispatchSettings {
        DispatchSettings {
            request: RequestSettings {
                model: self.config.model.clone(),
                max_tokens: self.config.max_tokens,
                recent_updates_days: self.config.recent_updates_days,
            },
            inference_timeout: Duration::from_secs(self.config.inference_timeout_secs),
            context_budget: self.config.context_budget_chars,
        }
    }

    pub fn gate(&self) -> AccessGate {
        AccessGate::from_config(&self.projects, &self.config.channel_access)
    }

    /// Build the inference provider from `ANTHROPIC_API_KEY`.
    pub fn provider(&self) -> anyhow::Result<BoxLlmProvider> {
        create_provider(&self.config.model, self.secrets.anthropic_api_key.clone())
            .with_context(|| format!("cannot create inference provider (is {ANTHROPIC_API_KEY_ENV} set?)"))
    }

    pub fn dispatcher<T: MessageTransport>(
        &self,
        provider: BoxLlmProvider,
        transport: Arc<T>,
    ) -> Dispatcher<LocalDocumentStore, T, GitCommitLog> {
        Dispatcher::new(
            Arc::clone(&self.store),
            Arc::clone(&self.sessions),
            self.gate(),
            provider,
            transport,
            Arc::clone(&self.commits),
            self.settings(),
        )
    }
}

/// Shared state for the Slack events endpoint.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<SlackDispatcher>,
    pub transport: Arc<SlackTransport>,
    pub signing_secret: Arc<SecretString>,
}

impl AppState {
    /// Wire the Slack transport and dispatcher. Requires all three secrets.
    pub fn init(runtime: &Runtime) -> anyhow::Result<Self> {
        let token = runtime
            .secrets
            .slack_bot_token
            .clone()
            .with_context(|| format!("{SLACK_BOT_TOKEN_ENV} is not set"))?;
        let signing_secret = runtime
            .secrets
            .slack_signing_secret
            .clone()
            .with_context(|| format!("{SLACK_SIGNING_SECRET_ENV} is not set"))?;

        let transport = Arc::new(SlackTransport::new(token)?);
        let dispatcher = runtime.dispatcher(runtime.provider()?, Arc::clone(&transport));

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            transport,
            signing_secret: Arc::new(signing_secret),
        })
    }
}

/// Purge expired sessions every `interval` until `shutdown` is cancelled.
pub fn spawn_session_sweeper(
    sessions: Arc<SessionManager>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                // The manager logs what it removed.
                _ = ticker.tick() => {
                    sessions.sweep_expired();
                }
            }
        }
        tracing::debug!("session sweeper stopped");
    })
}
