use crate::drafts::{DraftId, DraftManager, DEFAULT_DRAFT_TTL};
use crate::events::EventBus;
use crate::handlers::rooms::{self, error_response, PreviewRequest};
use bgo_engine::economics::PercentBasis;
use bgo_engine::room::{RoomDraft, SubmissionPolicy, UnbalancedPolicy};
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection};

const MAX_BODY_BYTES: u64 = 64 * 1024;
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    draft_ttl: Duration,
    policy: SubmissionPolicy,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            draft_ttl: DEFAULT_DRAFT_TTL,
            policy: SubmissionPolicy::default(),
        }
    }

    pub fn for_tests() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `BGO_WEB_HOST`, `BGO_WEB_PORT`, `BGO_DRAFT_TTL_SECS`,
    /// `BGO_PERCENT_BASIS` and `BGO_BLOCK_UNBALANCED` through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("BGO_WEB_HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = match get("BGO_WEB_PORT") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ServerError::ConfigError(format!("Invalid port: {}", v)))?,
            None => 8080,
        };
        let mut config = Self::new(host, port);

        if let Some(v) = get("BGO_DRAFT_TTL_SECS") {
            let secs: u64 = v
                .trim()
                .parse()
                .map_err(|_| ServerError::ConfigError(format!("Invalid draft TTL: {}", v)))?;
            if secs == 0 {
                return Err(ServerError::ConfigError("draft TTL must be >0".into()));
            }
            config.draft_ttl = Duration::from_secs(secs);
        }
        if let Some(v) = get("BGO_PERCENT_BASIS") {
            config.policy.basis = v.parse::<PercentBasis>().map_err(ServerError::ConfigError)?;
        }
        if let Some(v) = get("BGO_BLOCK_UNBALANCED") {
            config.policy.unbalanced = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => UnbalancedPolicy::Block,
                "0" | "false" | "off" | "no" => UnbalancedPolicy::Warn,
                _ => {
                    return Err(ServerError::ConfigError(format!(
                        "Invalid BGO_BLOCK_UNBALANCED: {}",
                        v
                    )))
                }
            };
        }
        Ok(config)
    }

    pub fn with_draft_ttl(mut self, ttl: Duration) -> Self {
        self.draft_ttl = ttl;
        self
    }

    pub fn with_policy(mut self, policy: SubmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn draft_ttl(&self) -> Duration {
        self.draft_ttl
    }

    pub fn policy(&self) -> SubmissionPolicy {
        self.policy
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::ConfigError(format!("Invalid address: {}:{}", self.host, self.port)))
    }
}

#[derive(Debug, Clone)]
pub struct AppContext {
    config: ServerConfig,
    event_bus: Arc<EventBus>,
    drafts: Arc<DraftManager>,
}

impl AppContext {
    pub fn new(config: ServerConfig) -> Self {
        let event_bus = Arc::new(EventBus::new());
        let drafts = Arc::new(DraftManager::with_ttl(
            Arc::clone(&event_bus),
            config.policy(),
            config.draft_ttl(),
        ));
        Self::new_with_dependencies(config, event_bus, drafts)
    }

    pub fn new_with_dependencies(
        config: ServerConfig,
        event_bus: Arc<EventBus>,
        drafts: Arc<DraftManager>,
    ) -> Self {
        Self {
            config,
            event_bus,
            drafts,
        }
    }

    pub fn new_for_tests() -> Self {
        Self::new(ServerConfig::for_tests())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn drafts(&self) -> Arc<DraftManager> {
        Arc::clone(&self.drafts)
    }
}

pub fn routes(ctx: &AppContext) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
    let preview = warp::path!("api" / "economics" / "preview")
        .and(warp::post())
        .and(json_body::<PreviewRequest>())
        .then(rooms::preview);

    let create = with_drafts(ctx.drafts())
        .and(warp::path!("api" / "drafts"))
        .and(warp::post())
        .and(json_body::<RoomDraft>())
        .then(rooms::create_draft);

    let get = with_drafts(ctx.drafts())
        .and(warp::path!("api" / "drafts" / DraftId))
        .and(warp::get())
        .then(rooms::get_draft);

    let update = with_drafts(ctx.drafts())
        .and(warp::path!("api" / "drafts" / DraftId))
        .and(warp::put())
        .and(json_body::<RoomDraft>())
        .then(rooms::update_draft);

    let submit = with_drafts(ctx.drafts())
        .and(warp::path!("api" / "drafts" / DraftId / "submit"))
        .and(warp::post())
        .then(rooms::submit_draft);

    let delete = with_drafts(ctx.drafts())
        .and(warp::path!("api" / "drafts" / DraftId))
        .and(warp::delete())
        .then(rooms::delete_draft);

    let events = with_drafts(ctx.drafts())
        .and(warp::path!("api" / "drafts" / DraftId / "events"))
        .and(warp::get())
        .then(rooms::draft_events);

    preview
        .or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(submit)
        .unify()
        .or(delete)
        .unify()
        .or(events)
        .unify()
        .recover(handle_rejection)
        .unify()
}

fn with_drafts(
    drafts: Arc<DraftManager>,
) -> impl Filter<Extract = (Arc<DraftManager>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&drafts))
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let response = if err.is_not_found() {
        error_response(StatusCode::NOT_FOUND, "not_found", "Route not found".into())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        error_response(StatusCode::BAD_REQUEST, "invalid_body", e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        error_response(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", "Body too large".into())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        error_response(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Method not allowed".into())
    } else {
        tracing::error!(rejection = ?err, "unhandled rejection");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Unhandled request".into())
    };
    Ok(response)
}

pub struct WebServer {
    ctx: AppContext,
}

impl WebServer {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Binds and serves on the current tokio runtime.
    pub fn start(&self) -> Result<ServerHandle, ServerError> {
        let addr = self.ctx.config().socket_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (bound, server) = warp::serve(routes(&self.ctx))
            .try_bind_with_graceful_shutdown(addr, async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|err| ServerError::BindError(err.to_string()))?;

        let server_task = tokio::spawn(server);
        let sweep_every = self.ctx.config().draft_ttl().min(MAX_SWEEP_INTERVAL);
        let sweeper = spawn_sweeper(self.ctx.drafts(), sweep_every);
        tracing::info!(addr = %bound, "room preview service listening");

        Ok(ServerHandle {
            addr: bound,
            shutdown: Some(shutdown_tx),
            server_task,
            sweeper,
        })
    }
}

fn spawn_sweeper(drafts: Arc<DraftManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let expired = drafts.cleanup_expired_drafts();
            if !expired.is_empty() {
                tracing::info!(count = expired.len(), "expired idle drafts");
            }
        }
    })
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    server_task: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl ServerHandle {
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.sweeper.abort();
        let _ = (&mut self.server_task).await;
        tracing::info!(addr = %self.addr, "room preview service stopped");
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
