use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument as _, debug, info, warn};

use crate::access::{
    HealthStatus, SalesforceConnectReply, SalesforceStatus, UserAccess, UserGroups, UserInfo,
};
use crate::auth::AuthProvider;
use crate::config::ClientConfig;
use crate::errors::{ChatError, GENERIC_REQUEST_FAILURE};
use crate::model::{ChatMessage, ChatRequest, ChatResponse};
use crate::stream::{AbortHandle, AbortSignal, ChatStreamHandler, StreamOutcome, consume_with_signal};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

const CHAT_PATH: &str = "/api/chat";
const CHAT_STREAM_PATH: &str = "/api/chat/stream";
const CHAT_AI_PATH: &str = "/api/chat/ai";
const USER_ME_PATH: &str = "/api/user/me";
const USER_ACCESS_PATH: &str = "/api/user/access";
const USER_GROUPS_PATH: &str = "/api/user/groups";
const SALESFORCE_CONNECT_PATH: &str = "/api/salesforce/connect";
const SALESFORCE_DISCONNECT_PATH: &str = "/api/salesforce/disconnect";
const SALESFORCE_STATUS_PATH: &str = "/api/salesforce/status";
const HEALTH_PATH: &str = "/health";

/// Client for the ProGear agent API.
///
/// Holds no per-call state, so one client can run any number of concurrent
/// turns; each stream owns its own decode buffer.
#[derive(Clone)]
pub struct ChatClient {
    config: ClientConfig,
    auth: Arc<dyn AuthProvider>,
    transport: Arc<dyn Transport>,
}

impl ChatClient {
    /// Creates a client that talks HTTP through `reqwest`.
    pub fn new(config: ClientConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, ChatError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, auth, Arc::new(transport)))
    }

    /// Creates a client over a caller-supplied transport.
    pub fn with_transport(
        config: ClientConfig,
        auth: Arc<dyn AuthProvider>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            auth,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends one chat turn to `/api/chat/stream` and drives `handler` as
    /// frames arrive.
    ///
    /// Never returns an error: failures are delivered through
    /// `handler.on_error`. The returned outcome tells the caller which
    /// terminal callback (if any) fired.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        handler: &mut dyn ChatStreamHandler,
    ) -> StreamOutcome {
        self.run_stream(request, handler, None).await
    }

    /// Like `stream_chat`, stopping early when `abort` is triggered.
    ///
    /// After an abort no further callbacks fire.
    pub async fn stream_chat_with_abort(
        &self,
        request: &ChatRequest,
        handler: &mut dyn ChatStreamHandler,
        abort: &AbortHandle,
    ) -> StreamOutcome {
        let mut signal = abort.signal();
        self.run_stream(request, handler, Some(&mut signal)).await
    }

    async fn run_stream(
        &self,
        request: &ChatRequest,
        handler: &mut dyn ChatStreamHandler,
        mut signal: Option<&mut AbortSignal>,
    ) -> StreamOutcome {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::debug_span!("chat_stream", %request_id);
        async {
            if signal.as_deref().is_some_and(AbortSignal::is_aborted) {
                return StreamOutcome::Cancelled;
            }

            let Some(token) = self.auth.identity_token().await else {
                debug!("no identity token; not sending request");
                handler.on_error(ChatError::Unauthenticated);
                return StreamOutcome::Failed;
            };

            let body = match serde_json::to_vec(request) {
                Ok(body) => body,
                Err(e) => {
                    handler.on_error(ChatError::protocol(format!("failed to encode request: {e}")));
                    return StreamOutcome::Failed;
                }
            };
            let headers = vec![
                ("Authorization".to_string(), format!("Bearer {token}")),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "text/event-stream".to_string()),
            ];
            let url = self.config.url(CHAT_STREAM_PATH);
            debug!(
                message_len = request.message.len(),
                conversation_id = request.conversation_id.as_deref().unwrap_or(""),
                "opening chat stream"
            );

            let sent = match signal.as_deref_mut() {
                Some(signal) => {
                    tokio::select! {
                        biased;
                        _ = signal.aborted() => return StreamOutcome::Cancelled,
                        sent = self.transport.post_stream(&url, headers, body) => sent,
                    }
                }
                None => self.transport.post_stream(&url, headers, body).await,
            };
            let response = match sent {
                Ok(response) => response,
                Err(err) => {
                    warn!(error = %err, "chat stream request failed");
                    handler.on_error(err.into());
                    return StreamOutcome::Failed;
                }
            };

            if !response.is_success() {
                let err = error_from_response(response).await;
                warn!(status = ?err.status(), error = %err, "chat stream rejected");
                handler.on_error(err);
                return StreamOutcome::Failed;
            }
            let Some(body) = response.body else {
                handler.on_error(ChatError::protocol("response has no readable body stream"));
                return StreamOutcome::Failed;
            };

            let outcome = consume_with_signal(body, handler, signal).await;
            info!(?outcome, "chat stream finished");
            outcome
        }
        .instrument(span)
        .await
    }

    /// Sends one chat turn to `/api/chat` and waits for the full response.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        self.post_json(&self.config.url(CHAT_PATH), Some(request)).await
    }

    /// Sends one chat turn to the model-backed `/api/chat/ai` route.
    pub async fn chat_ai(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        self.post_json(&self.config.url(CHAT_AI_PATH), Some(request)).await
    }

    /// `GET /api/user/me`.
    pub async fn user_info(&self) -> Result<UserInfo, ChatError> {
        self.get_json(&self.config.url(USER_ME_PATH)).await
    }

    /// `GET /api/user/access`.
    pub async fn user_access(&self) -> Result<UserAccess, ChatError> {
        self.get_json(&self.config.url(USER_ACCESS_PATH)).await
    }

    /// `GET /api/user/groups`.
    pub async fn user_groups(&self) -> Result<UserGroups, ChatError> {
        self.get_json(&self.config.url(USER_GROUPS_PATH)).await
    }

    /// Starts the Salesforce account link and returns the URL to open.
    pub async fn connect_salesforce(&self) -> Result<String, ChatError> {
        let reply: SalesforceConnectReply = self
            .post_json(&self.config.url(SALESFORCE_CONNECT_PATH), None::<&()>)
            .await?;
        reply
            .auth_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ChatError::protocol("connect response has no auth_url"))
    }

    /// Removes the Salesforce account link.
    pub async fn disconnect_salesforce(&self) -> Result<(), ChatError> {
        let response = self
            .send_authorized(HttpRequest::post(self.config.url(SALESFORCE_DISCONNECT_PATH)))
            .await?;
        // The success body is informational only.
        if let Err(err) = response.bytes().await {
            warn!(error = %err, "failed to read disconnect response body");
        }
        Ok(())
    }

    /// `GET /api/salesforce/status`.
    pub async fn salesforce_status(&self) -> Result<SalesforceStatus, ChatError> {
        self.get_json(&self.config.url(SALESFORCE_STATUS_PATH)).await
    }

    /// Stored messages of a conversation, oldest first.
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        require_id("conversation id", conversation_id)?;
        let url = self.endpoint(&["api", "conversations", conversation_id, "messages"], &[])?;
        self.get_json(&url).await
    }

    /// `GET /health`. Does not require a token.
    pub async fn health(&self) -> Result<HealthStatus, ChatError> {
        let request = HttpRequest::get(self.config.url(HEALTH_PATH)).timeout(self.config.timeout);
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(error_from_response(response).await);
        }
        response.json().await
    }

    /// Builds a URL from raw path segments (each percent-encoded) and query
    /// pairs.
    pub(crate) fn endpoint(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<String, ChatError> {
        let mut url = reqwest::Url::parse(self.config.base_url.trim())
            .map_err(|e| ChatError::Config(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ChatError::Config("base URL cannot take a path".into()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url.into())
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ChatError> {
        self.send_authorized(HttpRequest::get(url))
            .await?
            .json()
            .await
    }

    pub(crate) async fn post_json<T, B>(&self, url: &str, body: Option<&B>) -> Result<T, ChatError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = HttpRequest::post(url);
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ChatError::protocol(format!("failed to encode request: {e}")))?;
            request = request
                .header("Content-Type", "application/json")
                .body(bytes);
        }
        self.send_authorized(request).await?.json().await
    }

    /// Attaches the bearer token and timeout, sends, and maps failure statuses.
    async fn send_authorized(&self, request: HttpRequest) -> Result<HttpResponse, ChatError> {
        let token = self
            .auth
            .identity_token()
            .await
            .ok_or(ChatError::Unauthenticated)?;
        let request = request
            .header("Authorization", format!("Bearer {token}"))
            .timeout(self.config.timeout);
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response)
    }
}

/// Rejects blank identifiers before they reach a URL path.
pub(crate) fn require_id(kind: &str, value: &str) -> Result<(), ChatError> {
    if value.trim().is_empty() {
        return Err(ChatError::Validation(format!("{kind} must not be empty")));
    }
    Ok(())
}

/// Maps a failed response to `ChatError::Http`, using the body's `detail`
/// when there is one.
async fn error_from_response(response: HttpResponse) -> ChatError {
    let status = response.status;
    let message = match response.bytes().await {
        Ok(bytes) => detail_message(&bytes),
        Err(err) => {
            warn!(status, error = %err, "failed to read error body");
            None
        }
    };
    ChatError::http(
        status,
        message.unwrap_or_else(|| GENERIC_REQUEST_FAILURE.to_string()),
    )
}

fn detail_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "error body is not JSON");
            return None;
        }
    };
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) if text.is_empty() => None,
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
