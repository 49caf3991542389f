use futures::StreamExt as _;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::errors::ChatError;
use crate::frame::{Decoded, FrameDecoder};
use crate::model::{ChatResponse, ToolCallRecord};
use crate::transport::ByteStream;

/// Decoded chat stream events, in wire order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text.
    Chunk { content: String },
    /// New or updated tool invocation.
    ToolCall { tool_call: ToolCallRecord },
    /// Terminal success payload. Nothing follows it.
    Complete { response: ChatResponse },
}

/// Receives the callbacks of one streamed chat turn.
///
/// `on_chunk` and `on_tool_call` fire zero or more times, in arrival order.
/// At most one of `on_complete` / `on_error` fires, and nothing fires after it.
pub trait ChatStreamHandler: Send {
    fn on_chunk(&mut self, content: String);
    fn on_tool_call(&mut self, tool_call: ToolCallRecord);
    fn on_complete(&mut self, response: ChatResponse);
    fn on_error(&mut self, error: ChatError);
}

/// How a streamed turn ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamOutcome {
    /// `on_complete` fired.
    Completed,
    /// `on_error` fired.
    Failed,
    /// The caller aborted; no terminal callback fired.
    Cancelled,
    /// The body ended without a `complete` frame; no terminal callback fired.
    Ended,
}

impl StreamOutcome {
    /// Whether a terminal callback was delivered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

type Callback<T> = Box<dyn FnMut(T) + Send>;

/// Closure-based handler. Unset callbacks do nothing.
pub struct ChatCallbacks {
    chunk: Callback<String>,
    tool_call: Callback<ToolCallRecord>,
    complete: Callback<ChatResponse>,
    error: Callback<ChatError>,
}

impl Default for ChatCallbacks {
    fn default() -> Self {
        Self {
            chunk: Box::new(|_| {}),
            tool_call: Box::new(|_| {}),
            complete: Box::new(|_| {}),
            error: Box::new(|_| {}),
        }
    }
}

impl ChatCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk(mut self, f: impl FnMut(String) + Send + 'static) -> Self {
        self.chunk = Box::new(f);
        self
    }

    pub fn with_tool_call(mut self, f: impl FnMut(ToolCallRecord) + Send + 'static) -> Self {
        self.tool_call = Box::new(f);
        self
    }

    pub fn with_complete(mut self, f: impl FnMut(ChatResponse) + Send + 'static) -> Self {
        self.complete = Box::new(f);
        self
    }

    pub fn with_error(mut self, f: impl FnMut(ChatError) + Send + 'static) -> Self {
        self.error = Box::new(f);
        self
    }
}

impl ChatStreamHandler for ChatCallbacks {
    fn on_chunk(&mut self, content: String) {
        (self.chunk)(content)
    }

    fn on_tool_call(&mut self, tool_call: ToolCallRecord) {
        (self.tool_call)(tool_call)
    }

    fn on_complete(&mut self, response: ChatResponse) {
        (self.complete)(response)
    }

    fn on_error(&mut self, error: ChatError) {
        (self.error)(error)
    }
}

/// Handler that records everything it receives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventLog {
    pub events: Vec<StreamEvent>,
    pub errors: Vec<ChatError>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenated chunk text.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            if let StreamEvent::Chunk { content } = event {
                out.push_str(content);
            }
        }
        out
    }

    /// Latest record per tool call id, in first-seen order.
    pub fn tool_calls(&self) -> Vec<ToolCallRecord> {
        let mut latest: Vec<ToolCallRecord> = Vec::new();
        for event in &self.events {
            if let StreamEvent::ToolCall { tool_call } = event {
                match latest.iter_mut().find(|t| t.id == tool_call.id) {
                    Some(slot) => *slot = tool_call.clone(),
                    None => latest.push(tool_call.clone()),
                }
            }
        }
        latest
    }

    /// The final response, when the stream completed.
    pub fn response(&self) -> Option<&ChatResponse> {
        self.events.iter().find_map(|event| match event {
            StreamEvent::Complete { response } => Some(response),
            _ => None,
        })
    }

    /// Number of terminal callbacks received (0 or 1 for a well-behaved client).
    pub fn terminal_count(&self) -> usize {
        self.errors.len()
            + self
                .events
                .iter()
                .filter(|e| matches!(e, StreamEvent::Complete { .. }))
                .count()
    }
}

impl ChatStreamHandler for EventLog {
    fn on_chunk(&mut self, content: String) {
        self.events.push(StreamEvent::Chunk { content });
    }

    fn on_tool_call(&mut self, tool_call: ToolCallRecord) {
        self.events.push(StreamEvent::ToolCall { tool_call });
    }

    fn on_complete(&mut self, response: ChatResponse) {
        self.events.push(StreamEvent::Complete { response });
    }

    fn on_error(&mut self, error: ChatError) {
        self.errors.push(error);
    }
}

/// Handle used to abort an in-flight stream.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Requests cancellation.
    ///
    /// The stream stops at its next read or dispatch point and fires no
    /// further callbacks.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }
}

pub(crate) struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once abort is requested. Never resolves if the handle is
    /// dropped without aborting.
    pub async fn aborted(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Reads `body` to the end, dispatching decoded frames to `handler`.
///
/// Transport read errors fire `on_error`. A `complete` frame fires
/// `on_complete` and stops reading. Bytes left without a trailing newline at
/// end of stream are discarded.
pub async fn consume_stream(
    body: ByteStream,
    handler: &mut dyn ChatStreamHandler,
    abort: Option<&AbortHandle>,
) -> StreamOutcome {
    let mut signal = abort.map(AbortHandle::signal);
    consume_with_signal(body, handler, signal.as_mut()).await
}

pub(crate) async fn consume_with_signal(
    mut body: ByteStream,
    handler: &mut dyn ChatStreamHandler,
    mut signal: Option<&mut AbortSignal>,
) -> StreamOutcome {
    let mut decoder = FrameDecoder::default();
    let mut dropped = 0_usize;
    loop {
        let next = match signal.as_deref_mut() {
            Some(signal) => {
                tokio::select! {
                    biased;
                    _ = signal.aborted() => {
                        debug!("stream aborted while waiting for data");
                        return StreamOutcome::Cancelled;
                    }
                    next = body.next() => next,
                }
            }
            None => body.next().await,
        };

        match next {
            Some(Ok(chunk)) => {
                for decoded in decoder.push_chunk(&chunk) {
                    if signal.as_deref().is_some_and(AbortSignal::is_aborted) {
                        debug!("stream aborted between frames");
                        return StreamOutcome::Cancelled;
                    }
                    match decoded {
                        Decoded::Event(StreamEvent::Chunk { content }) => handler.on_chunk(content),
                        Decoded::Event(StreamEvent::ToolCall { tool_call }) => {
                            trace!(tool_call_id = %tool_call.id, status = ?tool_call.status, "tool call frame");
                            handler.on_tool_call(tool_call)
                        }
                        Decoded::Event(StreamEvent::Complete { response }) => {
                            debug!(response_id = %response.id, dropped, "stream completed");
                            handler.on_complete(response);
                            return StreamOutcome::Completed;
                        }
                        Decoded::Done => trace!("done marker"),
                        Decoded::Dropped(err) => {
                            dropped += 1;
                            warn!(error = %err, "dropping undecodable frame");
                        }
                    }
                }
            }
            Some(Err(err)) => {
                if signal.as_deref().is_some_and(AbortSignal::is_aborted) {
                    return StreamOutcome::Cancelled;
                }
                warn!(error = %err, "stream read failed");
                handler.on_error(err.into());
                return StreamOutcome::Failed;
            }
            None => {
                if decoder.pending() > 0 {
                    debug!(
                        bytes = decoder.pending(),
                        "discarding unterminated data at end of stream"
                    );
                }
                warn!(dropped, "stream ended without a complete frame");
                return StreamOutcome::Ended;
            }
        }
    }
}
