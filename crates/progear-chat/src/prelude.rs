//! Common imports for typical client usage.
pub use crate::{
    AbortHandle, AgentType, AuthProvider, ChatCallbacks, ChatClient, ChatError, ChatRequest,
    ChatResponse, ChatStreamHandler, ClientConfig, StaticToken, StreamOutcome, ToolCallRecord,
    ToolCallStatus,
};
