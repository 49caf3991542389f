//! Streaming chat client for the ProGear agent API.
//!
//! A turn is sent with `ChatClient::stream_chat`; the reply arrives as a
//! newline-delimited stream of `data: ` frames that are decoded
//! incrementally and dispatched to a `ChatStreamHandler`.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use progear_chat::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ChatError> {
//! let client = ChatClient::new(
//!     ClientConfig::from_env()?,
//!     Arc::new(StaticToken::from_env("PROGEAR_ID_TOKEN")),
//! )?;
//!
//! let mut callbacks = ChatCallbacks::new()
//!     .with_chunk(|text| print!("{text}"))
//!     .with_error(|err| eprintln!("error: {err}"));
//! client
//!     .stream_chat(&ChatRequest::new("What boots are in stock?"), &mut callbacks)
//!     .await;
//! # Ok(())
//! # }
//! ```

/// Companion account and health payloads.
pub mod access;
/// Identity token providers.
pub mod auth;
/// The API client.
pub mod client;
/// Inventory records and the `/api/inventory` calls.
pub mod inventory;
/// Client configuration.
pub mod config;
/// Public error types.
pub mod errors;
/// Wire framing for the chat event stream.
pub mod frame;
/// Chat request and response data types.
pub mod model;
/// Process-wide logging setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Stream events, handlers, and cancellation.
pub mod stream;
/// HTTP transport seam.
pub mod transport;

#[cfg(test)]
mod testing;

pub use access::{
    HealthStatus, InventoryAccess, SalesforceAccess, SalesforceStatus, UserAccess, UserGroups,
    UserInfo,
};
pub use auth::{AuthProvider, StaticToken, TokenStore};
pub use client::ChatClient;
pub use config::ClientConfig;
pub use errors::{ChatError, TransportError};
pub use inventory::{
    AlertQuery, AlertSeverity, InventoryAlert, MovementType, Product, ProductCategory,
    ProductQuery, StockAdjustment, StockMovement, StockStatus, StockSummary,
};
pub use model::{
    AgentInfo, AgentType, ChatMessage, ChatRequest, ChatResponse, MessageRole, ToolCallRecord,
    ToolCallStatus,
};
pub use observability::init_observability;
pub use stream::{
    AbortHandle, ChatCallbacks, ChatStreamHandler, EventLog, StreamEvent, StreamOutcome,
    consume_stream,
};
