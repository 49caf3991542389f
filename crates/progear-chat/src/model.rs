use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ChatError;

/// Longest message the API accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// One user turn sent to the chat API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User message text.
    pub message: String,
    /// Conversation to continue; the server starts a new one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    /// Creates a request that starts a new conversation.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
        }
    }

    /// Continues an existing conversation.
    pub fn conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Checks the message against the server's length limits.
    ///
    /// The streaming client does not call this; input validation belongs to
    /// whatever collects the message.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.message.trim().is_empty() {
            return Err(ChatError::Validation("message must not be empty".into()));
        }
        let chars = self.message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(ChatError::Validation(format!(
                "message is {chars} characters, limit is {MAX_MESSAGE_CHARS}"
            )));
        }
        Ok(())
    }
}

/// Which assistant produced a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Salesforce,
    Inventory,
    Orchestrator,
    Sales,
    Customer,
    General,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salesforce => "salesforce",
            Self::Inventory => "inventory",
            Self::Orchestrator => "orchestrator",
            Self::Sales => "sales",
            Self::Customer => "customer",
            Self::General => "general",
        }
    }
}

/// Assistant identity and the scopes it acted with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentType,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Lifecycle state of a tool invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    #[default]
    Pending,
    Running,
    Completed,
    #[serde(alias = "failed")]
    Error,
}

/// A tool invocation reported by the assistant.
///
/// Records are replaced wholesale when a later update with the same `id`
/// arrives; fields are never merged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Older servers send the name here instead of `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub status: ToolCallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
    /// Arbitrary tool output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(
        rename = "duration",
        alias = "duration_ms",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentType>,
}

impl ToolCallRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: ToolCallStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tool_name: None,
            status,
            arguments: None,
            result: None,
            duration_ms: None,
            error: None,
            agent: None,
        }
    }

    /// Name to display: `tool_name`, then `name`, then `unknown`.
    pub fn effective_name(&self) -> &str {
        self.tool_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(Some(self.name.as_str()).filter(|n| !n.is_empty()))
            .unwrap_or("unknown")
    }
}

/// Final assistant reply for one turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub message: String,
    pub agent: AgentInfo,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
    pub conversation_id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A stored message from a conversation's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps arrive either as RFC 3339 or as naive ISO-8601 UTC values
/// without an offset.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw).map(Some).map_err(serde::de::Error::custom)
    }

    fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn request_omits_absent_conversation_id() {
        let body = serde_json::to_value(ChatRequest::new("hi")).expect("serialize");
        assert_eq!(body, serde_json::json!({"message": "hi"}));

        let body = serde_json::to_value(ChatRequest::new("hi").conversation_id("c1"))
            .expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({"message": "hi", "conversation_id": "c1"})
        );
    }

    #[test]
    fn validate_rejects_blank_and_oversized_messages() {
        assert!(ChatRequest::new("show me leads").validate().is_ok());
        assert!(matches!(
            ChatRequest::new("   ").validate(),
            Err(ChatError::Validation(_))
        ));
        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(matches!(
            ChatRequest::new(long).validate(),
            Err(ChatError::Validation(msg)) if msg.contains("2000")
        ));
        assert!(ChatRequest::new("é".repeat(MAX_MESSAGE_CHARS)).validate().is_ok());
    }

    #[test]
    fn tool_call_accepts_server_dump_shape() {
        let raw = serde_json::json!({
            "id": "tc-9",
            "name": null,
            "tool_name": "check_stock",
            "status": "completed",
            "arguments": null,
            "result": {"products": []},
            "duration": 42,
            "error": null,
            "agent": "inventory"
        });
        let record: ToolCallRecord = serde_json::from_value(raw).expect("record");
        assert_eq!(record.effective_name(), "check_stock");
        assert_eq!(record.status, ToolCallStatus::Completed);
        assert_eq!(record.duration_ms, Some(42));
        assert_eq!(record.agent, Some(AgentType::Inventory));
        assert_eq!(record.result, Some(serde_json::json!({"products": []})));
    }

    #[test]
    fn tool_call_status_accepts_failed_alias() {
        let record: ToolCallRecord =
            serde_json::from_str(r#"{"id":"a","name":"x","status":"failed"}"#).expect("record");
        assert_eq!(record.status, ToolCallStatus::Error);
    }

    #[test]
    fn effective_name_falls_back_to_unknown() {
        let record = ToolCallRecord::new("a", "", ToolCallStatus::Pending);
        assert_eq!(record.effective_name(), "unknown");
        let record = ToolCallRecord::new("a", "get_leads", ToolCallStatus::Running);
        assert_eq!(record.effective_name(), "get_leads");
    }

    #[test]
    fn response_accepts_naive_and_offset_timestamps() {
        let naive: ChatResponse = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "message": "done",
            "agent": {"name": "Inventory Agent", "type": "inventory"},
            "conversation_id": "c1",
            "timestamp": "2025-01-15T10:30:00.123456"
        }))
        .expect("naive");
        let ts = naive.timestamp.expect("timestamp");
        assert_eq!(ts.hour(), 10);
        assert!(naive.tool_calls.is_empty());
        assert!(naive.agent.scopes.is_empty());

        let offset: ChatResponse = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "message": "done",
            "agent": {"name": "A", "type": "general", "scopes": ["inventory:read"]},
            "tool_calls": [],
            "conversation_id": "c1",
            "timestamp": "2025-01-15T10:30:00+02:00"
        }))
        .expect("offset");
        assert_eq!(offset.timestamp.expect("timestamp").hour(), 8);
        assert_eq!(offset.agent.kind, AgentType::General);
    }

    #[test]
    fn message_history_entry_parses() {
        let msg: ChatMessage = serde_json::from_value(serde_json::json!({
            "role": "assistant",
            "content": "Found 3 leads",
            "agent": "salesforce",
            "tool_calls": [{"id": "t", "name": "get_leads", "status": "completed"}]
        }))
        .expect("message");
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.tool_calls.as_ref().map(Vec::len), Some(1));
        assert!(msg.timestamp.is_none());
    }
}
