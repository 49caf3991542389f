use std::sync::Arc;

use progear_chat::prelude::*;
use progear_chat::EventLog;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ChatError> {
    let client = ChatClient::new(
        ClientConfig::from_env()?,
        Arc::new(StaticToken::from_env("PROGEAR_ID_TOKEN")),
    )?;

    let mut log = EventLog::new();
    client
        .stream_chat(&ChatRequest::new("Show my open Salesforce leads"), &mut log)
        .await;
    if let Some(err) = log.errors.first() {
        return Err(err.clone());
    }

    println!("{}", log.text());
    for call in log.tool_calls() {
        println!("tool {}: {:?}", call.effective_name(), call.status);
    }
    Ok(())
}
