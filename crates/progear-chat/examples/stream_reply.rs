use std::sync::Arc;

use progear_chat::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ChatError> {
    progear_chat::init_observability();
    let client = ChatClient::new(
        ClientConfig::from_env()?,
        Arc::new(StaticToken::from_env("PROGEAR_ID_TOKEN")),
    )?;

    let mut callbacks = ChatCallbacks::new()
        .with_tool_call(|call| eprintln!("[tool] {} ({:?})", call.effective_name(), call.status))
        .with_chunk(|text| print!("{text}"))
        .with_complete(|response| println!("\n-- {} / {}", response.agent.name, response.conversation_id))
        .with_error(|err| eprintln!("stream error: {err}"));

    let request = ChatRequest::new("Which hiking boots are low on stock?");
    request.validate()?;
    let outcome = client.stream_chat(&request, &mut callbacks).await;
    if !outcome.is_terminal() {
        eprintln!("stream ended early: {outcome:?}");
    }
    Ok(())
}
