use std::io::{self, Write};
use std::path::Path;

use futures::stream;
use progear_chat::transport::ByteStream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, BufReader, Lines};
use tokio::sync::watch;
use progear_chat::{
    AbortHandle, ChatClient, ChatError, ChatRequest, ChatResponse, ChatStreamHandler,
    StreamEvent, StreamOutcome, ToolCallRecord, ToolCallStatus, TransportError, consume_stream,
};

/// Read size used when replaying a captured body, to exercise frame
/// reassembly the way a network read would.
const REPLAY_CHUNK_BYTES: usize = 512;

/// Prints one streamed turn to the terminal.
///
/// Assistant text goes to stdout; tool activity and errors go to stderr. In
/// JSON mode every event is one line on stdout.
pub struct TerminalRenderer {
    json: bool,
    conversation_id: Option<String>,
    error: Option<ChatError>,
}

impl TerminalRenderer {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            conversation_id: None,
            error: None,
        }
    }

    fn emit_json(&self, event: &StreamEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "failed to encode event"),
        }
    }
}

impl ChatStreamHandler for TerminalRenderer {
    fn on_chunk(&mut self, content: String) {
        if self.json {
            self.emit_json(&StreamEvent::Chunk { content });
            return;
        }
        print!("{content}");
        io::stdout().flush().ok();
    }

    fn on_tool_call(&mut self, tool_call: ToolCallRecord) {
        if self.json {
            self.emit_json(&StreamEvent::ToolCall { tool_call });
            return;
        }
        eprintln!("{}", describe_tool_call(&tool_call));
    }

    fn on_complete(&mut self, response: ChatResponse) {
        self.conversation_id = Some(response.conversation_id.clone());
        if self.json {
            self.emit_json(&StreamEvent::Complete { response });
            return;
        }
        println!();
        eprintln!(
            "-- {} · conversation {}",
            response.agent.name, response.conversation_id
        );
    }

    fn on_error(&mut self, error: ChatError) {
        if self.json {
            println!(
                "{}",
                serde_json::json!({
                    "type": "error",
                    "message": error.message(),
                    "status": error.status(),
                })
            );
        } else {
            eprintln!("\nError: {error}");
        }
        self.error = Some(error);
    }
}

fn describe_tool_call(call: &ToolCallRecord) -> String {
    let name = call.effective_name();
    match call.status {
        ToolCallStatus::Pending | ToolCallStatus::Running => format!("[tool] {name}..."),
        ToolCallStatus::Completed => match call.duration_ms {
            Some(ms) => format!("[tool] {name} done ({ms} ms)"),
            None => format!("[tool] {name} done"),
        },
        ToolCallStatus::Error => format!(
            "[tool] {name} failed: {}",
            call.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Ctrl-C presses for the whole session.
///
/// One listener feeds a press counter; callers wait for the next press
/// after the one they last saw.
pub struct Interrupts {
    presses: watch::Receiver<u64>,
}

impl Interrupts {
    /// Starts the session-wide Ctrl-C listener.
    pub fn listen() -> Self {
        let (tx, presses) = watch::channel(0);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                tx.send_modify(|n| *n += 1);
            }
        });
        Self { presses }
    }

    #[cfg(test)]
    fn manual() -> (watch::Sender<u64>, Self) {
        let (tx, presses) = watch::channel(0);
        (tx, Self { presses })
    }

    /// Resolves on the next press. Never resolves once the listener is gone.
    pub async fn next(&mut self) {
        self.presses.borrow_and_update();
        if self.presses.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Streams one turn, aborting it on Ctrl-C.
async fn stream_turn(
    client: &ChatClient,
    request: &ChatRequest,
    renderer: &mut TerminalRenderer,
    interrupts: &mut Interrupts,
) -> StreamOutcome {
    let abort = AbortHandle::new();
    let turn = client.stream_chat_with_abort(request, renderer, &abort);
    tokio::pin!(turn);
    tokio::select! {
        outcome = &mut turn => outcome,
        () = interrupts.next() => {
            abort.abort();
            turn.await
        }
    }
}

pub async fn single_message(
    client: &ChatClient,
    request: &ChatRequest,
    json: bool,
) -> Result<(), ChatError> {
    let mut interrupts = Interrupts::listen();
    let mut renderer = TerminalRenderer::new(json);
    let outcome = stream_turn(client, request, &mut renderer, &mut interrupts).await;
    finish(outcome, renderer)
}

fn finish(outcome: StreamOutcome, renderer: TerminalRenderer) -> Result<(), ChatError> {
    match (outcome, renderer.error) {
        (_, Some(err)) => Err(err),
        (StreamOutcome::Cancelled, None) => {
            eprintln!("\n(cancelled)");
            Ok(())
        }
        (StreamOutcome::Ended, None) => Err(ChatError::protocol(
            "stream closed before the reply was complete",
        )),
        _ => Ok(()),
    }
}

/// Prompt loop on stdin. `quit`, end of input, or Ctrl-C at the prompt
/// ends the session; Ctrl-C during a reply cancels only that reply.
pub async fn interactive_chat(
    client: &ChatClient,
    conversation_id: Option<String>,
    json: bool,
) -> io::Result<()> {
    println!("ProGear chat. Type 'quit' to exit.\n");
    let lines = BufReader::new(tokio::io::stdin()).lines();
    chat_loop(client, lines, Interrupts::listen(), conversation_id, json).await
}

async fn chat_loop<R>(
    client: &ChatClient,
    mut lines: Lines<R>,
    mut interrupts: Interrupts,
    mut conversation_id: Option<String>,
    json: bool,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = interrupts.next() => {
                println!();
                break;
            }
        };
        let Some(input) = line else {
            break;
        };
        let input = input.trim();
        if input.eq_ignore_ascii_case("quit") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let mut request = ChatRequest::new(input);
        if let Some(id) = &conversation_id {
            request = request.conversation_id(id.as_str());
        }
        if let Err(err) = request.validate() {
            eprintln!("{err}\n");
            continue;
        }

        println!();
        let mut renderer = TerminalRenderer::new(json);
        let outcome = stream_turn(client, &request, &mut renderer, &mut interrupts).await;
        if let Some(id) = renderer.conversation_id.take() {
            conversation_id = Some(id);
        }
        if outcome == StreamOutcome::Cancelled {
            eprintln!("\n(cancelled)");
        }
        println!();
    }

    println!("Goodbye!");
    Ok(())
}

/// Decodes a captured stream body from disk through the client decoder.
pub async fn replay(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let raw = tokio::fs::read(file).await?;
    let reads: Vec<_> = raw
        .chunks(REPLAY_CHUNK_BYTES)
        .map(|chunk| Ok::<_, TransportError>(bytes::Bytes::copy_from_slice(chunk)))
        .collect();
    let body: ByteStream = Box::pin(stream::iter(reads));

    let mut renderer = TerminalRenderer::new(json);
    let outcome = consume_stream(body, &mut renderer, None).await;
    tracing::info!(?outcome, bytes = raw.len(), "replay finished");
    finish(outcome, renderer)?;
    Ok(())
}
