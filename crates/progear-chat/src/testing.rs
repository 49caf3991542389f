//! In-memory transport shared by the client unit tests.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::stream;

use crate::auth::{AuthProvider, StaticToken};
use crate::client::ChatClient;
use crate::config::ClientConfig;
use crate::errors::TransportError;
use crate::transport::{ByteStream, HttpRequest, HttpResponse, Transport};

pub(crate) enum Reply {
    /// Status plus body delivered as the given reads.
    Chunks(u16, Vec<&'static str>),
    /// Status plus a body whose read fails after the given bytes.
    Broken(u16, &'static str),
    NoBody(u16),
    Fail(TransportError),
    Pending,
}

pub(crate) struct FakeTransport {
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
    reply: Reply,
}

impl FakeTransport {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("a request was sent")
    }

    /// Body of the last request parsed as JSON.
    pub fn last_json(&self) -> serde_json::Value {
        let request = self.last_request();
        serde_json::from_slice(request.body.as_deref().expect("body")).expect("json body")
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().expect("lock").push(request);
        match &self.reply {
            Reply::Chunks(status, chunks) => {
                let body: ByteStream = Box::pin(stream::iter(
                    chunks
                        .clone()
                        .into_iter()
                        .map(|c| Ok(bytes::Bytes::from_static(c.as_bytes()))),
                ));
                Ok(HttpResponse::new(*status, Some(body)))
            }
            Reply::Broken(status, head) => {
                let body: ByteStream = Box::pin(stream::iter(vec![
                    Ok(bytes::Bytes::from_static(head.as_bytes())),
                    Err(TransportError::Read("connection reset".into())),
                ]));
                Ok(HttpResponse::new(*status, Some(body)))
            }
            Reply::NoBody(status) => Ok(HttpResponse::new(*status, None)),
            Reply::Fail(err) => Err(err.clone()),
            Reply::Pending => std::future::pending().await,
        }
    }
}

/// Client against `http://api.test/` over `transport`.
pub(crate) fn client(transport: Arc<FakeTransport>, token: Option<&str>) -> ChatClient {
    let auth: Arc<dyn AuthProvider> = match token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => Arc::new(StaticToken::none()),
    };
    ChatClient::with_transport(ClientConfig::new("http://api.test/"), auth, transport)
}
