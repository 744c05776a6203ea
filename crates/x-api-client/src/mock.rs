use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays queued responses and records every request it receives
///
/// Clones share state, so a test can keep a handle after moving one into
/// an [`crate::ApiClient`].
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 response with the given body
    pub fn respond_ok(&self, body: impl Into<String>) -> &Self {
        self.push(Ok(HttpResponse::ok(body)))
    }

    pub fn respond_status(&self, status: u16, body: impl Into<String>) -> &Self {
        self.push(Ok(HttpResponse {
            status,
            body: body.into(),
        }))
    }

    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.push(Err(TransportError(message.into())))
    }

    fn push(&self, response: Result<HttpResponse, TransportError>) -> &Self {
        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .push(request);

        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError(format!("no mock response queued for {}", url))))
    }
}
