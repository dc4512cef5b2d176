//! Testing utilities
//!
//! Available to unit tests and, behind the `testing` feature, to
//! integration tests. The centerpiece is [`StubTransport`], a scriptable
//! [`HttpTransport`] that records every request so tests can assert call
//! counts, request contents, and the absence of cross-talk between
//! concurrent exchanges.

use crate::transport::{HttpTransport, TransportError, TransportResponse, REQUEST_TIMEOUT};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply from the stub.
#[derive(Debug)]
pub enum StubReply {
    /// Answer immediately with this response.
    Response(TransportResponse),
    /// Answer with this response after a delay.
    Delayed(Duration, TransportResponse),
    /// Fail with a non-timeout transport error.
    Network(String),
    /// Never answer; the stub's deadline turns this into a timeout.
    Hang,
}

/// A 200 reply with the given body.
#[must_use]
pub fn ok_json(body: &str) -> StubReply {
    StubReply::Response(TransportResponse::new(200, body))
}

/// A reply with an explicit status and body.
#[must_use]
pub fn status(code: u16, body: &str) -> StubReply {
    StubReply::Response(TransportResponse::new(code, body))
}

/// Everything a provider sent through the stub, as owned strings.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of a form parameter, if the request carried it.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a header, if the request carried it.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

type Responder = dyn Fn(&RecordedRequest) -> StubReply + Send + Sync;

/// Scriptable transport stub with request recording and a configurable
/// deadline emulating the real client timeout.
pub struct StubTransport {
    responder: Box<Responder>,
    deadline: Duration,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubTransport {
    /// Stub whose replies are computed from the incoming request.
    pub fn respond_with(
        responder: impl Fn(&RecordedRequest) -> StubReply + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            deadline: REQUEST_TIMEOUT,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Stub that plays back replies in order, one per request. Requests past
    /// the end of the script fail with a network error.
    #[must_use]
    pub fn sequence(replies: Vec<StubReply>) -> Self {
        let script = Mutex::new(VecDeque::from(replies));
        Self::respond_with(move |_| {
            script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| StubReply::Network("no scripted reply left".to_string()))
        })
    }

    /// Override the stub's deadline (defaults to the production
    /// `REQUEST_TIMEOUT`).
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Every request seen so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    async fn dispatch(
        &self,
        request: RecordedRequest,
    ) -> Result<TransportResponse, TransportError> {
        let reply = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);

        let answer = async move {
            match reply {
                StubReply::Response(response) => Ok(response),
                StubReply::Delayed(delay, response) => {
                    tokio::time::sleep(delay).await;
                    Ok(response)
                }
                StubReply::Network(detail) => Err(TransportError::Network(detail)),
                StubReply::Hang => std::future::pending().await,
            }
        };

        (tokio::time::timeout(self.deadline, answer).await)
            .unwrap_or(Err(TransportError::Timeout))
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        self.dispatch(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            params: params
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect(),
            headers: headers
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect(),
        })
        .await
    }

    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        self.dispatch(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            params: Vec::new(),
            headers: headers
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect(),
        })
        .await
    }
}
