use crate::error::RequestError;
use crate::response::ResponsePayload;
use crate::state::Submission;
use anyhow::Result;
use course_studio_shared::{GenerateRequest, Operation, WireResponse};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use url::Url;

/// Outcome of one submission, delivered back to the event loop.
#[derive(Debug)]
pub struct Completion {
    pub seq: u64,
    pub operation: Operation,
    pub result: Result<ResponsePayload, RequestError>,
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    completions: mpsc::UnboundedSender<Completion>,
}

impl BackendClient {
    pub fn new(
        base_url: Url,
        timeout: Option<Duration>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Completion>)> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let (completions, completion_rx) = mpsc::unbounded_channel::<Completion>();

        let client = Self {
            http,
            base_url: with_trailing_slash(base_url),
            completions,
        };
        Ok((client, completion_rx))
    }

    pub fn endpoint_url(&self, operation: Operation) -> Result<Url, url::ParseError> {
        self.base_url.join(&operation.endpoint())
    }

    /// POSTs `request` to the operation's endpoint and decodes the field that
    /// operation consumes.
    pub async fn post(
        &self,
        operation: Operation,
        request: &GenerateRequest,
    ) -> Result<ResponsePayload, RequestError> {
        let url = self.endpoint_url(operation)?;

        debug!("POST {}", url);
        let response = self.http.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }

        let body = response.bytes().await?;
        debug!(
            "Received {} bytes for {}, reading '{}'",
            body.len(),
            operation,
            operation.response_field()
        );
        let wire = WireResponse::decode(operation, &body)?;
        Ok(ResponsePayload::from_wire(operation, wire))
    }

    /// Sends the submission on a background task; the result arrives on the
    /// completion channel returned by [`BackendClient::new`].
    pub fn dispatch(&self, submission: Submission) {
        let client = self.clone();
        tokio::spawn(async move {
            info!(
                "Submission {} -> {}",
                submission.seq,
                submission.operation.endpoint()
            );
            let result = client.post(submission.operation, &submission.request).await;
            let completion = Completion {
                seq: submission.seq,
                operation: submission.operation,
                result,
            };
            if client.completions.send(completion).is_err() {
                error!("Failed to deliver completion {}: receiver dropped", submission.seq);
            }
        });
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
