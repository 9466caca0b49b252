use std::time::Duration;

use serde_json::Value;

const BODY_EXCERPT_CHARS: usize = 240;

#[derive(Debug, thiserror::Error)]
pub(crate) enum HttpError {
    #[error("{}", describe_status(.status, .excerpt))]
    Status { status: u16, excerpt: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response decode failed: {0}")]
    Decode(String),
}

fn describe_status(status: &u16, excerpt: &str) -> String {
    if excerpt.is_empty() {
        format!("HTTP status {status}")
    } else {
        format!("HTTP status {status} ({excerpt})")
    }
}

/// Blocking HTTP transport. Requests are issued once; callers decide what a
/// failure means.
#[derive(Clone)]
pub(crate) struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub(crate) fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .timeout_write(read_timeout)
            .build();
        Self { agent }
    }

    pub(crate) fn post_json(&self, url: &str, body: &Value) -> Result<String, HttpError> {
        let response = self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
            .map_err(classify)?;
        response
            .into_string()
            .map_err(|err| HttpError::Decode(err.to_string()))
    }

    pub(crate) fn put_bytes(
        &self,
        url: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), HttpError> {
        self.agent
            .put(url)
            .set("Content-Type", content_type)
            .send_bytes(bytes)
            .map_err(classify)?;
        Ok(())
    }
}

fn classify(err: ureq::Error) -> HttpError {
    match err {
        ureq::Error::Status(status, response) => {
            let response_body = response.into_string().ok().unwrap_or_default();
            let excerpt = response_body
                .trim()
                .chars()
                .take(BODY_EXCERPT_CHARS)
                .collect::<String>();
            HttpError::Status { status, excerpt }
        }
        ureq::Error::Transport(err) => HttpError::Transport(err.to_string()),
    }
}
