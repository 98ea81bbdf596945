//! Blocking HTTP transport backed by ureq.

use logbook_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};
use tracing::trace;

/// Executes requests with ureq. Status codes are returned as data so the
/// core client can normalize them; cookies are handled by the core's jar.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        trace!(method = req.method.as_str(), url = %req.url, "executing request");
        let result = match req.method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut builder = if req.method == HttpMethod::Get {
                    self.agent.get(&req.url)
                } else {
                    self.agent.delete(&req.url)
                };
                for (name, value) in &req.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Patch => {
                let mut builder = if req.method == HttpMethod::Post {
                    self.agent.post(&req.url)
                } else {
                    self.agent.patch(&req.url)
                };
                for (name, value) in &req.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}
