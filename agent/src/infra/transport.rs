//! Infrastructure implementation of the `HttpTransport` port over `ureq`.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::application::ports::{HttpResponse, HttpTransport};
use crate::domain::TransportError;

/// Blocking HTTP client with a resettable connection pool.
pub struct UreqTransport {
    connect_timeout: Duration,
    read_timeout: Duration,
    agent: Mutex<ureq::Agent>,
}

impl UreqTransport {
    #[must_use]
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            agent: Mutex::new(build_agent(connect_timeout, read_timeout)),
        }
    }

    fn current(&self) -> ureq::Agent {
        self.agent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn build_agent(connect_timeout: Duration, read_timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(connect_timeout)
        .timeout_read(read_timeout)
        .build()
}

fn read_body(url: &str, response: ureq::Response) -> Result<Option<String>, TransportError> {
    let body = response
        .into_string()
        .map_err(|e| TransportError::Unreachable {
            url: url.to_string(),
            reason: format!("reading response body: {e}"),
        })?;
    Ok(Some(body).filter(|b| !b.is_empty()))
}

impl HttpTransport for UreqTransport {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        match self.current().post(url).send_form(form) {
            Ok(response) => {
                let status = response.status();
                Ok(HttpResponse {
                    status,
                    body: read_body(url, response)?,
                })
            }
            Err(ureq::Error::Status(status, response)) => Ok(HttpResponse {
                status,
                body: read_body(url, response)?,
            }),
            Err(ureq::Error::Transport(t)) => Err(TransportError::Unreachable {
                url: url.to_string(),
                reason: t.to_string(),
            }),
        }
    }

    fn reset(&self) {
        tracing::debug!("resetting HTTP connection pool");
        *self.agent.lock().unwrap_or_else(PoisonError::into_inner) =
            build_agent(self.connect_timeout, self.read_timeout);
    }
}

