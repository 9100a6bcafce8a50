//! In-process coordinator serving the agent registration endpoint.
//!
//! Runs an axum router on a background tokio runtime. Each request pops
//! the next scripted reply and records the decoded form fields.

#![allow(clippy::expect_used, dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::Form;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use tokio::sync::oneshot;

pub const REGISTRATION_PATH: &str = "/admin/agent";

pub type SubmittedForm = Vec<(String, String)>;

pub fn pem(payload_b64: &str) -> String {
    format!("-----BEGIN CERTIFICATE-----\n{payload_b64}\n-----END CERTIFICATE-----\n")
}

pub fn issued_body() -> String {
    serde_json::json!({
        "certificateChain": [pem("AAEC"), pem("AwQF")],
        "notBefore": "2026-03-01T00:00:00Z",
    })
    .to_string()
}

pub fn pending_body() -> String {
    serde_json::json!({ "certificateChain": [] }).to_string()
}

/// Value of `name` in a submitted form.
pub fn field<'a>(form: &'a SubmittedForm, name: &str) -> Option<&'a str> {
    form.iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

struct Exchange {
    replies: VecDeque<(StatusCode, String)>,
    forms: Vec<SubmittedForm>,
}

type Shared = Arc<Mutex<Exchange>>;

async fn register(
    State(exchange): State<Shared>,
    Form(form): Form<SubmittedForm>,
) -> (StatusCode, String) {
    let mut exchange = exchange.lock().expect("lock");
    exchange.forms.push(form);
    exchange.replies.pop_front().unwrap_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        "no scripted reply left".to_string(),
    ))
}

pub struct FakeCoordinator {
    pub base_url: String,
    exchange: Shared,
    shutdown: Option<oneshot::Sender<()>>,
}

impl FakeCoordinator {
    /// Answer one request per body in `bodies`, in order, with HTTP 200.
    pub fn serving(bodies: Vec<String>) -> Self {
        Self::replying(bodies.into_iter().map(|body| (StatusCode::OK, body)).collect())
    }

    /// Answer requests with the given status and body pairs, in order.
    pub fn replying(replies: Vec<(StatusCode, String)>) -> Self {
        let exchange: Shared = Arc::new(Mutex::new(Exchange {
            replies: replies.into(),
            forms: Vec::new(),
        }));
        let router = Router::new()
            .route(REGISTRATION_PATH, post(register))
            .with_state(Arc::clone(&exchange));

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.set_nonblocking(true).expect("nonblocking");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        let (shutdown, stopped) = oneshot::channel::<()>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
                axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        let _ = stopped.await;
                    })
                    .await
                    .expect("serve");
            });
        });

        Self {
            base_url,
            exchange,
            shutdown: Some(shutdown),
        }
    }

    pub fn registration_url(&self) -> String {
        format!("{}{REGISTRATION_PATH}", self.base_url)
    }

    /// Forms received so far, in arrival order.
    pub fn forms(&self) -> Vec<SubmittedForm> {
        self.exchange.lock().expect("lock").forms.clone()
    }

    /// Stop serving and return every submitted form.
    pub fn finish(self) -> Vec<SubmittedForm> {
        self.forms()
    }
}

impl Drop for FakeCoordinator {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
