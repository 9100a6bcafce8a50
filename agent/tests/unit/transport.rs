//! Tests for `UreqTransport` against an in-process coordinator.

#![allow(clippy::expect_used)]

use std::time::Duration;

use axum::http::StatusCode;
use fleet_agent::application::ports::HttpTransport;
use fleet_agent::domain::TransportError;
use fleet_agent::infra::UreqTransport;

use crate::fake_coordinator::{FakeCoordinator, field, pending_body};

fn transport() -> UreqTransport {
    UreqTransport::new(Duration::from_secs(2), Duration::from_secs(2))
}

#[test]
fn test_post_form_encodes_fields_and_returns_body() {
    let coordinator = FakeCoordinator::serving(vec![pending_body()]);
    let response = transport()
        .post_form(
            &coordinator.registration_url(),
            &[("hostname", "builder 1"), ("uuid", "abc")],
        )
        .expect("post");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, Some(pending_body()));

    let forms = coordinator.finish();
    assert_eq!(forms.len(), 1);
    assert_eq!(field(&forms[0], "hostname"), Some("builder 1"));
    assert_eq!(field(&forms[0], "uuid"), Some("abc"));
}

#[test]
fn test_error_status_is_returned_not_raised() {
    let coordinator =
        FakeCoordinator::replying(vec![(StatusCode::FORBIDDEN, "nope".to_string())]);
    let response = transport()
        .post_form(&coordinator.registration_url(), &[])
        .expect("post");

    assert_eq!(response.status, 403);
    assert_eq!(response.body.as_deref(), Some("nope"));
}

#[test]
fn test_empty_entity_is_none() {
    let coordinator = FakeCoordinator::serving(vec![String::new()]);
    let response = transport()
        .post_form(&coordinator.registration_url(), &[])
        .expect("post");

    assert_eq!(response.status, 200);
    assert!(response.body.is_none());
}

#[test]
fn test_reset_keeps_transport_usable() {
    let coordinator = FakeCoordinator::serving(vec![pending_body(), pending_body()]);
    let transport = transport();
    transport
        .post_form(&coordinator.registration_url(), &[])
        .expect("first post");
    transport.reset();
    transport
        .post_form(&coordinator.registration_url(), &[])
        .expect("post after reset");
    assert_eq!(coordinator.finish().len(), 2);
}

#[test]
fn test_refused_connection_is_unreachable() {
    let url = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        format!("http://{}/admin/agent", listener.local_addr().expect("addr"))
    };
    let transport = transport();
    let err = transport.post_form(&url, &[]).expect_err("refused");
    assert!(matches!(err, TransportError::Unreachable { .. }));
    transport.reset();
    assert!(transport.post_form(&url, &[]).is_err());
}
