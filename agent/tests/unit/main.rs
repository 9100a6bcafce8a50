//! Unit tests for the fleet agent
//!
//! These tests use stubbed collaborators and temporary directories and run
//! without network access beyond loopback.

mod architecture;
#[path = "../support/fake_coordinator.rs"]
mod fake_coordinator;
mod transport;
