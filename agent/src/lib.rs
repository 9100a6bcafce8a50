//! Fleet agent library — registration and certificate lifecycle, exposed for
//! integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod commands;
pub mod domain;
pub mod infra;
