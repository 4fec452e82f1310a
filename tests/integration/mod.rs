//! Integration tests for the q-explore client
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod history_flow;
pub mod remote_merge;
