//! Integration tests for shadowhunter.
//!
//! These tests drive full scans through the public API using mock platforms
//! and a scripted transport; nothing touches the network.

pub mod cli_tests;
pub mod full_run_tests;
pub mod output_tests;
pub mod platform_tests;
