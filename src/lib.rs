// ABOUTME: Library root for tandem - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ops;
pub mod output;
pub mod pipeline;
pub mod types;
