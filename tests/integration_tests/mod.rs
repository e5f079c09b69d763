//! Integration tests module
//!
//! End-to-end tests for the meetpulse analytics pipeline, including:
//! - Transcript parsing → scoring → risk → trends
//! - Concurrent batches over a shared history store
//! - Error handling for invalid input

pub mod batch_test;
pub mod error_scenarios;
pub mod fixtures;
pub mod pipeline_test;
