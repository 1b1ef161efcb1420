//! Batch accuracy evaluation pipeline.
//!
//! This module provides:
//! - Per-item evaluation combining preprocessing, OCR, and scoring
//! - Batch coordination across a fixed worker pool
//! - Bucketed aggregation of outcomes into a summary

pub mod aggregate;
pub mod item;
pub mod runner;

pub use aggregate::{BatchSummary, Bucket, BucketCounts, aggregate};
pub use item::{DiscrepancyRecord, ErrorRecord, ItemOutcome, NoPlateRecord, evaluate_item};
pub use runner::{BatchResult, run_batch};
