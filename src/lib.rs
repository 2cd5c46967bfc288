//! eafsum - overlap-aware time accounting for tiered annotation files
//!
//! This library turns labeled time intervals on named tiers into per-tier
//! and per-combination durations, using a sweep-line over start/end events,
//! with optional masking/limiting tiers and a category sub-classification
//! pass driven by a configurable code table.

pub mod category;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod segment;
pub mod source;
pub mod sweep;
pub mod tiers;
