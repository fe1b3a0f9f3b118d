//! Tracking module
//!
//! Signal conditioning for detector landmarks:
//! - landmark data model
//! - One-Euro filters keyed by channel
//! - face/body metric extraction and face candidate selection
//! - the per-frame pipeline, and the UDP receiver that feeds it

pub mod filter;
pub mod landmarks;
pub mod metrics;
pub mod pipeline;
pub mod receiver;
pub mod selector;
pub mod stats;
