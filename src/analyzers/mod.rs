//! Historical detection analysis.
//!
//! Raw detections are filtered to a date window, then bucketed by calendar
//! day or hour of day. Numeric fields are averaged (rounded), categorical
//! fields reduced to their mode.

pub mod aggregate;
pub mod analyzer;
pub mod levels;
pub mod types;
pub mod utility;
