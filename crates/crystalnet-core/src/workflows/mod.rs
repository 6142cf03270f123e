//! # Workflows Module
//!
//! High-level entry points that tie the `core` models and the `engine`
//! together into complete analyses.
//!
//! - **Crystal Analysis** ([`analyze`]) - Load a crystal, perceive its periodic
//!   connectivity, extract molecules, find molecular neighbors and reduce the
//!   resulting dimers to symmetry-unique representatives.
//!
//! Each workflow reports its phases through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter) and returns a
//! single result value that owns everything it computed.

pub mod analyze;
