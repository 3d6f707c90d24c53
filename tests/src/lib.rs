//! # Simulator Test Suite
//!
//! Unified test crate containing cross-crate integration coverage.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/   # Whole scenarios driven end to end against sim-driver
//! ```
//!
//! ## Running
//!
//! ```bash
//! cargo test -p sim-tests
//! ```

pub mod integration;
