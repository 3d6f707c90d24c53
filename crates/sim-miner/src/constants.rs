//! Numerical constants shared by every miner.

/// Aggregate block production rate across the whole network, per second.
/// One block every 600 virtual seconds (10 minutes), mirroring Bitcoin.
pub const BLOCK_RATE: f64 = 1.0 / 600.0;

/// Payload verification throughput, bytes per second.
pub const VERIFY_RATE: f64 = 200.0 * 1024.0;

/// Upper bound (exclusive) of the uniform block-size distribution, bytes.
pub const MAX_BLOCK_SIZE: f64 = 200.0 * 1024.0;

/// Symmetric link propagation delay used by the driver, seconds.
pub const LINK_DELAY: f64 = 0.02;
