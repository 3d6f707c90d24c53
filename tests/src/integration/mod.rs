//! Cross-crate scenario coverage: each test drives `sim-driver`'s public
//! entry points the way `sim-cli` does, rather than poking at miner
//! internals directly.

pub mod scenarios;
