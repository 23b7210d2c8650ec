//! # Delegate-Chain Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Test network: genesis, nodes, transfers
//! └── integration/       # Cross-crate flows
//!     ├── production.rs
//!     ├── fork_switching.rs
//!     ├── schedule_promotion.rs
//!     ├── restart_replay.rs
//!     └── scheduling.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dc-tests
//! cargo test -p dc-tests integration::fork_switching
//! cargo bench -p dc-tests
//! ```

pub mod fixtures;
pub mod integration;
