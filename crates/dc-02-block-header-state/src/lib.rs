//! # dc-02-block-header-state
//!
//! Chain metadata immediately after a block is appended, and the rules for
//! extending it.
//!
//! ## Overview
//!
//! - **`generate_next`**: template for the next block in a given slot
//!   (producer, schedule version, irreversibility, Merkle accumulator,
//!   schedule promotion).
//! - **`next`**: validates a concrete signed header against that template.
//!   A header whose producer, schedule version or signing key disagrees with
//!   the template is rejected; there is no tie-break.
//! - **`calc_dpos_last_irreversible`**: quorum statistic over the last block
//!   each active producer built.
//! - **`add_confirmation`**: one signed endorsement per active producer.
//!
//! ## Lifecycle
//!
//! ```text
//! parent ──generate_next(when)──▶ template ──set roots / sign──▶ produced state
//!    │
//!    └────────next(signed header)──────────────────────────────▶ validated state
//! ```
//!
//! Each transition returns a new value; a parent is never modified, so
//! competing forks can hold their own header states side by side.

pub mod config;
pub mod error;
pub mod header_state;
pub mod irreversibility;

pub use config::ConsensusParams;
pub use error::{HeaderStateError, HeaderStateResult};
pub use header_state::BlockHeaderState;
pub use irreversibility::{calc_dpos_last_irreversible, lib_index};
