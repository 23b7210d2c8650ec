//! # Transaction Execution
//!
//! Actions are dispatched by `(account, action)` to handler closures. A
//! handler sees the state database only through an [`ApplyContext`], which
//! limits reads to the transaction's declared scopes and writes to its
//! declared write scope.
//!
//! Each transaction runs inside its own undo session: on success the session
//! is squashed into the enclosing block session, on failure it is undone and
//! the transaction leaves no trace in state.

pub mod apply_context;
pub mod dispatcher;
pub mod system;

pub use apply_context::{ApplyContext, BlockContext};
pub use dispatcher::{ActionDispatcher, ActionHandler, TransactionOutcome};
pub use system::{onblock_transaction, setprods_transaction};
