//! Action dispatch table.

use super::apply_context::{ApplyContext, BlockContext};
use super::system;
use crate::domain::errors::ExecutionResult;
use crate::ports::state_db::StateDatabase;
use shared_types::{ActionTrace, Name, ProducerKey, Transaction};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Handler for one `(account, action)` pair.
pub type ActionHandler = Arc<dyn Fn(&mut ApplyContext<'_>) -> ExecutionResult<()> + Send + Sync>;

/// Result of a successfully executed transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// One trace per action, context-free actions first.
    pub action_traces: Vec<ActionTrace>,
    /// Producer list proposed by a `setprods` action.
    pub proposed_producers: Option<Vec<ProducerKey>>,
}

/// Maps `(account, action)` to handlers.
///
/// Actions without a registered handler are accepted and do nothing, like
/// actions sent to an account that has no code.
#[derive(Clone, Default)]
pub struct ActionDispatcher {
    handlers: HashMap<(Name, Name), ActionHandler>,
}

impl ActionDispatcher {
    /// Dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the built-in system handlers registered.
    pub fn with_system_handlers() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(system::SYSTEM, system::ONBLOCK, system::on_block);
        dispatcher.register(system::SYSTEM, system::SETPRODS, system::set_prods);
        dispatcher
    }

    /// Register (or replace) the handler for `account::action`.
    pub fn register<F>(&mut self, account: Name, action: Name, handler: F)
    where
        F: Fn(&mut ApplyContext<'_>) -> ExecutionResult<()> + Send + Sync + 'static,
    {
        self.handlers.insert((account, action), Arc::new(handler));
    }

    /// Whether a handler is registered.
    pub fn has_handler(&self, account: Name, action: Name) -> bool {
        self.handlers.contains_key(&(account, action))
    }

    /// Run every action of `trx` inside a fresh undo session.
    ///
    /// The session is squashed into its parent on success and undone on
    /// failure.
    pub fn execute_transaction(
        &self,
        db: &mut dyn StateDatabase,
        trx: &Transaction,
        block: BlockContext,
    ) -> ExecutionResult<TransactionOutcome> {
        db.start_undo_session();
        match self.run_actions(db, trx, block) {
            Ok(outcome) => {
                db.squash()?;
                Ok(outcome)
            }
            Err(err) => {
                db.undo()?;
                Err(err)
            }
        }
    }

    fn run_actions(
        &self,
        db: &mut dyn StateDatabase,
        trx: &Transaction,
        block: BlockContext,
    ) -> ExecutionResult<TransactionOutcome> {
        let mut outcome = TransactionOutcome::default();
        let context_free = trx.context_free_actions.iter().map(|a| (a, true));
        let authorized = trx.actions.iter().map(|a| (a, false));

        for (act, is_context_free) in context_free.chain(authorized) {
            let mut ctx = ApplyContext::new(&mut *db, trx, act, block, is_context_free);
            match self.handlers.get(&(act.account, act.name)) {
                Some(handler) => handler(&mut ctx)?,
                None => debug!(account = %act.account, action = %act.name, "No handler; action ignored"),
            }

            let (console, proposed) = ctx.finish();
            if proposed.is_some() {
                outcome.proposed_producers = proposed;
            }
            outcome.action_traces.push(ActionTrace {
                receiver: act.account,
                act: act.clone(),
                console,
            });
        }
        Ok(outcome)
    }
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
