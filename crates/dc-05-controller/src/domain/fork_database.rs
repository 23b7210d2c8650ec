//! # Fork Database
//!
//! Every known reversible block, on every fork, rooted at the last
//! irreversible block.
//!
//! ## Layout
//!
//! Block states live in an arena of slots; `index` maps a block id to its
//! slot and each slot records its children. Blocks refer to their parent by
//! id only, so removing a subtree never leaves a dangling owner.
//!
//! ## Head Selection
//!
//! The head is the block with the greatest
//! `(dpos_irreversible_blocknum, bft_irreversible_blocknum, block_num)`.
//! On a tie the current head is kept.

use crate::domain::errors::{ForkDbError, ForkDbResult};
use dc_03_block_state::BlockState;
use shared_types::{BlockId, BlockNum, BlockTrace, HeaderConfirmation};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

struct Node {
    state: Arc<BlockState>,
    children: Vec<usize>,
}

/// Head-selection key.
fn rank(state: &BlockState) -> (BlockNum, BlockNum, BlockNum) {
    let hs = &state.header_state;
    (
        hs.dpos_irreversible_blocknum,
        hs.bft_irreversible_blocknum,
        hs.block_num,
    )
}

/// Arena of reversible block states.
pub struct ForkDatabase {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    index: HashMap<BlockId, usize>,
    root: Arc<BlockState>,
    head: Arc<BlockState>,
}

impl ForkDatabase {
    /// Fork database rooted at `root`, which is also the head.
    pub fn new(root: BlockState) -> Self {
        let root = Arc::new(root);
        let mut db = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            root: Arc::clone(&root),
            head: Arc::clone(&root),
        };
        db.insert(root);
        db
    }

    /// Root (last irreversible block).
    pub fn root(&self) -> Arc<BlockState> {
        Arc::clone(&self.root)
    }

    /// Preferred head.
    pub fn head(&self) -> Arc<BlockState> {
        Arc::clone(&self.head)
    }

    /// Number of blocks held, root included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Never true: the root is always present.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `id` is known.
    pub fn contains(&self, id: &BlockId) -> bool {
        self.index.contains_key(id)
    }

    /// Block state for `id`.
    pub fn get(&self, id: &BlockId) -> Option<Arc<BlockState>> {
        self.node(id).map(|n| Arc::clone(&n.state))
    }

    /// Block numbered `block_num` on the branch ending at `tip`.
    pub fn search_on_branch(&self, tip: &BlockId, block_num: BlockNum) -> Option<Arc<BlockState>> {
        let mut current = self.get(tip)?;
        while current.block_num() > block_num {
            current = self.get(&current.previous())?;
        }
        (current.block_num() == block_num).then_some(current)
    }

    /// Link `state` under its parent and return it.
    pub fn add(&mut self, state: BlockState) -> ForkDbResult<Arc<BlockState>> {
        let id = state.id();
        if self.index.contains_key(&id) {
            return Err(ForkDbError::DuplicateBlock { id });
        }
        let parent = *self
            .index
            .get(&state.previous())
            .ok_or(ForkDbError::UnlinkableBlock {
                id,
                previous: state.previous(),
            })?;

        let state = Arc::new(state);
        let slot = self.insert(Arc::clone(&state));
        if let Some(node) = self.slot_mut(parent) {
            node.children.push(slot);
        }

        if rank(&state) > rank(&self.head) {
            self.head = Arc::clone(&state);
        }

        debug!(
            block_num = state.block_num(),
            head = self.head.block_num(),
            blocks = self.len(),
            "Block added to fork database"
        );
        Ok(state)
    }

    /// Both branches from `first` and `second` back to their common
    /// ancestor, tip first, ancestor excluded.
    pub fn fetch_branch_from(
        &self,
        first: &BlockId,
        second: &BlockId,
    ) -> ForkDbResult<(Vec<Arc<BlockState>>, Vec<Arc<BlockState>>)> {
        let lookup = |id: &BlockId| self.get(id).ok_or(ForkDbError::UnknownBlock { id: *id });

        let mut a = lookup(first)?;
        let mut b = lookup(second)?;
        let mut first_branch = Vec::new();
        let mut second_branch = Vec::new();

        while a.block_num() > b.block_num() {
            let previous = a.previous();
            first_branch.push(a);
            a = lookup(&previous)?;
        }
        while b.block_num() > a.block_num() {
            let previous = b.previous();
            second_branch.push(b);
            b = lookup(&previous)?;
        }
        while a.id() != b.id() {
            let (pa, pb) = (a.previous(), b.previous());
            first_branch.push(a);
            second_branch.push(b);
            a = lookup(&pa)?;
            b = lookup(&pb)?;
        }

        Ok((first_branch, second_branch))
    }

    /// Blocks from just after the root up to `tip`, oldest first.
    pub fn branch_from_root(&self, tip: &BlockId) -> ForkDbResult<Vec<Arc<BlockState>>> {
        let root = self.root.id();
        let (mut branch, _) = self.fetch_branch_from(tip, &root)?;
        branch.reverse();
        Ok(branch)
    }

    /// Store the execution trace of an applied block and mark it valid.
    pub fn mark_applied(&mut self, id: &BlockId, trace: BlockTrace) -> ForkDbResult<Arc<BlockState>> {
        self.update(id, |state| {
            state.trace = trace;
            state.validated = true;
        })?;
        self.get(id).ok_or(ForkDbError::UnknownBlock { id: *id })
    }

    /// Record a producer confirmation.
    ///
    /// Once more than two thirds of the active producers confirmed a block,
    /// it and all its descendants become BFT-irreversible.
    pub fn add_confirmation(&mut self, conf: HeaderConfirmation) -> ForkDbResult<Arc<BlockState>> {
        let id = conf.block_id;
        let slot = *self.index.get(&id).ok_or(ForkDbError::UnknownBlock { id })?;

        let mut state = self.state_at(slot).ok_or(ForkDbError::UnknownBlock { id })?;
        Arc::make_mut(&mut state).header_state.add_confirmation(conf)?;
        self.replace(slot, Arc::clone(&state));

        if state.header_state.has_confirmation_quorum() {
            let bft = state.block_num();
            info!(block_num = bft, "Block reached BFT confirmation quorum");
            for descendant in self.subtree(slot) {
                if let Some(mut current) = self.state_at(descendant) {
                    if current.header_state.bft_irreversible_blocknum < bft {
                        Arc::make_mut(&mut current).header_state.bft_irreversible_blocknum = bft;
                        self.replace(descendant, current);
                    }
                }
            }
            self.select_head();
        }

        self.get(&id).ok_or(ForkDbError::UnknownBlock { id })
    }

    /// Make `new_root` the root, dropping every block that is not its
    /// descendant. Returns the number of blocks removed.
    pub fn prune(&mut self, new_root: &BlockId) -> ForkDbResult<usize> {
        let slot = *self
            .index
            .get(new_root)
            .ok_or(ForkDbError::UnknownBlock { id: *new_root })?;

        let keep: std::collections::HashSet<usize> = self.subtree(slot).into_iter().collect();
        let doomed: Vec<usize> = self
            .index
            .values()
            .copied()
            .filter(|s| !keep.contains(s))
            .collect();
        for s in &doomed {
            self.release(*s);
        }

        if let Some(root) = self.state_at(slot) {
            self.root = root;
        }
        if !self.index.contains_key(&self.head.id()) {
            self.select_head();
        }

        debug!(
            root = self.root.block_num(),
            removed = doomed.len(),
            remaining = self.len(),
            "Fork database pruned"
        );
        Ok(doomed.len())
    }

    /// Remove `id` and all its descendants.
    pub fn remove(&mut self, id: &BlockId) -> ForkDbResult<Vec<BlockId>> {
        if *id == self.root.id() {
            return Err(ForkDbError::RemoveRoot { id: *id });
        }
        let slot = *self.index.get(id).ok_or(ForkDbError::UnknownBlock { id: *id })?;
        let previous = self
            .state_at(slot)
            .map(|s| s.previous())
            .ok_or(ForkDbError::UnknownBlock { id: *id })?;

        let doomed = self.subtree(slot);
        let removed: Vec<BlockId> = doomed
            .iter()
            .filter_map(|s| self.state_at(*s).map(|st| st.id()))
            .collect();
        for s in doomed {
            self.release(s);
        }
        if let Some(parent) = self.index.get(&previous).copied() {
            if let Some(node) = self.slot_mut(parent) {
                node.children.retain(|c| *c != slot);
            }
        }

        if removed.contains(&self.head.id()) {
            self.select_head();
        }
        Ok(removed)
    }

    fn node(&self, id: &BlockId) -> Option<&Node> {
        let slot = *self.index.get(id)?;
        self.nodes.get(slot)?.as_ref()
    }

    fn slot_mut(&mut self, slot: usize) -> Option<&mut Node> {
        self.nodes.get_mut(slot)?.as_mut()
    }

    fn state_at(&self, slot: usize) -> Option<Arc<BlockState>> {
        self.nodes
            .get(slot)?
            .as_ref()
            .map(|n| Arc::clone(&n.state))
    }

    fn insert(&mut self, state: Arc<BlockState>) -> usize {
        let id = state.id();
        let node = Node {
            state,
            children: Vec::new(),
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(id, slot);
        slot
    }

    fn release(&mut self, slot: usize) {
        if let Some(node) = self.nodes.get_mut(slot).and_then(Option::take) {
            self.index.remove(&node.state.id());
            self.free.push(slot);
        }
    }

    fn replace(&mut self, slot: usize, state: Arc<BlockState>) {
        let id = state.id();
        if let Some(node) = self.slot_mut(slot) {
            node.state = Arc::clone(&state);
        }
        if self.head.id() == id {
            self.head = Arc::clone(&state);
        }
        if self.root.id() == id {
            self.root = state;
        }
    }

    fn update<F>(&mut self, id: &BlockId, f: F) -> ForkDbResult<()>
    where
        F: FnOnce(&mut BlockState),
    {
        let slot = *self.index.get(id).ok_or(ForkDbError::UnknownBlock { id: *id })?;
        let mut state = self.state_at(slot).ok_or(ForkDbError::UnknownBlock { id: *id })?;
        f(Arc::make_mut(&mut state));
        self.replace(slot, state);
        Ok(())
    }

    /// `slot` and every slot below it.
    fn subtree(&self, slot: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![slot];
        while let Some(s) = stack.pop() {
            if let Some(Some(node)) = self.nodes.get(s) {
                out.push(s);
                stack.extend(node.children.iter().copied());
            }
        }
        out
    }

    fn select_head(&mut self) {
        let mut best = Arc::clone(&self.root);
        if let Some(current) = self.get(&self.head.id()) {
            best = current;
        }
        for node in self.nodes.iter().flatten() {
            if rank(&node.state) > rank(&best) {
                best = Arc::clone(&node.state);
            }
        }
        self.head = best;
    }
}
