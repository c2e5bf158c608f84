//! Query Engine
//!
//! The engine owns one slot per query id, the epoch counter, and the shared
//! dependency pool. It brings queries up to date on demand.
//!
//! # Algorithm
//!
//! `ensure_current(state, id)` is a memoized depth-first walk over the
//! declared parents:
//!
//! 1. If the slot was updated in the current epoch, return. This is what
//!    makes repeated calls free and collapses diamonds to one derivation.
//! 2. Otherwise, ensure every parent is current, in declaration order.
//! 3. Run the node's derivation with the state and the engine itself, so it
//!    can read its parents' values.
//! 4. Record the current epoch in the slot.
//!
//! `begin_epoch` is the only thing that makes a query stale again. There is
//! no invalidation pass: advancing the counter past every recorded epoch
//! does it implicitly.
//!
//! # Reentrancy
//!
//! Evaluation takes `&self`. Per-slot state that changes during evaluation
//! lives in `Cell`s and nodes sit behind `RefCell`s, so a derivation may call
//! back into [`QueryEngine::ensure_current`] and [`QueryEngine::value`] for
//! other queries. The engine is single-threaded and `!Sync`.
//!
//! # Cycles
//!
//! The graph must be acyclic. With contract checks on, a slot whose
//! derivation is in flight is flagged, and re-entering it panics with
//! [`QueryError::Cycle`]. The flag is cleared on unwind too, so a host that
//! catches a panicking derivation can retry it. With checks off a cycle
//! recurses until the stack runs out.

use std::cell::{Cell, Ref};

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::node::Node;
use crate::config::EngineConfig;
use crate::error::{contract, QueryError, CONTRACT_CHECKS};
use crate::graph::{DepDescriptor, DependencyPool, Deps, EncodeError, Epoch, QueryId, MAX_RAW_ID};

/// Largest number of slots an engine can address.
pub const MAX_CAPACITY: usize = MAX_RAW_ID as usize + 1;

/// Per-query bookkeeping.
#[derive(Debug, Default)]
struct Slot {
    updated_epoch: Cell<Epoch>,
    evaluating: Cell<bool>,
    deps: DepDescriptor,
    node: Option<Node>,
}

/// Clears a slot's in-flight flag when its derivation ends or unwinds.
struct Evaluating<'a>(&'a Cell<bool>);

impl Drop for Evaluating<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Epoch-scoped memoization engine over a fixed set of query ids.
#[derive(Debug)]
pub struct QueryEngine {
    slots: Box<[Slot]>,
    pool: DependencyPool,
    epoch: Epoch,
    registered: usize,
    epoch_derivations: Cell<u64>,
    total_derivations: Cell<u64>,
}

impl QueryEngine {
    /// Create an engine with room for ids `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self::with_pool_capacity(capacity, 0)
    }

    /// Create an engine from a validated configuration.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_pool_capacity(config.capacity, config.pool_capacity)
    }

    fn with_pool_capacity(capacity: usize, pool_capacity: usize) -> Self {
        contract!(
            capacity <= MAX_CAPACITY,
            QueryError::CapacityTooLarge {
                requested: capacity,
                max: MAX_CAPACITY,
            }
        );
        let slots = (0..capacity).map(|_| Slot::default()).collect();
        Self {
            slots,
            pool: DependencyPool::with_capacity(pool_capacity),
            epoch: 0,
            registered: 0,
            epoch_derivations: Cell::new(0),
            total_derivations: Cell::new(0),
        }
    }

    /// Number of addressable ids.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of registered queries.
    pub fn len(&self) -> usize {
        self.registered
    }

    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    /// The current epoch. Zero until the first [`QueryEngine::begin_epoch`].
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Whether `id` has a registered node.
    pub fn is_registered(&self, id: QueryId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|slot| slot.node.is_some())
    }

    /// Whether `id` was brought up to date in the current epoch.
    pub fn is_current(&self, id: QueryId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|slot| slot.node.is_some() && slot.updated_epoch.get() == self.epoch)
    }

    /// Epoch in which `id` last ran its derivation, zero if never.
    pub fn last_updated(&self, id: QueryId) -> Epoch {
        self.registered_slot(id).0.updated_epoch.get()
    }

    /// Registered ids in ascending order.
    pub fn registered(&self) -> impl Iterator<Item = QueryId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.node.is_some())
            .filter_map(|(index, _)| QueryId::from_index(index))
    }

    /// Type name of the node registered under `id`.
    pub fn node_type(&self, id: QueryId) -> &'static str {
        self.registered_slot(id).1.type_name()
    }

    /// Decoded dependency list of `id`.
    pub fn deps(&self, id: QueryId) -> Deps {
        self.registered_slot(id).0.deps.decode()
    }

    /// Declared parents of `id`, in declaration order.
    pub fn parents(&self, id: QueryId) -> SmallVec<[QueryId; 4]> {
        self.deps(id).to_vec(&self.pool)
    }

    /// The shared pool backing dependency lists longer than two.
    pub fn dependency_pool(&self) -> &DependencyPool {
        &self.pool
    }

    /// Derivations run since the last [`QueryEngine::begin_epoch`].
    pub fn epoch_derivations(&self) -> u64 {
        self.epoch_derivations.get()
    }

    /// Derivations run over the engine's lifetime.
    pub fn total_derivations(&self) -> u64 {
        self.total_derivations.get()
    }

    /// Check whether `id` could be registered with `parents`.
    ///
    /// Parents do not have to be registered yet, only addressable.
    pub fn validate(&self, id: QueryId, parents: &[QueryId]) -> Result<(), QueryError> {
        self.check_id(id)?;
        if self.slots[id.index()].node.is_some() {
            return Err(QueryError::AlreadyRegistered(id));
        }
        for &parent in parents {
            self.check_id(parent)?;
        }
        DepDescriptor::check(parents, &self.pool).map_err(|err| match err {
            EncodeError::TooManyParents(count) => QueryError::TooManyParents {
                id,
                count,
                max: MAX_RAW_ID as usize,
            },
            EncodeError::PoolOverflow(offset) => QueryError::PoolOverflow { id, offset },
        })
    }

    fn check_id(&self, id: QueryId) -> Result<(), QueryError> {
        if id.index() >= self.slots.len() || id.raw() > MAX_RAW_ID {
            return Err(QueryError::IdOutOfRange {
                id,
                capacity: self.slots.len(),
            });
        }
        Ok(())
    }

    /// Register `node` under `id`, depending on `parents`.
    ///
    /// Registration happens once per id, before the first epoch.
    ///
    /// # Panics
    ///
    /// With contract checks on, if [`QueryEngine::validate`] fails.
    pub fn register(&mut self, id: QueryId, node: impl Into<Node>, parents: &[QueryId]) {
        if CONTRACT_CHECKS {
            if let Err(err) = self.validate(id, parents) {
                panic!("{err}");
            }
        }
        self.insert(id, node.into(), parents);
    }

    /// Register `node` under `id`, returning contract violations as errors.
    ///
    /// Validates in every build.
    pub fn try_register(
        &mut self,
        id: QueryId,
        node: impl Into<Node>,
        parents: &[QueryId],
    ) -> Result<(), QueryError> {
        self.validate(id, parents)?;
        self.insert(id, node.into(), parents);
        Ok(())
    }

    fn insert(&mut self, id: QueryId, node: Node, parents: &[QueryId]) {
        let deps = DepDescriptor::encode(parents, &mut self.pool);
        debug!(
            id = %id,
            parents = parents.len(),
            form = deps.decode().form(),
            node = node.type_name(),
            "registered query"
        );

        let slot = &mut self.slots[id.index()];
        if slot.node.is_none() {
            self.registered += 1;
        }
        slot.deps = deps;
        slot.node = Some(node);
        slot.updated_epoch.set(0);
        slot.evaluating.set(false);
    }

    /// Advance to the next epoch, making every query stale.
    pub fn begin_epoch(&mut self) {
        self.epoch = self
            .epoch
            .checked_add(1)
            .expect("epoch counter exhausted");
        self.epoch_derivations.set(0);
        debug!(epoch = self.epoch, "began epoch");
    }

    /// Bring `id` and its transitive parents up to date for this epoch.
    ///
    /// Each query's derivation runs at most once per epoch, and only after
    /// all of its parents have run. Before the first
    /// [`QueryEngine::begin_epoch`] every query counts as current and
    /// nothing runs.
    ///
    /// # Panics
    ///
    /// If `id` is not registered or its node does not derive from `S`, and
    /// with contract checks on, if the graph reached from `id` has a cycle.
    pub fn ensure_current<S: 'static>(&self, state: &S, id: QueryId) {
        let (slot, node) = self.registered_slot(id);
        if slot.updated_epoch.get() == self.epoch {
            return;
        }

        let _evaluating = if CONTRACT_CHECKS {
            if slot.evaluating.replace(true) {
                panic!("{}", QueryError::Cycle(id));
            }
            Some(Evaluating(&slot.evaluating))
        } else {
            None
        };

        match slot.deps.decode() {
            Deps::None => {}
            Deps::One(parent) => self.ensure_current(state, parent),
            Deps::Two(first, second) => {
                self.ensure_current(state, first);
                self.ensure_current(state, second);
            }
            Deps::Many { start, count } => {
                for &raw in self.pool.slice(start, count) {
                    self.ensure_current(state, QueryId::new(raw));
                }
            }
        }

        trace!(id = %id, epoch = self.epoch, "deriving query");
        node.derive(id, state, self);

        slot.updated_epoch.set(self.epoch);
        self.epoch_derivations.set(self.epoch_derivations.get() + 1);
        self.total_derivations.set(self.total_derivations.get() + 1);
    }

    /// Bring every id in `sinks` up to date for this epoch.
    pub fn ensure_all_current<S: 'static>(
        &self,
        state: &S,
        sinks: impl IntoIterator<Item = QueryId>,
    ) {
        for id in sinks {
            self.ensure_current(state, id);
        }
    }

    /// Clone out the value `id` exposes as a `V`.
    ///
    /// # Panics
    ///
    /// See [`QueryEngine::value_ref`].
    pub fn value<V: Clone + 'static>(&self, id: QueryId) -> V {
        self.value_ref::<V>(id).clone()
    }

    /// Borrow the value `id` exposes as a `V`.
    ///
    /// Performs no computation. `id` must already be current in this epoch.
    ///
    /// # Panics
    ///
    /// If `id` is not registered or its node does not expose `V`, and with
    /// contract checks on, if `id` is not current.
    pub fn value_ref<V: 'static>(&self, id: QueryId) -> Ref<'_, V> {
        let (slot, node) = self.registered_slot(id);
        contract!(
            slot.updated_epoch.get() == self.epoch,
            QueryError::NotCurrent {
                id,
                last_updated: slot.updated_epoch.get(),
                epoch: self.epoch,
            }
        );
        node.value::<V>(id)
    }

    fn registered_slot(&self, id: QueryId) -> (&Slot, &Node) {
        contract!(
            id.index() < self.slots.len(),
            QueryError::IdOutOfRange {
                id,
                capacity: self.slots.len(),
            }
        );
        let slot = &self.slots[id.index()];
        match &slot.node {
            Some(node) => (slot, node),
            None => panic!("{}", QueryError::Unregistered(id)),
        }
    }
}
