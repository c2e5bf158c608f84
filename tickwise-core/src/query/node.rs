//! Query Nodes
//!
//! A query node is a user object that derives a cached value from external
//! state and from its parents' values. The engine stores nodes type-erased
//! and looks up the capability it needs at the call site:
//!
//! - [`Derives<S>`]: consume external state of type `S` and refresh the
//!   cached value. A node may derive from several state types.
//! - [`Exposes<V>`]: lend the cached value as a `V`. A node may expose
//!   several value types.
//!
//! Rust cannot ask a `dyn Any` whether it implements a trait, so the set of
//! capabilities is declared once, when the node is wrapped:
//!
//! ```rust,ignore
//! let node = Node::new(Speed::default())
//!     .derives::<FrameState>()
//!     .exposes::<f32>();
//! engine.register(SPEED, node, &[]);
//! ```
//!
//! Each declaration records a monomorphised thunk keyed by the `TypeId` of
//! the state or value type. Asking for a capability that was not declared
//! panics with [`QueryError::MissingCapability`].

use std::any::{type_name, Any, TypeId};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use super::engine::QueryEngine;
use crate::error::QueryError;
use crate::graph::QueryId;

/// Refresh a node's cached value from external state of type `S`.
pub trait Derives<S: ?Sized> {
    /// Recompute and store the cached value.
    ///
    /// Runs at most once per epoch, after every declared parent has been
    /// brought up to date. Parent values are read through `engine`.
    fn derive(&mut self, state: &S, engine: &QueryEngine);
}

/// Lend a node's cached value as a `V`.
pub trait Exposes<V: ?Sized> {
    /// The value stored by the last derivation.
    fn value(&self) -> &V;
}

type DeriveFn = fn(&dyn Any, &dyn Any, &QueryEngine);
type ExposeFn = fn(&dyn Any) -> Ref<'_, dyn Any>;

fn derive_thunk<N, S>(node: &dyn Any, state: &dyn Any, engine: &QueryEngine)
where
    N: Derives<S> + 'static,
    S: 'static,
{
    let cell = node
        .downcast_ref::<RefCell<N>>()
        .expect("node type matches its capability table");
    let state = state
        .downcast_ref::<S>()
        .expect("state type matches its capability table");
    cell.borrow_mut().derive(state, engine);
}

fn expose_thunk<N, V>(node: &dyn Any) -> Ref<'_, dyn Any>
where
    N: Exposes<V> + 'static,
    V: 'static,
{
    let cell = node
        .downcast_ref::<RefCell<N>>()
        .expect("node type matches its capability table");
    Ref::map(cell.borrow(), |n: &N| -> &dyn Any { n.value() })
}

/// A type-erased query node with its capability tables.
pub struct Node {
    cell: Rc<dyn Any>,
    type_name: &'static str,
    derives: SmallVec<[(TypeId, DeriveFn); 2]>,
    exposes: SmallVec<[(TypeId, ExposeFn); 2]>,
}

impl Node {
    /// Wrap a node the engine will own.
    pub fn new<N: 'static>(node: N) -> NodeBuilder<N> {
        Self::shared(Rc::new(RefCell::new(node)))
    }

    /// Wrap a node the caller keeps a handle to.
    pub fn shared<N: 'static>(node: Rc<RefCell<N>>) -> NodeBuilder<N> {
        NodeBuilder {
            cell: node,
            derives: SmallVec::new(),
            exposes: SmallVec::new(),
        }
    }

    /// Name of the wrapped node type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the node declared [`Derives<S>`].
    pub fn can_derive<S: 'static>(&self) -> bool {
        let key = TypeId::of::<S>();
        self.derives.iter().any(|(t, _)| *t == key)
    }

    /// Whether the node declared [`Exposes<V>`].
    pub fn can_expose<V: 'static>(&self) -> bool {
        let key = TypeId::of::<V>();
        self.exposes.iter().any(|(t, _)| *t == key)
    }

    pub(crate) fn derive<S: 'static>(&self, id: QueryId, state: &S, engine: &QueryEngine) {
        let key = TypeId::of::<S>();
        match self.derives.iter().find(|(t, _)| *t == key) {
            Some((_, derive)) => derive(&*self.cell, state, engine),
            None => panic!("{}", QueryError::missing_derives::<S>(id)),
        }
    }

    pub(crate) fn value<V: 'static>(&self, id: QueryId) -> Ref<'_, V> {
        let key = TypeId::of::<V>();
        let Some((_, expose)) = self.exposes.iter().find(|(t, _)| *t == key) else {
            panic!("{}", QueryError::missing_exposes::<V>(id));
        };
        Ref::map(expose(&*self.cell), |value| {
            value
                .downcast_ref::<V>()
                .expect("value type matches its capability table")
        })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("type_name", &self.type_name)
            .field("derives", &self.derives.len())
            .field("exposes", &self.exposes.len())
            .finish()
    }
}

/// Declares the capabilities of a node before it is registered.
pub struct NodeBuilder<N> {
    cell: Rc<RefCell<N>>,
    derives: SmallVec<[(TypeId, DeriveFn); 2]>,
    exposes: SmallVec<[(TypeId, ExposeFn); 2]>,
}

impl<N: 'static> NodeBuilder<N> {
    /// Declare that the node derives from external state `S`.
    pub fn derives<S: 'static>(mut self) -> Self
    where
        N: Derives<S>,
    {
        let key = TypeId::of::<S>();
        if !self.derives.iter().any(|(t, _)| *t == key) {
            self.derives.push((key, derive_thunk::<N, S> as DeriveFn));
        }
        self
    }

    /// Declare that the node exposes its value as a `V`.
    pub fn exposes<V: 'static>(mut self) -> Self
    where
        N: Exposes<V>,
    {
        let key = TypeId::of::<V>();
        if !self.exposes.iter().any(|(t, _)| *t == key) {
            self.exposes.push((key, expose_thunk::<N, V> as ExposeFn));
        }
        self
    }

    /// Finish the node.
    pub fn build(self) -> Node {
        Node {
            cell: self.cell,
            type_name: type_name::<N>(),
            derives: self.derives,
            exposes: self.exposes,
        }
    }
}

impl<N: 'static> From<NodeBuilder<N>> for Node {
    fn from(builder: NodeBuilder<N>) -> Self {
        builder.build()
    }
}
