//! Query Evaluation
//!
//! Queries are user objects that derive a cached value from per-epoch
//! external state and from the values of their declared parents. This
//! module holds the capability traits nodes implement, the type-erased
//! [`Node`] handle, and the [`QueryEngine`] that evaluates them.
//!
//! # Concepts
//!
//! ## Epochs
//!
//! An epoch is one tick of external state. The host calls
//! [`QueryEngine::begin_epoch`] once per tick and every query becomes stale.
//!
//! ## Ensure-current
//!
//! [`QueryEngine::ensure_current`] brings one query and all of its
//! transitive parents up to date. A derivation runs at most once per epoch
//! no matter how many paths lead to it, and never before its parents.
//!
//! ## Values
//!
//! [`QueryEngine::value`] and [`QueryEngine::value_ref`] read a query's
//! cached value. They never compute anything: the query must already be
//! current.
//!
//! # Example
//!
//! ```rust
//! use tickwise_core::graph::QueryId;
//! use tickwise_core::query::{Derives, Exposes, Node, QueryEngine};
//!
//! struct Frame { speed: f32 }
//!
//! #[derive(Default)]
//! struct Speed(f32);
//!
//! impl Derives<Frame> for Speed {
//!     fn derive(&mut self, state: &Frame, _: &QueryEngine) {
//!         self.0 = state.speed;
//!     }
//! }
//!
//! impl Exposes<f32> for Speed {
//!     fn value(&self) -> &f32 { &self.0 }
//! }
//!
//! const SPEED: QueryId = QueryId::new(0);
//!
//! let mut engine = QueryEngine::new(1);
//! engine.register(SPEED, Node::new(Speed::default()).derives::<Frame>().exposes::<f32>(), &[]);
//!
//! engine.begin_epoch();
//! engine.ensure_current(&Frame { speed: 3.5 }, SPEED);
//! assert_eq!(engine.value::<f32>(SPEED), 3.5);
//! ```

mod engine;
mod node;
mod snapshot;

pub use engine::{QueryEngine, MAX_CAPACITY};
pub use node::{Derives, Exposes, Node, NodeBuilder};
pub use snapshot::{EngineStats, GraphSnapshot, QueryInfo};
