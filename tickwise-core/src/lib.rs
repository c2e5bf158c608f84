//! Tickwise Core
//!
//! This crate provides an incremental, epoch-scoped memoization engine for
//! graphs of "query" nodes. It is meant for tight loops such as a game frame:
//! thousands of queries, re-evaluated every tick, with no per-node heap
//! allocation in the common cases.
//!
//! It guarantees that:
//!
//! - A query's derivation runs at most once per epoch, however many
//!   dependents reach it.
//! - All of a query's parents are brought up to date before it runs.
//!
//! # Architecture
//!
//! The crate is organized into a few modules:
//!
//! - `graph`: Query ids, packed dependency descriptors, and the append-only
//!   dependency pool
//! - `query`: Node capabilities, the type-erased node handle, and the engine
//! - `config`: Serializable engine sizing
//! - `error`: Contract violations and the switch that compiles checks out
//!
//! # Example
//!
//! ```rust
//! use tickwise_core::graph::QueryId;
//! use tickwise_core::query::{Derives, Exposes, Node, QueryEngine};
//!
//! struct State { val1: f32 }
//!
//! #[derive(Default)]
//! struct A { value: f32 }
//!
//! #[derive(Default)]
//! struct B { value: f32 }
//!
//! const A_ID: QueryId = QueryId::new(0);
//! const B_ID: QueryId = QueryId::new(1);
//!
//! impl Derives<State> for A {
//!     fn derive(&mut self, state: &State, _: &QueryEngine) {
//!         self.value = state.val1 + 1.0;
//!     }
//! }
//!
//! impl Derives<State> for B {
//!     fn derive(&mut self, _: &State, engine: &QueryEngine) {
//!         self.value = engine.value::<f32>(A_ID) + 1.0;
//!     }
//! }
//!
//! impl Exposes<f32> for A { fn value(&self) -> &f32 { &self.value } }
//! impl Exposes<f32> for B { fn value(&self) -> &f32 { &self.value } }
//!
//! let mut engine = QueryEngine::new(2);
//! engine.register(A_ID, Node::new(A::default()).derives::<State>().exposes::<f32>(), &[]);
//! engine.register(B_ID, Node::new(B::default()).derives::<State>().exposes::<f32>(), &[A_ID]);
//!
//! engine.begin_epoch();
//! engine.ensure_current(&State { val1: 10.0 }, B_ID);
//!
//! assert_eq!(engine.value::<f32>(A_ID), 11.0);
//! assert_eq!(engine.value::<f32>(B_ID), 12.0);
//! ```

pub mod error;
pub mod config;
pub mod graph;
pub mod query;

pub use config::EngineConfig;
pub use error::{ConfigError, QueryError};
pub use graph::QueryId;
pub use query::{Derives, Exposes, Node, QueryEngine};
