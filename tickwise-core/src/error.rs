//! Errors and Contract Checks
//!
//! Almost everything that can go wrong in the engine is a programmer error:
//! registering an id twice, asking for a value before it was brought up to
//! date, wiring a cycle into the graph. None of these have a sensible
//! continuation, so the engine panics with a [`QueryError`] message instead
//! of returning it.
//!
//! The checks cost a branch each on the hot path. They are enabled whenever
//! `debug_assertions` is on, or when the `contract-checks` feature is turned
//! on for a release build. Otherwise [`CONTRACT_CHECKS`] is `false` and the
//! optimizer removes them.
//!
//! [`QueryEngine::try_register`](crate::query::QueryEngine::try_register) is
//! the one place that always validates and hands the error back, for hosts
//! that build their graph from data.

use std::any::type_name;

use thiserror::Error;

use crate::graph::{Epoch, QueryId};

/// Whether precondition checks are compiled in.
pub const CONTRACT_CHECKS: bool = cfg!(any(debug_assertions, feature = "contract-checks"));

/// A broken engine contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query id {id} is outside the engine capacity of {capacity}")]
    IdOutOfRange { id: QueryId, capacity: usize },

    #[error("query {0} is already registered")]
    AlreadyRegistered(QueryId),

    #[error("query {0} is not registered")]
    Unregistered(QueryId),

    #[error("query {id} declares {count} parents, the limit is {max}")]
    TooManyParents { id: QueryId, count: usize, max: usize },

    #[error("dependency pool offset {offset} for query {id} does not fit in a query id")]
    PoolOverflow { id: QueryId, offset: usize },

    #[error("query {id} was last updated in epoch {last_updated}, current epoch is {epoch}")]
    NotCurrent {
        id: QueryId,
        last_updated: Epoch,
        epoch: Epoch,
    },

    #[error("query {id} does not provide `{capability}`")]
    MissingCapability {
        id: QueryId,
        capability: &'static str,
    },

    #[error("query {0} is part of a dependency cycle")]
    Cycle(QueryId),

    #[error("capacity {requested} exceeds the identifier space of {max}")]
    CapacityTooLarge { requested: usize, max: usize },
}

impl QueryError {
    pub(crate) fn missing_derives<S: ?Sized>(id: QueryId) -> Self {
        Self::MissingCapability {
            id,
            capability: type_name::<dyn crate::query::Derives<S>>(),
        }
    }

    pub(crate) fn missing_exposes<V: ?Sized>(id: QueryId) -> Self {
        Self::MissingCapability {
            id,
            capability: type_name::<dyn crate::query::Exposes<V>>(),
        }
    }
}

/// Errors raised while loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid engine config: {0}")]
    Invalid(#[from] QueryError),
}

/// Panics with `err` if `cond` is false and contract checks are compiled in.
macro_rules! contract {
    ($cond:expr, $err:expr $(,)?) => {
        if $crate::error::CONTRACT_CHECKS && !$cond {
            panic!("{}", $err);
        }
    };
}

pub(crate) use contract;
