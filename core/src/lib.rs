// courier/src/lib.rs

//! Courier: an in-process, type-safe request/response mediator for Rust.
//!
//! A caller submits a typed request value; courier resolves the single
//! handler registered for that exact type, wraps it in the ordered pipeline
//! behaviors that apply, and returns a uniform [`Outcome`] carrying either a
//! success payload or a structured fault collection. Features:
//!  - Two request shapes: [`Command`] (no payload) and [`Query`] (typed payload).
//!  - Four independent dispatch families: sync/async times command/query.
//!  - Pipeline behaviors per concrete request type, plus shape-level
//!    behaviors applying to every command or every `Query<R>`, merged in
//!    registration order.
//!  - Behaviors may short-circuit, retry, or transform outcomes.
//!  - Cooperative cancellation of async dispatch via `CancellationToken`.
//!  - Expected failures (no handler, handler faults, cancellation) surface
//!    as failure outcomes, never as panics or raised errors.

pub mod core;
pub(crate) mod chain;
pub mod error;
pub mod mediator;
pub mod registry;

// --- Re-exports for the Public API ---

pub use crate::core::behavior::{
  AnyAsyncCommandBehavior, AnyAsyncQueryBehavior, AnyCommandBehavior, AnyNext, AnyNextAsync,
  AnyQueryBehavior, AsyncCommandBehavior, AsyncQueryBehavior, BoxFuture, CommandBehavior, Next,
  NextAsync, QueryBehavior,
};
pub use crate::core::handler::{
  AsyncCommandHandler, AsyncQueryHandler, CommandHandler, QueryHandler,
};
pub use crate::core::outcome::Outcome;
pub use crate::core::request::{AnyRequest, Command, Query};
pub use crate::error::{Family, Fault};
pub use crate::mediator::Mediator;
pub use crate::registry::Registry;

// The cancellation signal threaded through async dispatch, re-exported so
// callers don't need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
