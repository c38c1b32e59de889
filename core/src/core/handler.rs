// courier/src/core/handler.rs

//! The four handler contracts, one per dispatch family.
//!
//! Exactly one handler resolves per concrete request type per family.
//! Handler instances are long-lived: the registry owns them as `Arc`s and
//! reuses them across dispatch calls, so they must be free of per-call
//! mutable state or guard it themselves.

use crate::core::outcome::Outcome;
use crate::core::request::{Command, Query};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Synchronous handler for a command `C`.
pub trait CommandHandler<C: Command>: Send + Sync {
  fn handle(&self, command: &C) -> Outcome;
}

/// Synchronous handler for a query `Q`, producing `Q::Output`.
pub trait QueryHandler<Q: Query>: Send + Sync {
  fn handle(&self, query: &Q) -> Outcome<Q::Output>;
}

/// Asynchronous handler for a command `C`.
///
/// The cancellation token is the same one passed to
/// [`Mediator::send_async`](crate::Mediator::send_async); observing it is
/// cooperative, and a handler that never awaits simply runs to completion.
#[async_trait]
pub trait AsyncCommandHandler<C: Command>: Send + Sync {
  async fn handle(&self, command: &C, cancel: &CancellationToken) -> Outcome;
}

/// Asynchronous handler for a query `Q`.
#[async_trait]
pub trait AsyncQueryHandler<Q: Query>: Send + Sync {
  async fn handle(&self, query: &Q, cancel: &CancellationToken) -> Outcome<Q::Output>;
}
