// courier/src/core/behavior.rs

//! Pipeline behavior contracts: the ordered middleware layers that wrap a
//! handler invocation.
//!
//! A behavior receives the request and a `next` continuation. It may call
//! `next` once to continue the chain, skip it to short-circuit, or call it
//! several times (retry is contractually legal), and it may inspect or
//! transform the outcome it receives before returning it. A behavior must
//! not silently drop faults without replacing them.
//!
//! Two registration scopes exist:
//!
//! - Typed behaviors (`CommandBehavior<C>`, `QueryBehavior<Q>`, and their
//!   async forms) apply to one concrete request type.
//! - Shape-level behaviors (the `Any*` traits, following this crate's
//!   convention for type-erased contracts) apply to every command, or to
//!   every query returning a given payload type `R`. The registry merges
//!   both scopes into one list ordered purely by registration order.

use crate::core::outcome::Outcome;
use crate::core::request::{AnyRequest, Command, Query};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Boxed future used throughout the async dispatch path.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Continuation passed to a synchronous typed behavior.
pub type Next<'a, Req, R> = dyn Fn(&Req) -> Outcome<R> + 'a;

/// Continuation passed to an asynchronous typed behavior. Only the request
/// is borrowed by the returned future; all chain state is owned, which is
/// what lets one request borrow thread through every suspension point.
pub type NextAsync<Req, R> = dyn for<'r> Fn(&'r Req) -> BoxFuture<'r, Outcome<R>> + Send + Sync;

/// Continuation passed to a synchronous shape-level behavior.
pub type AnyNext<'a, R> = dyn Fn(&dyn AnyRequest) -> Outcome<R> + 'a;

/// Continuation passed to an asynchronous shape-level behavior.
pub type AnyNextAsync<'a, R> =
  dyn for<'r> Fn(&'r dyn AnyRequest) -> BoxFuture<'r, Outcome<R>> + Send + Sync + 'a;

/// Synchronous behavior wrapping dispatch of one concrete command type.
pub trait CommandBehavior<C: Command>: Send + Sync {
  fn handle(&self, command: &C, next: &Next<'_, C, ()>) -> Outcome;
}

/// Synchronous behavior wrapping dispatch of one concrete query type.
pub trait QueryBehavior<Q: Query>: Send + Sync {
  fn handle(&self, query: &Q, next: &Next<'_, Q, Q::Output>) -> Outcome<Q::Output>;
}

/// Asynchronous behavior wrapping dispatch of one concrete command type.
#[async_trait]
pub trait AsyncCommandBehavior<C: Command>: Send + Sync {
  async fn handle(
    &self,
    command: &C,
    next: &NextAsync<C, ()>,
    cancel: &CancellationToken,
  ) -> Outcome;
}

/// Asynchronous behavior wrapping dispatch of one concrete query type.
#[async_trait]
pub trait AsyncQueryBehavior<Q: Query>: Send + Sync {
  async fn handle(
    &self,
    query: &Q,
    next: &NextAsync<Q, Q::Output>,
    cancel: &CancellationToken,
  ) -> Outcome<Q::Output>;
}

/// Synchronous behavior applying to every command.
pub trait AnyCommandBehavior: Send + Sync {
  fn handle(&self, command: &dyn AnyRequest, next: &AnyNext<'_, ()>) -> Outcome;
}

/// Synchronous behavior applying to every query whose payload type is `R`.
pub trait AnyQueryBehavior<R>: Send + Sync {
  fn handle(&self, query: &dyn AnyRequest, next: &AnyNext<'_, R>) -> Outcome<R>;
}

/// Asynchronous behavior applying to every command.
#[async_trait]
pub trait AnyAsyncCommandBehavior: Send + Sync {
  async fn handle(
    &self,
    command: &dyn AnyRequest,
    next: &AnyNextAsync<()>,
    cancel: &CancellationToken,
  ) -> Outcome;
}

/// Asynchronous behavior applying to every query whose payload type is `R`.
#[async_trait]
pub trait AnyAsyncQueryBehavior<R: Send + 'static>: Send + Sync {
  async fn handle(
    &self,
    query: &dyn AnyRequest,
    next: &AnyNextAsync<R>,
    cancel: &CancellationToken,
  ) -> Outcome<R>;
}
