// courier/src/mediator.rs

//! Defines `Mediator`, the public entry point: four dispatch operations,
//! one per resolution family.
//!
//! Each call resolves the handler and behaviors for the request's concrete
//! type from the registry, composes the chain, and runs it. Expected failure
//! modes (unknown handler, ambiguous registration, handler faults,
//! cancellation) come back inside a failure [`Outcome`]; nothing is raised
//! across the dispatch boundary.

use crate::chain;
use crate::core::behavior::BoxFuture;
use crate::core::outcome::Outcome;
use crate::core::request::{Command, Query};
use crate::error::{Family, Fault};
use crate::registry::Registry;

use std::any::type_name;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

/// The dispatcher. Holds no per-call state; concurrent dispatches are
/// independent and unordered relative to each other.
#[derive(Clone)]
pub struct Mediator {
  registry: Arc<Registry>,
}

impl Mediator {
  pub fn new(registry: Arc<Registry>) -> Self {
    Self { registry }
  }

  /// The registry this mediator resolves against.
  pub fn registry(&self) -> &Arc<Registry> {
    &self.registry
  }

  /// Dispatches a command synchronously.
  #[instrument(
    name = "Mediator::send",
    skip_all,
    fields(request_type = %type_name::<C>(), family = %Family::SyncCommand)
  )]
  pub fn send<C: Command>(&self, command: C) -> Outcome {
    let handler = match self.registry.resolve_command_handler::<C>() {
      Ok(handler) => handler,
      Err(fault) => {
        event!(Level::WARN, error = %fault, "Handler resolution failed.");
        return Outcome::fault(fault);
      }
    };
    let behaviors = self.registry.resolve_command_behaviors::<C>();
    event!(Level::DEBUG, num_behaviors = behaviors.len(), "Dispatching through chain.");

    let terminal: chain::SyncTerminal<C, ()> = Arc::new(move |req: &C| handler.handle(req));
    let layers = behaviors
      .into_iter()
      .map(|behavior| -> chain::SyncLayer<C, ()> {
        Arc::new(move |req, next| behavior.handle(req, next))
      })
      .collect();

    let run = chain::build_sync(terminal, layers);
    run(&command)
  }

  /// Dispatches a query synchronously, producing its typed payload.
  #[instrument(
    name = "Mediator::query",
    skip_all,
    fields(request_type = %type_name::<Q>(), family = %Family::SyncQuery)
  )]
  pub fn query<Q: Query>(&self, query: Q) -> Outcome<Q::Output> {
    let handler = match self.registry.resolve_query_handler::<Q>() {
      Ok(handler) => handler,
      Err(fault) => {
        event!(Level::WARN, error = %fault, "Handler resolution failed.");
        return Outcome::fault(fault);
      }
    };
    let behaviors = self.registry.resolve_query_behaviors::<Q>();
    event!(Level::DEBUG, num_behaviors = behaviors.len(), "Dispatching through chain.");

    let terminal: chain::SyncTerminal<Q, Q::Output> = Arc::new(move |req: &Q| handler.handle(req));
    let layers = behaviors
      .into_iter()
      .map(|behavior| -> chain::SyncLayer<Q, Q::Output> {
        Arc::new(move |req, next| behavior.handle(req, next))
      })
      .collect();

    let run = chain::build_sync(terminal, layers);
    run(&query)
  }

  /// Dispatches a command asynchronously.
  ///
  /// The whole chain races the cancellation token: a cancellation observed
  /// before the chain resolves yields a failure outcome carrying
  /// [`Fault::Cancelled`]. Every layer also receives the token so it can
  /// stop early on its own. Cancellation is cooperative: the in-flight
  /// future is dropped at its next suspension point, and a layer that never
  /// awaits simply runs to completion.
  #[instrument(
    name = "Mediator::send_async",
    skip_all,
    fields(request_type = %type_name::<C>(), family = %Family::AsyncCommand)
  )]
  pub async fn send_async<C: Command>(&self, command: C, cancel: CancellationToken) -> Outcome {
    let handler = match self.registry.resolve_async_command_handler::<C>() {
      Ok(handler) => handler,
      Err(fault) => {
        event!(Level::WARN, error = %fault, "Handler resolution failed.");
        return Outcome::fault(fault);
      }
    };
    let behaviors = self.registry.resolve_async_command_behaviors::<C>();
    event!(Level::DEBUG, num_behaviors = behaviors.len(), "Dispatching through chain.");

    let terminal: chain::AsyncTerminal<C, ()> =
      Arc::new(chain::constrain_terminal::<C, (), _>(move |req: &C, token: CancellationToken| {
        let handler = Arc::clone(&handler);
        let fut: BoxFuture<'_, Outcome> =
          Box::pin(async move { handler.handle(req, &token).await });
        fut
      }));
    let layers = behaviors
      .into_iter()
      .map(|behavior| -> chain::AsyncLayer<C, ()> {
        Arc::new(chain::constrain_layer::<C, (), _>(move |req, next, token| {
          let behavior = Arc::clone(&behavior);
          let fut: BoxFuture<'_, Outcome> =
            Box::pin(async move { behavior.handle(req, next, &token).await });
          fut
        }))
      })
      .collect();

    let run = chain::build_async(terminal, layers, cancel.clone());
    match cancel.run_until_cancelled(run(&command)).await {
      Some(outcome) => outcome,
      None => {
        event!(Level::DEBUG, "Dispatch cancelled before completion.");
        Outcome::fault(Fault::Cancelled)
      }
    }
  }

  /// Dispatches a query asynchronously, producing its typed payload.
  /// Cancellation semantics match [`Mediator::send_async`].
  #[instrument(
    name = "Mediator::query_async",
    skip_all,
    fields(request_type = %type_name::<Q>(), family = %Family::AsyncQuery)
  )]
  pub async fn query_async<Q: Query>(
    &self,
    query: Q,
    cancel: CancellationToken,
  ) -> Outcome<Q::Output> {
    let handler = match self.registry.resolve_async_query_handler::<Q>() {
      Ok(handler) => handler,
      Err(fault) => {
        event!(Level::WARN, error = %fault, "Handler resolution failed.");
        return Outcome::fault(fault);
      }
    };
    let behaviors = self.registry.resolve_async_query_behaviors::<Q>();
    event!(Level::DEBUG, num_behaviors = behaviors.len(), "Dispatching through chain.");

    let terminal: chain::AsyncTerminal<Q, Q::Output> =
      Arc::new(chain::constrain_terminal::<Q, Q::Output, _>(move |req: &Q, token: CancellationToken| {
        let handler = Arc::clone(&handler);
        let fut: BoxFuture<'_, Outcome<Q::Output>> =
          Box::pin(async move { handler.handle(req, &token).await });
        fut
      }));
    let layers = behaviors
      .into_iter()
      .map(|behavior| -> chain::AsyncLayer<Q, Q::Output> {
        Arc::new(chain::constrain_layer::<Q, Q::Output, _>(move |req, next, token| {
          let behavior = Arc::clone(&behavior);
          let fut: BoxFuture<'_, Outcome<Q::Output>> =
            Box::pin(async move { behavior.handle(req, next, &token).await });
          fut
        }))
      })
      .collect();

    let run = chain::build_async(terminal, layers, cancel.clone());
    match cancel.run_until_cancelled(run(&query)).await {
      Some(outcome) => outcome,
      None => {
        event!(Level::DEBUG, "Dispatch cancelled before completion.");
        Outcome::fault(Fault::Cancelled)
      }
    }
  }
}
