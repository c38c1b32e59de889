// courier/src/registry.rs

//! Defines `Registry`, the type-indexed mapping from a request's concrete
//! type to its one handler and its ordered, merged list of pipeline
//! behaviors.
//!
//! Registration is explicit, against a table keyed by `TypeId`, one slot
//! family per dispatch shape. Registration takes `&self` behind a
//! `parking_lot::RwLock`, so late registration is allowed; the mediator only
//! reads at dispatch time and rebuilds its chain per call, making late
//! registrations visible on the next dispatch.
//!
//! Behavior ordering: every behavior registration, typed or shape-level,
//! draws a sequence number from one shared counter. Resolution merges the
//! concrete-type behaviors for a request with the applicable shape-level
//! behaviors and sorts by that sequence, so the two scopes interleave in
//! plain registration order rather than grouping.

use crate::core::behavior::{
  AnyAsyncCommandBehavior, AnyAsyncQueryBehavior, AnyCommandBehavior, AnyQueryBehavior,
  AsyncCommandBehavior, AsyncQueryBehavior, BoxFuture, CommandBehavior, Next, NextAsync,
  QueryBehavior,
};
use crate::core::handler::{
  AsyncCommandHandler, AsyncQueryHandler, CommandHandler, QueryHandler,
};
use crate::core::outcome::Outcome;
use crate::core::request::{AnyRequest, Command, ErasedRequest, Query};
use crate::error::{Family, Fault};

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{event, Level};

/// Type-erased registry entry; the concrete content is an `Arc<dyn …>` of
/// the trait matching the slot's family.
type AnyEntry = Box<dyn Any + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
  seq: u64,
  /// Handler slots keyed by family and concrete request type. More than
  /// one entry in a slot means the registration was ambiguous.
  handlers: HashMap<(Family, TypeId), Vec<AnyEntry>>,
  /// Typed behaviors keyed the same way, tagged with their sequence number.
  behaviors: HashMap<(Family, TypeId), Vec<(u64, AnyEntry)>>,
  /// Shape-level behaviors for every command.
  any_command: Vec<(u64, Arc<dyn AnyCommandBehavior>)>,
  any_command_async: Vec<(u64, Arc<dyn AnyAsyncCommandBehavior>)>,
  /// Shape-level behaviors for every query, keyed by the payload type `R`.
  any_query: HashMap<TypeId, Vec<(u64, AnyEntry)>>,
  any_query_async: HashMap<TypeId, Vec<(u64, AnyEntry)>>,
}

impl RegistryInner {
  fn next_seq(&mut self) -> u64 {
    let seq = self.seq;
    self.seq += 1;
    seq
  }
}

/// The type-indexed handler and behavior registry consumed by
/// [`Mediator`](crate::Mediator).
///
/// The four resolution families are fully independent: a request type
/// registered only for the sync family is not resolvable for the async one,
/// and the mediator never falls back between them.
pub struct Registry {
  inner: RwLock<RegistryInner>,
}

impl Registry {
  /// Creates a new, empty registry.
  pub fn new() -> Self {
    Self {
      inner: RwLock::new(RegistryInner::default()),
    }
  }

  fn register_handler_entry(
    &self,
    family: Family,
    request: TypeId,
    request_type: &'static str,
    entry: AnyEntry,
  ) {
    event!(Level::DEBUG, %family, request_type, "Registering handler.");
    let mut inner = self.inner.write();
    let slot = inner.handlers.entry((family, request)).or_default();
    slot.push(entry);
    if slot.len() > 1 {
      // Kept rather than replaced: dispatch must fail as ambiguous, not
      // silently pick one.
      event!(
        Level::WARN,
        %family,
        request_type,
        registrations = slot.len(),
        "Duplicate handler registration; dispatch for this type will fail as ambiguous."
      );
    }
  }

  fn register_behavior_entry(&self, family: Family, request: TypeId, entry: AnyEntry) {
    let mut inner = self.inner.write();
    let seq = inner.next_seq();
    inner
      .behaviors
      .entry((family, request))
      .or_default()
      .push((seq, entry));
  }

  // --- Handler registration, one method per family ---

  pub fn register_command_handler<C: Command>(&self, handler: impl CommandHandler<C> + 'static) {
    let entry: Arc<dyn CommandHandler<C>> = Arc::new(handler);
    self.register_handler_entry(
      Family::SyncCommand,
      TypeId::of::<C>(),
      type_name::<C>(),
      Box::new(entry),
    );
  }

  pub fn register_query_handler<Q: Query>(&self, handler: impl QueryHandler<Q> + 'static) {
    let entry: Arc<dyn QueryHandler<Q>> = Arc::new(handler);
    self.register_handler_entry(
      Family::SyncQuery,
      TypeId::of::<Q>(),
      type_name::<Q>(),
      Box::new(entry),
    );
  }

  pub fn register_async_command_handler<C: Command>(
    &self,
    handler: impl AsyncCommandHandler<C> + 'static,
  ) {
    let entry: Arc<dyn AsyncCommandHandler<C>> = Arc::new(handler);
    self.register_handler_entry(
      Family::AsyncCommand,
      TypeId::of::<C>(),
      type_name::<C>(),
      Box::new(entry),
    );
  }

  pub fn register_async_query_handler<Q: Query>(
    &self,
    handler: impl AsyncQueryHandler<Q> + 'static,
  ) {
    let entry: Arc<dyn AsyncQueryHandler<Q>> = Arc::new(handler);
    self.register_handler_entry(
      Family::AsyncQuery,
      TypeId::of::<Q>(),
      type_name::<Q>(),
      Box::new(entry),
    );
  }

  // --- Typed behavior registration ---

  pub fn register_command_behavior<C: Command>(&self, behavior: impl CommandBehavior<C> + 'static) {
    let entry: Arc<dyn CommandBehavior<C>> = Arc::new(behavior);
    self.register_behavior_entry(Family::SyncCommand, TypeId::of::<C>(), Box::new(entry));
  }

  pub fn register_query_behavior<Q: Query>(&self, behavior: impl QueryBehavior<Q> + 'static) {
    let entry: Arc<dyn QueryBehavior<Q>> = Arc::new(behavior);
    self.register_behavior_entry(Family::SyncQuery, TypeId::of::<Q>(), Box::new(entry));
  }

  pub fn register_async_command_behavior<C: Command>(
    &self,
    behavior: impl AsyncCommandBehavior<C> + 'static,
  ) {
    let entry: Arc<dyn AsyncCommandBehavior<C>> = Arc::new(behavior);
    self.register_behavior_entry(Family::AsyncCommand, TypeId::of::<C>(), Box::new(entry));
  }

  pub fn register_async_query_behavior<Q: Query>(
    &self,
    behavior: impl AsyncQueryBehavior<Q> + 'static,
  ) {
    let entry: Arc<dyn AsyncQueryBehavior<Q>> = Arc::new(behavior);
    self.register_behavior_entry(Family::AsyncQuery, TypeId::of::<Q>(), Box::new(entry));
  }

  // --- Shape-level behavior registration ---

  pub fn register_any_command_behavior(&self, behavior: impl AnyCommandBehavior + 'static) {
    let mut inner = self.inner.write();
    let seq = inner.next_seq();
    inner.any_command.push((seq, Arc::new(behavior)));
  }

  pub fn register_any_query_behavior<R: Send + 'static>(
    &self,
    behavior: impl AnyQueryBehavior<R> + 'static,
  ) {
    let entry: Arc<dyn AnyQueryBehavior<R>> = Arc::new(behavior);
    let mut inner = self.inner.write();
    let seq = inner.next_seq();
    inner
      .any_query
      .entry(TypeId::of::<R>())
      .or_default()
      .push((seq, Box::new(entry)));
  }

  pub fn register_any_async_command_behavior(
    &self,
    behavior: impl AnyAsyncCommandBehavior + 'static,
  ) {
    let mut inner = self.inner.write();
    let seq = inner.next_seq();
    inner.any_command_async.push((seq, Arc::new(behavior)));
  }

  pub fn register_any_async_query_behavior<R: Send + 'static>(
    &self,
    behavior: impl AnyAsyncQueryBehavior<R> + 'static,
  ) {
    let entry: Arc<dyn AnyAsyncQueryBehavior<R>> = Arc::new(behavior);
    let mut inner = self.inner.write();
    let seq = inner.next_seq();
    inner
      .any_query_async
      .entry(TypeId::of::<R>())
      .or_default()
      .push((seq, Box::new(entry)));
  }

  // --- Resolution: the boundary the mediator consumes ---

  fn resolve_handler_slot<H: Clone + 'static>(
    &self,
    family: Family,
    request: TypeId,
    request_type: &'static str,
  ) -> Result<H, Fault> {
    let inner = self.inner.read();
    match inner.handlers.get(&(family, request)).map(Vec::as_slice) {
      None | Some([]) => Err(Fault::HandlerNotFound {
        family,
        request_type,
      }),
      Some([entry]) => match entry.downcast_ref::<H>() {
        Some(handler) => Ok(handler.clone()),
        None => {
          // Unreachable by construction: slots are only ever filled through
          // the typed registration methods above.
          event!(
            Level::ERROR,
            %family,
            request_type,
            expected = type_name::<H>(),
            "Handler slot holds an entry of the wrong type."
          );
          Err(Fault::HandlerNotFound {
            family,
            request_type,
          })
        }
      },
      Some(_) => Err(Fault::HandlerAmbiguous {
        family,
        request_type,
      }),
    }
  }

  fn typed_behaviors<B: Clone + 'static>(
    inner: &RegistryInner,
    family: Family,
    request: TypeId,
    out: &mut Vec<(u64, B)>,
  ) {
    if let Some(entries) = inner.behaviors.get(&(family, request)) {
      for (seq, entry) in entries {
        match entry.downcast_ref::<B>() {
          Some(behavior) => out.push((*seq, behavior.clone())),
          None => event!(
            Level::ERROR,
            %family,
            expected = type_name::<B>(),
            "Behavior slot holds an entry of the wrong type; skipping."
          ),
        }
      }
    }
  }

  pub fn resolve_command_handler<C: Command>(&self) -> Result<Arc<dyn CommandHandler<C>>, Fault> {
    self.resolve_handler_slot(Family::SyncCommand, TypeId::of::<C>(), type_name::<C>())
  }

  pub fn resolve_query_handler<Q: Query>(&self) -> Result<Arc<dyn QueryHandler<Q>>, Fault> {
    self.resolve_handler_slot(Family::SyncQuery, TypeId::of::<Q>(), type_name::<Q>())
  }

  pub fn resolve_async_command_handler<C: Command>(
    &self,
  ) -> Result<Arc<dyn AsyncCommandHandler<C>>, Fault> {
    self.resolve_handler_slot(Family::AsyncCommand, TypeId::of::<C>(), type_name::<C>())
  }

  pub fn resolve_async_query_handler<Q: Query>(
    &self,
  ) -> Result<Arc<dyn AsyncQueryHandler<Q>>, Fault> {
    self.resolve_handler_slot(Family::AsyncQuery, TypeId::of::<Q>(), type_name::<Q>())
  }

  /// The merged, registration-ordered behaviors applying to command `C` in
  /// the sync family. An empty list is valid and means a bare handler call.
  pub fn resolve_command_behaviors<C: Command>(&self) -> Vec<Arc<dyn CommandBehavior<C>>> {
    let inner = self.inner.read();
    let mut merged: Vec<(u64, Arc<dyn CommandBehavior<C>>)> = Vec::new();
    Self::typed_behaviors(&inner, Family::SyncCommand, TypeId::of::<C>(), &mut merged);
    for (seq, behavior) in &inner.any_command {
      merged.push((*seq, Arc::new(AnyCommandShim(Arc::clone(behavior)))));
    }
    merged.sort_by_key(|(seq, _)| *seq);
    merged.into_iter().map(|(_, behavior)| behavior).collect()
  }

  pub fn resolve_query_behaviors<Q: Query>(&self) -> Vec<Arc<dyn QueryBehavior<Q>>> {
    let inner = self.inner.read();
    let mut merged: Vec<(u64, Arc<dyn QueryBehavior<Q>>)> = Vec::new();
    Self::typed_behaviors(&inner, Family::SyncQuery, TypeId::of::<Q>(), &mut merged);
    if let Some(entries) = inner.any_query.get(&TypeId::of::<Q::Output>()) {
      for (seq, entry) in entries {
        match entry.downcast_ref::<Arc<dyn AnyQueryBehavior<Q::Output>>>() {
          Some(behavior) => merged.push((
            *seq,
            Arc::new(AnyQueryShim::<Q> {
              inner: Arc::clone(behavior),
              _request: PhantomData,
            }),
          )),
          None => event!(
            Level::ERROR,
            payload_type = type_name::<Q::Output>(),
            "Shape-level query behavior slot holds an entry of the wrong type; skipping."
          ),
        }
      }
    }
    merged.sort_by_key(|(seq, _)| *seq);
    merged.into_iter().map(|(_, behavior)| behavior).collect()
  }

  pub fn resolve_async_command_behaviors<C: Command>(
    &self,
  ) -> Vec<Arc<dyn AsyncCommandBehavior<C>>> {
    let inner = self.inner.read();
    let mut merged: Vec<(u64, Arc<dyn AsyncCommandBehavior<C>>)> = Vec::new();
    Self::typed_behaviors(&inner, Family::AsyncCommand, TypeId::of::<C>(), &mut merged);
    for (seq, behavior) in &inner.any_command_async {
      merged.push((*seq, Arc::new(AnyAsyncCommandShim(Arc::clone(behavior)))));
    }
    merged.sort_by_key(|(seq, _)| *seq);
    merged.into_iter().map(|(_, behavior)| behavior).collect()
  }

  pub fn resolve_async_query_behaviors<Q: Query>(&self) -> Vec<Arc<dyn AsyncQueryBehavior<Q>>> {
    let inner = self.inner.read();
    let mut merged: Vec<(u64, Arc<dyn AsyncQueryBehavior<Q>>)> = Vec::new();
    Self::typed_behaviors(&inner, Family::AsyncQuery, TypeId::of::<Q>(), &mut merged);
    if let Some(entries) = inner.any_query_async.get(&TypeId::of::<Q::Output>()) {
      for (seq, entry) in entries {
        match entry.downcast_ref::<Arc<dyn AnyAsyncQueryBehavior<Q::Output>>>() {
          Some(behavior) => merged.push((
            *seq,
            Arc::new(AnyAsyncQueryShim::<Q> {
              inner: Arc::clone(behavior),
              _request: PhantomData,
            }),
          )),
          None => event!(
            Level::ERROR,
            payload_type = type_name::<Q::Output>(),
            "Shape-level query behavior slot holds an entry of the wrong type; skipping."
          ),
        }
      }
    }
    merged.sort_by_key(|(seq, _)| *seq);
    merged.into_iter().map(|(_, behavior)| behavior).collect()
  }
}

impl Default for Registry {
  fn default() -> Self {
    Self::new()
  }
}

// --- Shims adapting shape-level behaviors into the typed chain ---
//
// The typed chain only ever sees typed behaviors; a shim erases the request
// on the way in and downcasts it back on the way out of `next`. A behavior
// that forwards some other value to `next` trips the downcast and gets a
// PipelineContract fault instead of reaching the handler.

fn forwarded_wrong_type<C>(forwarded: &dyn AnyRequest) -> Fault {
  Fault::PipelineContract {
    message: format!(
      "shape-level behavior forwarded {} where {} was dispatched",
      forwarded.request_name(),
      type_name::<C>()
    ),
  }
}

struct AnyCommandShim(Arc<dyn AnyCommandBehavior>);

impl<C: Command> CommandBehavior<C> for AnyCommandShim {
  fn handle(&self, command: &C, next: &Next<'_, C, ()>) -> Outcome {
    let erased = ErasedRequest::new(command);
    let bridge = |req: &dyn AnyRequest| -> Outcome {
      match req.as_any().downcast_ref::<C>() {
        Some(typed) => next(typed),
        None => Outcome::fault(forwarded_wrong_type::<C>(req)),
      }
    };
    self.0.handle(&erased, &bridge)
  }
}

struct AnyQueryShim<Q: Query> {
  inner: Arc<dyn AnyQueryBehavior<Q::Output>>,
  _request: PhantomData<fn() -> Q>,
}

impl<Q: Query> QueryBehavior<Q> for AnyQueryShim<Q> {
  fn handle(&self, query: &Q, next: &Next<'_, Q, Q::Output>) -> Outcome<Q::Output> {
    let erased = ErasedRequest::new(query);
    let bridge = |req: &dyn AnyRequest| -> Outcome<Q::Output> {
      match req.as_any().downcast_ref::<Q>() {
        Some(typed) => next(typed),
        None => Outcome::fault(forwarded_wrong_type::<Q>(req)),
      }
    };
    self.inner.handle(&erased, &bridge)
  }
}

struct AnyAsyncCommandShim(Arc<dyn AnyAsyncCommandBehavior>);

#[async_trait]
impl<C: Command> AsyncCommandBehavior<C> for AnyAsyncCommandShim {
  async fn handle(
    &self,
    command: &C,
    next: &NextAsync<C, ()>,
    cancel: &CancellationToken,
  ) -> Outcome {
    let erased = ErasedRequest::new(command);
    let bridge = crate::chain::constrain_any_next::<(), _>(|req: &dyn AnyRequest| {
      let fut: BoxFuture<'_, Outcome> = match req.as_any().downcast_ref::<C>() {
        Some(typed) => next(typed),
        None => {
          let fault = forwarded_wrong_type::<C>(req);
          Box::pin(async move { Outcome::fault(fault) })
        }
      };
      fut
    });
    self.0.handle(&erased, &bridge, cancel).await
  }
}

struct AnyAsyncQueryShim<Q: Query> {
  inner: Arc<dyn AnyAsyncQueryBehavior<Q::Output>>,
  _request: PhantomData<fn() -> Q>,
}

#[async_trait]
impl<Q: Query> AsyncQueryBehavior<Q> for AnyAsyncQueryShim<Q> {
  async fn handle(
    &self,
    query: &Q,
    next: &NextAsync<Q, Q::Output>,
    cancel: &CancellationToken,
  ) -> Outcome<Q::Output> {
    let erased = ErasedRequest::new(query);
    let bridge = crate::chain::constrain_any_next::<Q::Output, _>(|req: &dyn AnyRequest| {
      let fut: BoxFuture<'_, Outcome<Q::Output>> = match req.as_any().downcast_ref::<Q>() {
        Some(typed) => next(typed),
        None => {
          let fault = forwarded_wrong_type::<Q>(req);
          Box::pin(async move { Outcome::fault(fault) })
        }
      };
      fut
    });
    self.inner.handle(&erased, &bridge, cancel).await
  }
}
