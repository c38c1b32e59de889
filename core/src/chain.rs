// courier/src/chain.rs

//! Builds the composed call chain: a resolved handler wrapped in its ordered
//! pipeline behaviors, first-registered behavior outermost.
//!
//! Construction starts from a terminal callable that invokes the handler,
//! then walks the behavior list in reverse registration order, wrapping each
//! previously built callable as the `next` of the current behavior. Walking
//! forward instead makes behaviors execute in reverse registration order,
//! which is an observable ordering defect covered by the dispatch tests.
//!
//! Chains are rebuilt on every dispatch call and never memoized, so a
//! registry answer that changes between calls is picked up on the next one.
//! The command and query paths share these builders; a command chain is the
//! `R = ()` instantiation.

use crate::core::behavior::{BoxFuture, NextAsync};
use crate::core::outcome::Outcome;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Terminal callable of a synchronous chain: invokes the handler.
pub(crate) type SyncTerminal<Req, R> = Arc<dyn Fn(&Req) -> Outcome<R> + Send + Sync>;

/// One synchronous behavior in closure form.
pub(crate) type SyncLayer<Req, R> =
  Arc<dyn Fn(&Req, &dyn Fn(&Req) -> Outcome<R>) -> Outcome<R> + Send + Sync>;

/// Terminal callable of an asynchronous chain. The returned future borrows
/// only the request; the handler and token travel as owned clones.
pub(crate) type AsyncTerminal<Req, R> =
  Arc<dyn for<'r> Fn(&'r Req, CancellationToken) -> BoxFuture<'r, Outcome<R>> + Send + Sync>;

/// One asynchronous behavior in closure form.
pub(crate) type AsyncLayer<Req, R> = Arc<
  dyn for<'r> Fn(&'r Req, &'r NextAsync<Req, R>, CancellationToken) -> BoxFuture<'r, Outcome<R>>
    + Send
    + Sync,
>;

/// The fully composed asynchronous chain.
pub(crate) type AsyncChain<Req, R> =
  Arc<dyn for<'r> Fn(&'r Req) -> BoxFuture<'r, Outcome<R>> + Send + Sync>;

/// Identity helpers that pin closure inference to the higher-ranked
/// signatures the chain types require; without them rustc tends to infer a
/// single concrete request lifetime and reject the coercion to `dyn Fn`.
pub(crate) fn constrain_next<Req: ?Sized, R, F>(f: F) -> F
where
  F: for<'r> Fn(&'r Req) -> BoxFuture<'r, Outcome<R>>,
{
  f
}

/// Like [`constrain_next`], but quantified directly over `&'r dyn AnyRequest`
/// so the trait-object lifetime is the higher-ranked `'r` rather than the
/// `'static` that a `Req = dyn AnyRequest` substitution would pin it to.
pub(crate) fn constrain_any_next<R, F>(f: F) -> F
where
  F: for<'r> Fn(&'r dyn crate::core::request::AnyRequest) -> BoxFuture<'r, Outcome<R>>,
{
  f
}

pub(crate) fn constrain_terminal<Req, R, F>(f: F) -> F
where
  F: for<'r> Fn(&'r Req, CancellationToken) -> BoxFuture<'r, Outcome<R>>,
{
  f
}

pub(crate) fn constrain_layer<Req, R, F>(f: F) -> F
where
  F: for<'r> Fn(&'r Req, &'r NextAsync<Req, R>, CancellationToken) -> BoxFuture<'r, Outcome<R>>,
{
  f
}

/// Composes a synchronous chain. `layers` is in registration order; the
/// reverse walk leaves `layers[0]` as the outermost call.
pub(crate) fn build_sync<Req, R>(
  terminal: SyncTerminal<Req, R>,
  layers: Vec<SyncLayer<Req, R>>,
) -> Box<dyn Fn(&Req) -> Outcome<R> + Send + Sync>
where
  Req: Send + Sync + 'static,
  R: 'static,
{
  let mut chain: Box<dyn Fn(&Req) -> Outcome<R> + Send + Sync> =
    Box::new(move |req| terminal(req));

  for layer in layers.into_iter().rev() {
    let next = chain;
    chain = Box::new(move |req| layer(req, &|r| next(r)));
  }

  chain
}

/// Composes an asynchronous chain. Every layer receives the same request
/// borrow and a clone of the cancellation token; execution is strictly
/// sequential, each layer fully inside the previous layer's call to `next`.
pub(crate) fn build_async<Req, R>(
  terminal: AsyncTerminal<Req, R>,
  layers: Vec<AsyncLayer<Req, R>>,
  cancel: CancellationToken,
) -> AsyncChain<Req, R>
where
  Req: Send + Sync + 'static,
  R: Send + 'static,
{
  let mut chain: AsyncChain<Req, R> = {
    let token = cancel.clone();
    Arc::new(constrain_next::<Req, R, _>(move |req: &Req| terminal(req, token.clone())))
  };

  for layer in layers.into_iter().rev() {
    let next = chain;
    let token = cancel.clone();
    chain = Arc::new(constrain_next::<Req, R, _>(move |req: &Req| {
      let next = Arc::clone(&next);
      let layer = Arc::clone(&layer);
      let token = token.clone();
      let fut: BoxFuture<'_, Outcome<R>> = Box::pin(async move {
        let next_fn = constrain_next::<Req, R, _>(move |r: &Req| next(r));
        layer(req, &next_fn, token).await
      });
      fut
    }));
  }

  chain
}
