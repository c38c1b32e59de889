// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use courier::{
  AnyCommandBehavior, AnyNext, AnyNextAsync, AnyQueryBehavior, AnyRequest, AsyncCommandBehavior,
  AsyncCommandHandler, AsyncQueryBehavior, AsyncQueryHandler, CancellationToken, CommandBehavior,
  CommandHandler, Fault, Next, NextAsync, Outcome, Query, QueryBehavior, QueryHandler,
};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Shared execution trace ---
//
// Handlers and behaviors append markers here so tests can assert the exact
// wrapping order ("P1-before", "P2-before", "H", "P2-after", "P1-after").
pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn new_trace() -> Trace {
  Arc::new(Mutex::new(Vec::new()))
}

pub fn record(trace: &Trace, entry: impl Into<String>) {
  trace.lock().push(entry.into());
}

pub fn recorded(trace: &Trace) -> Vec<String> {
  trace.lock().clone()
}

// --- Common Request Types ---

pub struct Ping;
impl courier::Command for Ping {}

pub struct Greet {
  pub name: String,
}
impl Query for Greet {
  type Output = String;
}

pub struct Sum {
  pub a: i64,
  pub b: i64,
}
impl Query for Sum {
  type Output = i64;
}

// --- Common Handlers ---

pub struct PingHandler {
  pub trace: Trace,
}

impl CommandHandler<Ping> for PingHandler {
  fn handle(&self, _command: &Ping) -> Outcome {
    record(&self.trace, "H");
    tracing::debug!(target: "test_handlers", "ping handled");
    Outcome::success()
  }
}

pub struct FailingPingHandler {
  pub trace: Trace,
}

impl CommandHandler<Ping> for FailingPingHandler {
  fn handle(&self, _command: &Ping) -> Outcome {
    record(&self.trace, "H-fail");
    Outcome::fault(Fault::domain("test", "ping handler failed"))
  }
}

/// Fails on the first call, succeeds afterwards. For retry tests.
pub struct FlakyPingHandler {
  pub trace: Trace,
  pub calls: Arc<AtomicUsize>,
}

impl CommandHandler<Ping> for FlakyPingHandler {
  fn handle(&self, _command: &Ping) -> Outcome {
    let call = self.calls.fetch_add(1, Ordering::SeqCst);
    record(&self.trace, format!("H{call}"));
    if call == 0 {
      Outcome::fault(Fault::domain("test", "transient failure"))
    } else {
      Outcome::success()
    }
  }
}

pub struct GreetHandler {
  pub trace: Trace,
}

impl QueryHandler<Greet> for GreetHandler {
  fn handle(&self, query: &Greet) -> Outcome<String> {
    record(&self.trace, "H");
    Outcome::ok(format!("Hello, {}", query.name))
  }
}

pub struct FailingGreetHandler;

impl QueryHandler<Greet> for FailingGreetHandler {
  fn handle(&self, _query: &Greet) -> Outcome<String> {
    Outcome::fault(Fault::domain("test", "greeting unavailable"))
  }
}

pub struct SumHandler;

impl QueryHandler<Sum> for SumHandler {
  fn handle(&self, query: &Sum) -> Outcome<i64> {
    Outcome::ok(query.a + query.b)
  }
}

// --- Common Async Handlers ---

pub struct AsyncPingHandler {
  pub trace: Trace,
}

#[async_trait]
impl AsyncCommandHandler<Ping> for AsyncPingHandler {
  async fn handle(&self, _command: &Ping, _cancel: &CancellationToken) -> Outcome {
    record(&self.trace, "H");
    Outcome::success()
  }
}

/// Sleeps before answering, without polling the token itself; cancellation
/// tests rely on the dispatcher racing the whole chain.
pub struct SleepyPingHandler {
  pub trace: Trace,
  pub delay: std::time::Duration,
}

#[async_trait]
impl AsyncCommandHandler<Ping> for SleepyPingHandler {
  async fn handle(&self, _command: &Ping, _cancel: &CancellationToken) -> Outcome {
    tokio::time::sleep(self.delay).await;
    record(&self.trace, "H");
    Outcome::success()
  }
}

pub struct AsyncGreetHandler {
  pub trace: Trace,
}

#[async_trait]
impl AsyncQueryHandler<Greet> for AsyncGreetHandler {
  async fn handle(&self, query: &Greet, _cancel: &CancellationToken) -> Outcome<String> {
    record(&self.trace, "H");
    Outcome::ok(format!("Hello, {}", query.name))
  }
}

// --- Common Behaviors ---

/// Records "{label}-before", calls `next`, records "{label}-after". One
/// struct implements every behavior contract so ordering tests can mix
/// typed and shape-level registrations of the same fixture.
pub struct Marker {
  pub label: &'static str,
  pub trace: Trace,
}

impl<C: courier::Command> CommandBehavior<C> for Marker {
  fn handle(&self, command: &C, next: &Next<'_, C, ()>) -> Outcome {
    record(&self.trace, format!("{}-before", self.label));
    let outcome = next(command);
    record(&self.trace, format!("{}-after", self.label));
    outcome
  }
}

impl<Q: Query> QueryBehavior<Q> for Marker {
  fn handle(&self, query: &Q, next: &Next<'_, Q, Q::Output>) -> Outcome<Q::Output> {
    record(&self.trace, format!("{}-before", self.label));
    let outcome = next(query);
    record(&self.trace, format!("{}-after", self.label));
    outcome
  }
}

#[async_trait]
impl<C: courier::Command> AsyncCommandBehavior<C> for Marker {
  async fn handle(
    &self,
    command: &C,
    next: &NextAsync<C, ()>,
    _cancel: &CancellationToken,
  ) -> Outcome {
    record(&self.trace, format!("{}-before", self.label));
    let outcome = next(command).await;
    record(&self.trace, format!("{}-after", self.label));
    outcome
  }
}

#[async_trait]
impl<Q: Query> AsyncQueryBehavior<Q> for Marker {
  async fn handle(
    &self,
    query: &Q,
    next: &NextAsync<Q, Q::Output>,
    _cancel: &CancellationToken,
  ) -> Outcome<Q::Output> {
    record(&self.trace, format!("{}-before", self.label));
    let outcome = next(query).await;
    record(&self.trace, format!("{}-after", self.label));
    outcome
  }
}

impl AnyCommandBehavior for Marker {
  fn handle(&self, command: &dyn AnyRequest, next: &AnyNext<'_, ()>) -> Outcome {
    record(&self.trace, format!("{}-before", self.label));
    let outcome = next(command);
    record(&self.trace, format!("{}-after", self.label));
    outcome
  }
}

impl<R> AnyQueryBehavior<R> for Marker {
  fn handle(&self, query: &dyn AnyRequest, next: &AnyNext<'_, R>) -> Outcome<R> {
    record(&self.trace, format!("{}-before", self.label));
    let outcome = next(query);
    record(&self.trace, format!("{}-after", self.label));
    outcome
  }
}

#[async_trait]
impl courier::AnyAsyncCommandBehavior for Marker {
  async fn handle(
    &self,
    command: &dyn AnyRequest,
    next: &AnyNextAsync<()>,
    _cancel: &CancellationToken,
  ) -> Outcome {
    record(&self.trace, format!("{}-before", self.label));
    let outcome = next(command).await;
    record(&self.trace, format!("{}-after", self.label));
    outcome
  }
}

#[async_trait]
impl<R: Send + 'static> courier::AnyAsyncQueryBehavior<R> for Marker {
  async fn handle(
    &self,
    query: &dyn AnyRequest,
    next: &AnyNextAsync<R>,
    _cancel: &CancellationToken,
  ) -> Outcome<R> {
    record(&self.trace, format!("{}-before", self.label));
    let outcome = next(query).await;
    record(&self.trace, format!("{}-after", self.label));
    outcome
  }
}

/// Never calls `next`; answers with a fault directly.
pub struct ShortCircuit {
  pub trace: Trace,
}

impl<C: courier::Command> CommandBehavior<C> for ShortCircuit {
  fn handle(&self, _command: &C, _next: &Next<'_, C, ()>) -> Outcome {
    record(&self.trace, "SC");
    Outcome::fault(Fault::domain("guard", "rejected before handler"))
  }
}

#[async_trait]
impl<C: courier::Command> AsyncCommandBehavior<C> for ShortCircuit {
  async fn handle(
    &self,
    _command: &C,
    _next: &NextAsync<C, ()>,
    _cancel: &CancellationToken,
  ) -> Outcome {
    record(&self.trace, "SC");
    Outcome::fault(Fault::domain("guard", "rejected before handler"))
  }
}

/// Calls `next` again, once, when the first attempt fails.
pub struct RetryOnce {
  pub trace: Trace,
}

impl<C: courier::Command> CommandBehavior<C> for RetryOnce {
  fn handle(&self, command: &C, next: &Next<'_, C, ()>) -> Outcome {
    let first = next(command);
    if first.is_success() {
      return first;
    }
    record(&self.trace, "retry");
    next(command)
  }
}

#[async_trait]
impl<C: courier::Command> AsyncCommandBehavior<C> for RetryOnce {
  async fn handle(
    &self,
    command: &C,
    next: &NextAsync<C, ()>,
    _cancel: &CancellationToken,
  ) -> Outcome {
    let first = next(command).await;
    if first.is_success() {
      return first;
    }
    record(&self.trace, "retry");
    next(command).await
  }
}

/// Replaces a downstream greeting failure with a fallback answer.
pub struct RecoverGreet;

impl QueryBehavior<Greet> for RecoverGreet {
  fn handle(&self, query: &Greet, next: &Next<'_, Greet, String>) -> Outcome<String> {
    let outcome = next(query);
    if outcome.is_success() {
      outcome
    } else {
      Outcome::ok("Hello, stranger".to_string())
    }
  }
}

/// Appends a context fault to any downstream failure.
pub struct Annotate;

impl<C: courier::Command> CommandBehavior<C> for Annotate {
  fn handle(&self, command: &C, next: &Next<'_, C, ()>) -> Outcome {
    let outcome = next(command);
    if outcome.is_success() {
      outcome
    } else {
      outcome.with_fault(Fault::domain("context", "while dispatching"))
    }
  }
}

// --- Contract-breaking fixtures ---

/// A request value of the wrong concrete type, for forwarding through a
/// shape-level behavior's `next`.
pub struct Imposter;

impl AnyRequest for Imposter {
  fn as_any(&self) -> &dyn Any {
    self
  }

  fn request_name(&self) -> &'static str {
    "Imposter"
  }
}

/// Shape-level behavior that forwards a different request to `next`.
pub struct ForwardImposter;

impl AnyCommandBehavior for ForwardImposter {
  fn handle(&self, _command: &dyn AnyRequest, next: &AnyNext<'_, ()>) -> Outcome {
    next(&Imposter)
  }
}

// --- Assertion helpers ---

pub fn expect_single_domain_fault(outcome: &Outcome, kind: &str) {
  assert!(!outcome.is_success());
  match outcome.faults() {
    [Fault::Domain { kind: k, .. }] => assert_eq!(k, kind),
    other => panic!("expected one domain fault of kind {kind:?}, got {other:?}"),
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
