// tests/async_dispatch_tests.rs
mod common;

use common::*;
use courier::{CancellationToken, Family, Fault, Mediator, Registry};
use std::sync::Arc;
use std::time::Duration;

fn mediator() -> Mediator {
  Mediator::new(Arc::new(Registry::new()))
}

#[tokio::test]
async fn test_async_command_dispatch_through_behaviors() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();
  mediator
    .registry()
    .register_async_command_handler(AsyncPingHandler { trace: trace.clone() });
  mediator
    .registry()
    .register_async_command_behavior::<Ping>(Marker { label: "P1", trace: trace.clone() });
  mediator
    .registry()
    .register_async_command_behavior::<Ping>(Marker { label: "P2", trace: trace.clone() });

  let outcome = mediator.send_async(Ping, CancellationToken::new()).await;

  assert!(outcome.is_success());
  assert_eq!(
    recorded(&trace),
    vec!["P1-before", "P2-before", "H", "P2-after", "P1-after"]
  );
}

#[tokio::test]
async fn test_async_query_returns_payload() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();
  mediator
    .registry()
    .register_async_query_handler(AsyncGreetHandler { trace: trace.clone() });
  mediator
    .registry()
    .register_async_query_behavior::<Greet>(Marker { label: "P1", trace: trace.clone() });

  let outcome = mediator
    .query_async(Greet { name: "Ann".to_string() }, CancellationToken::new())
    .await;

  assert!(outcome.is_success());
  assert_eq!(outcome.value(), Some(&"Hello, Ann".to_string()));
  assert_eq!(recorded(&trace), vec!["P1-before", "H", "P1-after"]);
}

#[tokio::test]
async fn test_pre_cancelled_token_yields_cancelled_fault() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();
  mediator
    .registry()
    .register_async_command_handler(AsyncPingHandler { trace: trace.clone() });

  let token = CancellationToken::new();
  token.cancel();
  let outcome = mediator.send_async(Ping, token).await;

  assert!(!outcome.is_success());
  assert_eq!(outcome.faults(), &[Fault::Cancelled]);
  assert!(recorded(&trace).is_empty());
}

#[tokio::test]
async fn test_cancellation_interrupts_in_flight_dispatch() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();
  mediator.registry().register_async_command_handler(SleepyPingHandler {
    trace: trace.clone(),
    delay: Duration::from_secs(30),
  });

  let token = CancellationToken::new();
  let canceller = token.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(20)).await;
    canceller.cancel();
  });

  let outcome = mediator.send_async(Ping, token).await;

  assert!(!outcome.is_success());
  assert_eq!(outcome.faults(), &[Fault::Cancelled]);
  // The handler was dropped mid-sleep and never reached its marker.
  assert!(recorded(&trace).is_empty());
}

#[tokio::test]
async fn test_async_behavior_retries_by_calling_next_again() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();

  struct FlakyAsyncPingHandler {
    trace: Trace,
    calls: Arc<std::sync::atomic::AtomicUsize>,
  }

  #[async_trait::async_trait]
  impl courier::AsyncCommandHandler<Ping> for FlakyAsyncPingHandler {
    async fn handle(&self, _command: &Ping, _cancel: &CancellationToken) -> courier::Outcome {
      let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
      record(&self.trace, format!("H{call}"));
      if call == 0 {
        courier::Outcome::fault(Fault::domain("test", "transient failure"))
      } else {
        courier::Outcome::success()
      }
    }
  }

  mediator.registry().register_async_command_handler(FlakyAsyncPingHandler {
    trace: trace.clone(),
    calls: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
  });
  mediator
    .registry()
    .register_async_command_behavior::<Ping>(RetryOnce { trace: trace.clone() });

  let outcome = mediator.send_async(Ping, CancellationToken::new()).await;

  assert!(outcome.is_success());
  assert_eq!(recorded(&trace), vec!["H0", "retry", "H1"]);
}

#[tokio::test]
async fn test_async_short_circuit_skips_handler() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();
  mediator
    .registry()
    .register_async_command_handler(AsyncPingHandler { trace: trace.clone() });
  mediator
    .registry()
    .register_async_command_behavior::<Ping>(ShortCircuit { trace: trace.clone() });

  let outcome = mediator.send_async(Ping, CancellationToken::new()).await;

  expect_single_domain_fault(&outcome, "guard");
  assert_eq!(recorded(&trace), vec!["SC"]);
}

#[tokio::test]
async fn test_shape_level_async_behaviors_interleave_with_typed() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();
  mediator
    .registry()
    .register_async_command_handler(AsyncPingHandler { trace: trace.clone() });
  mediator
    .registry()
    .register_any_async_command_behavior(Marker { label: "G1", trace: trace.clone() });
  mediator
    .registry()
    .register_async_command_behavior::<Ping>(Marker { label: "T1", trace: trace.clone() });

  let outcome = mediator.send_async(Ping, CancellationToken::new()).await;

  assert!(outcome.is_success());
  assert_eq!(
    recorded(&trace),
    vec!["G1-before", "T1-before", "H", "T1-after", "G1-after"]
  );
}

#[tokio::test]
async fn test_shape_level_async_query_behavior_keyed_by_payload() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();
  mediator
    .registry()
    .register_async_query_handler(AsyncGreetHandler { trace: trace.clone() });
  mediator
    .registry()
    .register_any_async_query_behavior::<String>(Marker { label: "G", trace: trace.clone() });

  let outcome = mediator
    .query_async(Greet { name: "Ann".to_string() }, CancellationToken::new())
    .await;

  assert!(outcome.is_success());
  assert_eq!(recorded(&trace), vec!["G-before", "H", "G-after"]);
}

#[tokio::test]
async fn test_families_do_not_fall_back() {
  setup_tracing();
  let mediator = mediator();
  let trace = new_trace();
  // Only the sync family has a handler for Ping.
  mediator
    .registry()
    .register_command_handler(PingHandler { trace: trace.clone() });

  let outcome = mediator.send_async(Ping, CancellationToken::new()).await;

  assert!(!outcome.is_success());
  match outcome.faults() {
    [Fault::HandlerNotFound { family, .. }] => assert_eq!(*family, Family::AsyncCommand),
    other => panic!("expected HandlerNotFound, got {other:?}"),
  }
  assert!(recorded(&trace).is_empty());
}
