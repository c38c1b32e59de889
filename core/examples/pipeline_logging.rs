// courier/examples/pipeline_logging.rs

use async_trait::async_trait;
use courier::{
  AnyNextAsync, AnyRequest, AsyncCommandHandler, AsyncQueryBehavior, AsyncQueryHandler,
  CancellationToken, Mediator, NextAsync, Outcome, Query, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

struct WarmCache;
impl courier::Command for WarmCache {}

struct LookupScore {
  player: String,
}
impl Query for LookupScore {
  type Output = u32;
}

struct WarmCacheHandler;

#[async_trait]
impl AsyncCommandHandler<WarmCache> for WarmCacheHandler {
  async fn handle(&self, _command: &WarmCache, _cancel: &CancellationToken) -> Outcome {
    tokio::time::sleep(Duration::from_millis(10)).await;
    Outcome::success()
  }
}

struct LookupScoreHandler;

#[async_trait]
impl AsyncQueryHandler<LookupScore> for LookupScoreHandler {
  async fn handle(&self, query: &LookupScore, _cancel: &CancellationToken) -> Outcome<u32> {
    Outcome::ok(query.player.len() as u32 * 100)
  }
}

/// Times every dispatch of one concrete query type.
struct TimingBehavior;

#[async_trait]
impl AsyncQueryBehavior<LookupScore> for TimingBehavior {
  async fn handle(
    &self,
    query: &LookupScore,
    next: &NextAsync<LookupScore, u32>,
    _cancel: &CancellationToken,
  ) -> Outcome<u32> {
    let start = Instant::now();
    let outcome = next(query).await;
    info!(elapsed = ?start.elapsed(), player = %query.player, "score lookup timed");
    outcome
  }
}

/// Logs every u32-returning query, whatever its concrete type.
struct AuditBehavior;

#[async_trait]
impl courier::AnyAsyncQueryBehavior<u32> for AuditBehavior {
  async fn handle(
    &self,
    query: &dyn AnyRequest,
    next: &AnyNextAsync<u32>,
    _cancel: &CancellationToken,
  ) -> Outcome<u32> {
    info!(request = query.request_name(), "audit: dispatch starting");
    let outcome = next(query).await;
    info!(
      request = query.request_name(),
      success = outcome.is_success(),
      "audit: dispatch finished"
    );
    outcome
  }
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Pipeline Logging Example ---");

  let mediator = Mediator::new(Arc::new(Registry::new()));
  mediator.registry().register_async_command_handler(WarmCacheHandler);
  mediator.registry().register_async_query_handler(LookupScoreHandler);
  // Registration order decides wrapping order: the audit layer registered
  // first wraps the timing layer.
  mediator.registry().register_any_async_query_behavior::<u32>(AuditBehavior);
  mediator.registry().register_async_query_behavior::<LookupScore>(TimingBehavior);

  let warmed = mediator.send_async(WarmCache, CancellationToken::new()).await;
  info!(success = warmed.is_success(), "cache warmed");

  let score = mediator
    .query_async(
      LookupScore {
        player: "ann".to_string(),
      },
      CancellationToken::new(),
    )
    .await;
  info!(score = ?score.value(), "lookup complete");

  // Cancel an in-flight dispatch; the outcome reports it as a fault.
  let token = CancellationToken::new();
  let canceller = token.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(1)).await;
    canceller.cancel();
  });
  let cancelled = mediator.send_async(WarmCache, token).await;
  info!(faults = ?cancelled.faults(), "cancelled dispatch");
}
