// greeter_app/src/main.rs

// Declare modules for the application
mod behaviors;
mod config;
mod handlers;
mod requests;
mod state;

use crate::config::AppConfig;
use crate::requests::{FlushVisits, Greet, LookupVisitCount, RecordVisit};
use crate::state::AppState;

use courier::{CancellationToken, Mediator, Registry};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn register_all(mediator: &Mediator, state: &AppState) {
  let registry = mediator.registry();

  // Shape-level logging first, so it wraps everything else.
  registry.register_any_command_behavior(behaviors::CommandLogging);
  registry.register_any_async_command_behavior(behaviors::CommandLogging);
  registry.register_query_behavior::<Greet>(behaviors::GreetGuard {
    blocked: vec!["Mallory".to_string()],
  });

  registry.register_command_handler(handlers::RecordVisitHandler { state: state.clone() });
  registry.register_query_handler(handlers::GreetHandler { state: state.clone() });
  registry.register_async_query_handler(handlers::LookupVisitCountHandler { state: state.clone() });
  registry.register_async_command_handler(handlers::FlushVisitsHandler { state: state.clone() });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting greeter demo...");

  let config = AppConfig::from_env()?;
  let state = AppState::new(config);

  let mediator = Mediator::new(Arc::new(Registry::new()));
  register_all(&mediator, &state);
  tracing::info!("Handlers and behaviors registered.");

  // Sync commands and queries.
  for name in ["Ann", "Ben", "Ann"] {
    let outcome = mediator.send(RecordVisit { name: name.to_string() });
    if !outcome.is_success() {
      tracing::warn!(faults = ?outcome.faults(), "visit rejected");
    }
  }

  let greeting = mediator.query(Greet { name: "Ann".to_string() });
  tracing::info!(greeting = ?greeting.value(), "greeted Ann");

  let blocked = mediator.query(Greet { name: "Mallory".to_string() });
  tracing::info!(faults = ?blocked.faults(), "Mallory was blocked by the guard");

  // Async query with a cancellation budget from config.
  let token = CancellationToken::new();
  let budget = Duration::from_millis(state.config.dispatch_budget_ms);
  let deadline = token.clone();
  tokio::spawn(async move {
    tokio::time::sleep(budget).await;
    deadline.cancel();
  });
  let count = mediator
    .query_async(LookupVisitCount { name: "Ann".to_string() }, token)
    .await;
  tracing::info!(count = ?count.value(), "Ann's visit count");

  // A flush cancelled mid-flight comes back as a Cancelled fault.
  let token = CancellationToken::new();
  let canceller = token.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(60)).await;
    canceller.cancel();
  });
  let flushed = mediator.send_async(FlushVisits, token).await;
  tracing::info!(
    success = flushed.is_success(),
    faults = ?flushed.faults(),
    "flush attempt one (cancelled)"
  );

  // And an uninterrupted one succeeds.
  let flushed = mediator.send_async(FlushVisits, CancellationToken::new()).await;
  tracing::info!(success = flushed.is_success(), "flush attempt two");

  Ok(())
}
