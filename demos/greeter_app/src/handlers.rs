// greeter_app/src/handlers.rs

//! One handler per request type, each owning a clone of the shared state.

use crate::requests::{FlushVisits, Greet, LookupVisitCount, RecordVisit};
use crate::state::AppState;
use async_trait::async_trait;
use courier::{
  AsyncCommandHandler, AsyncQueryHandler, CancellationToken, CommandHandler, Fault, Outcome,
  QueryHandler,
};
use std::time::Duration;

pub struct RecordVisitHandler {
  pub state: AppState,
}

impl CommandHandler<RecordVisit> for RecordVisitHandler {
  fn handle(&self, command: &RecordVisit) -> Outcome {
    if command.name.trim().is_empty() {
      return Outcome::fault(Fault::domain("validation", "visitor name must not be empty"));
    }
    let mut visits = self.state.visits.lock();
    *visits.entry(command.name.clone()).or_insert(0) += 1;
    tracing::info!(name = %command.name, "visit recorded");
    Outcome::success()
  }
}

pub struct GreetHandler {
  pub state: AppState,
}

impl QueryHandler<Greet> for GreetHandler {
  fn handle(&self, query: &Greet) -> Outcome<String> {
    if query.name.trim().is_empty() {
      return Outcome::fault(Fault::domain("validation", "cannot greet an empty name"));
    }
    let mut line = format!("{}, {}", self.state.config.salutation, query.name);
    if self.state.config.shout {
      line = line.to_uppercase();
    }
    Outcome::ok(line)
  }
}

pub struct LookupVisitCountHandler {
  pub state: AppState,
}

#[async_trait]
impl AsyncQueryHandler<LookupVisitCount> for LookupVisitCountHandler {
  async fn handle(&self, query: &LookupVisitCount, _cancel: &CancellationToken) -> Outcome<u64> {
    // Models a storage round-trip.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let count = self.state.visits.lock().get(&query.name).copied().unwrap_or(0);
    Outcome::ok(count)
  }
}

pub struct FlushVisitsHandler {
  pub state: AppState,
}

#[async_trait]
impl AsyncCommandHandler<FlushVisits> for FlushVisitsHandler {
  async fn handle(&self, _command: &FlushVisits, cancel: &CancellationToken) -> Outcome {
    // Deliberately slow, checking the token between stages, so the demo can
    // show both a completed flush and a cancelled one.
    for stage in 0..5u32 {
      if cancel.is_cancelled() {
        return Outcome::fault(Fault::Cancelled);
      }
      tracing::debug!(stage, "flush stage");
      tokio::time::sleep(Duration::from_millis(50)).await;
    }
    self.state.visits.lock().clear();
    tracing::info!("visit log flushed");
    Outcome::success()
  }
}
