// greeter_app/src/behaviors.rs

//! Cross-cutting pipeline layers: request logging for every command, and a
//! per-type guard on greetings.

use crate::requests::Greet;
use async_trait::async_trait;
use courier::{
  AnyCommandBehavior, AnyNext, AnyNextAsync, AnyRequest, CancellationToken, Fault, Next, Outcome,
  QueryBehavior,
};
use std::time::Instant;

/// Logs every command dispatch, sync or async, with its elapsed time.
pub struct CommandLogging;

impl AnyCommandBehavior for CommandLogging {
  fn handle(&self, command: &dyn AnyRequest, next: &AnyNext<'_, ()>) -> Outcome {
    let start = Instant::now();
    let outcome = next(command);
    tracing::info!(
      request = command.request_name(),
      success = outcome.is_success(),
      elapsed = ?start.elapsed(),
      "command dispatched"
    );
    outcome
  }
}

#[async_trait]
impl courier::AnyAsyncCommandBehavior for CommandLogging {
  async fn handle(
    &self,
    command: &dyn AnyRequest,
    next: &AnyNextAsync<()>,
    _cancel: &CancellationToken,
  ) -> Outcome {
    let start = Instant::now();
    let outcome = next(command).await;
    tracing::info!(
      request = command.request_name(),
      success = outcome.is_success(),
      elapsed = ?start.elapsed(),
      "command dispatched"
    );
    outcome
  }
}

/// Rejects greetings for names the handler should never see.
pub struct GreetGuard {
  pub blocked: Vec<String>,
}

impl QueryBehavior<Greet> for GreetGuard {
  fn handle(&self, query: &Greet, next: &Next<'_, Greet, String>) -> Outcome<String> {
    if self.blocked.iter().any(|name| name == &query.name) {
      return Outcome::fault(Fault::domain("guard", format!("{} is blocked", query.name)));
    }
    next(query)
  }
}
