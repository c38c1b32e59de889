// courier/examples/basic_dispatch.rs

use courier::{
  CommandHandler, Fault, Mediator, Outcome, Query, QueryHandler, Registry,
};
use std::sync::Arc;
use tracing::info;

// 1. Define request types: a command carries no payload, a query declares one.
struct CreateProfile {
  username: String,
}
impl courier::Command for CreateProfile {}

struct ProfileGreeting {
  username: String,
}
impl Query for ProfileGreeting {
  type Output = String;
}

// 2. Define handlers, one per request type.
struct CreateProfileHandler;

impl CommandHandler<CreateProfile> for CreateProfileHandler {
  fn handle(&self, command: &CreateProfile) -> Outcome {
    if command.username.is_empty() {
      return Outcome::fault(Fault::domain("validation", "username must not be empty"));
    }
    info!(username = %command.username, "profile created");
    Outcome::success()
  }
}

struct ProfileGreetingHandler;

impl QueryHandler<ProfileGreeting> for ProfileGreetingHandler {
  fn handle(&self, query: &ProfileGreeting) -> Outcome<String> {
    Outcome::ok(format!("Hello, {}", query.username))
  }
}

fn main() {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Dispatch Example ---");

  // 3. Register the handlers and dispatch through the mediator.
  let mediator = Mediator::new(Arc::new(Registry::new()));
  mediator.registry().register_command_handler(CreateProfileHandler);
  mediator.registry().register_query_handler(ProfileGreetingHandler);

  let created = mediator.send(CreateProfile {
    username: "ann".to_string(),
  });
  info!(success = created.is_success(), "create dispatched");

  let greeting = mediator.query(ProfileGreeting {
    username: "Ann".to_string(),
  });
  match greeting.value() {
    Some(text) => info!(%text, "greeting produced"),
    None => info!(faults = ?greeting.faults(), "greeting failed"),
  }

  // A failure comes back as a value, never as a panic.
  let rejected = mediator.send(CreateProfile {
    username: String::new(),
  });
  info!(faults = ?rejected.faults(), "empty username rejected");
}
