// greeter_app/src/requests.rs

//! The application's request types: what can be asked of the mediator.

use courier::{Command, Query};

/// Record that `name` visited. Fire-and-forget.
pub struct RecordVisit {
  pub name: String,
}
impl Command for RecordVisit {}

/// Produce a greeting line for `name`.
pub struct Greet {
  pub name: String,
}
impl Query for Greet {
  type Output = String;
}

/// How many visits `name` has recorded so far.
pub struct LookupVisitCount {
  pub name: String,
}
impl Query for LookupVisitCount {
  type Output = u64;
}

/// Clear the visit log. Models a slow maintenance operation.
pub struct FlushVisits;
impl Command for FlushVisits {}
