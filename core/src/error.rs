// courier/src/error.rs

//! Defines `Fault`, the structured error item carried by failure outcomes,
//! and `Family`, the four independent handler resolution families.

use thiserror::Error;

/// The four dispatch families. A handler or behavior registered for one
/// family is never resolvable through another; the mediator does not fall
/// back between the sync and async forms of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
  SyncCommand,
  SyncQuery,
  AsyncCommand,
  AsyncQuery,
}

impl std::fmt::Display for Family {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Family::SyncCommand => "sync command",
      Family::SyncQuery => "sync query",
      Family::AsyncCommand => "async command",
      Family::AsyncQuery => "async query",
    };
    f.write_str(name)
  }
}

/// A single structured error carried by a failure [`Outcome`](crate::Outcome).
///
/// Faults are plain values: `Clone`, `PartialEq`, and `Eq` so callers and
/// tests can branch on them without any exception machinery. Everything the
/// engine itself can go wrong with resolves to one of these and is returned
/// inside a failure outcome, never raised across the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
  /// No handler registered for the request's concrete type in this family.
  #[error("no {family} handler registered for request type {request_type}")]
  HandlerNotFound {
    family: Family,
    request_type: &'static str,
  },

  /// More than one handler registered for the same request type and family.
  /// A registration-time configuration defect; the dispatcher still fails
  /// safely with this fault rather than silently picking one.
  #[error("multiple {family} handlers registered for request type {request_type}")]
  HandlerAmbiguous {
    family: Family,
    request_type: &'static str,
  },

  /// A pipeline behavior broke its contract, e.g. a shape-level behavior
  /// forwarded a value of the wrong concrete type to `next`.
  #[error("pipeline contract violation: {message}")]
  PipelineContract { message: String },

  /// Async dispatch observed its cancellation signal before completion.
  #[error("dispatch cancelled before completion")]
  Cancelled,

  /// A fault produced by a handler's or behavior's own logic. Passes
  /// through outer pipeline layers unchanged unless one transforms it.
  #[error("{kind}: {message}")]
  Domain { kind: String, message: String },
}

impl Fault {
  /// Builds a domain fault from a kind tag and a message.
  pub fn domain(kind: impl Into<String>, message: impl Into<String>) -> Self {
    Fault::Domain {
      kind: kind.into(),
      message: message.into(),
    }
  }
}

// Handlers that use anyhow internally can bubble errors out with `?` and
// convert at the boundary; `{:#}` keeps the whole source chain.
impl From<anyhow::Error> for Fault {
  fn from(err: anyhow::Error) -> Self {
    Fault::Domain {
      kind: "handler".to_string(),
      message: format!("{err:#}"),
    }
  }
}
