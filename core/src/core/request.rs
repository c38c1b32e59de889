// courier/src/core/request.rs

//! The two request shapes and the type-erased request view handed to
//! shape-level pipeline behaviors.

use std::any::Any;

/// A fire-and-forget request: identifies an operation with no declared
/// response payload. Its handler returns a bare [`Outcome`](crate::Outcome).
///
/// Each concrete command type is the sole key for resolving its handler.
pub trait Command: Send + Sync + 'static {}

/// A value-returning request: declares the payload type its handler
/// produces inside an [`Outcome<Self::Output>`](crate::Outcome).
pub trait Query: Send + Sync + 'static {
  type Output: Send + 'static;
}

/// Type-erased, read-only view of a request, given to behaviors registered
/// against a whole shape ("any command", "any query returning R") rather
/// than one concrete type.
///
/// Only the engine wraps requests into this view; behavior authors receive
/// it, may log `request_name()`, and may `downcast_ref` through `as_any()`
/// when they need the concrete value.
pub trait AnyRequest: Send + Sync {
  fn as_any(&self) -> &dyn Any;

  /// The concrete request type's name, for diagnostics.
  fn request_name(&self) -> &'static str;
}

/// The engine-side [`AnyRequest`] wrapper around a borrowed concrete request.
pub(crate) struct ErasedRequest<'a, T: Any + Send + Sync> {
  inner: &'a T,
}

impl<'a, T: Any + Send + Sync> ErasedRequest<'a, T> {
  pub(crate) fn new(inner: &'a T) -> Self {
    Self { inner }
  }
}

impl<T: Any + Send + Sync> AnyRequest for ErasedRequest<'_, T> {
  fn as_any(&self) -> &dyn Any {
    self.inner
  }

  fn request_name(&self) -> &'static str {
    std::any::type_name::<T>()
  }
}
