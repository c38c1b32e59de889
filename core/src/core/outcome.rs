// courier/src/core/outcome.rs

//! Defines `Outcome<T>`, the uniform result value every handler and pipeline
//! behavior produces and consumes.
//!
//! An outcome is an immutable value object scoped to a single dispatch call.
//! Success is never stored: an outcome is successful if and only if its fault
//! collection is empty. A `Outcome<T>` additionally carries an optional
//! payload, present exactly when the public constructors produced a success.

use crate::error::Fault;

/// The uniform success-or-faults value returned from every dispatch.
///
/// `Outcome` (the `()` default) is what command handlers return; query
/// handlers return `Outcome<R>` with their declared payload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T = ()> {
  value: Option<T>,
  faults: Vec<Fault>,
}

impl<T> Outcome<T> {
  /// A successful outcome carrying a payload.
  pub fn ok(value: T) -> Self {
    Self {
      value: Some(value),
      faults: Vec::new(),
    }
  }

  /// A failure outcome carrying exactly one fault.
  ///
  /// The fault is attached to the returned value; `is_success()` on the
  /// result is always false.
  pub fn fault(fault: Fault) -> Self {
    Self {
      value: None,
      faults: vec![fault],
    }
  }

  /// A failure outcome from a non-empty fault collection.
  ///
  /// # Panics
  ///
  /// Panics if `faults` is empty. A "failure" with no faults would report
  /// itself successful, which is a programmer error, not a dispatchable
  /// state.
  pub fn from_faults(faults: Vec<Fault>) -> Self {
    if faults.is_empty() {
      panic!("courier setup error: Outcome::from_faults requires at least one fault");
    }
    Self { value: None, faults }
  }

  /// True if and only if the fault collection is empty. Computed, never stored.
  pub fn is_success(&self) -> bool {
    self.faults.is_empty()
  }

  /// The payload, if one was attached. Meaningless when `is_success()` is false.
  pub fn value(&self) -> Option<&T> {
    self.value.as_ref()
  }

  /// Consumes the outcome, returning the payload if one was attached.
  pub fn into_value(self) -> Option<T> {
    self.value
  }

  /// The faults attached to this outcome, in the order they were attached.
  pub fn faults(&self) -> &[Fault] {
    &self.faults
  }

  /// Consumes the outcome, returning its fault collection.
  pub fn into_faults(self) -> Vec<Fault> {
    self.faults
  }

  /// Returns this outcome with one more fault appended. Intended for
  /// pipeline behaviors annotating a downstream failure with context;
  /// the payload, if any, is dropped since the result is now a failure.
  pub fn with_fault(self, fault: Fault) -> Self {
    let mut faults = self.faults;
    faults.push(fault);
    Self { value: None, faults }
  }

  /// Maps the payload, preserving the fault collection untouched.
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
    Outcome {
      value: self.value.map(f),
      faults: self.faults,
    }
  }
}

impl Outcome<()> {
  /// A successful outcome with no payload, the bare-command success form.
  pub fn success() -> Self {
    Self::ok(())
  }
}

impl<T> From<Fault> for Outcome<T> {
  fn from(fault: Fault) -> Self {
    Outcome::fault(fault)
  }
}
