//! Error types for container operations and method invocations.

use thiserror::Error;

/// Errors raised while calling a method or writing a property on a managed object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvocationError {
  #[error("no method '{method}' on '{class}'")]
  NoSuchMethod { class: String, method: String },

  #[error("no property '{property}' on '{class}'")]
  NoSuchProperty { class: String, property: String },

  #[error("type mismatch: expected {expected}, found {found}")]
  TypeMismatch {
    expected: &'static str,
    found: &'static str,
  },

  #[error("bad arguments for '{method}': {reason}")]
  BadArguments { method: String, reason: String },

  #[error("{0}")]
  Failed(String),
}

impl InvocationError {
  /// Shorthand for a user-level failure raised from inside a method body or advice.
  pub fn failed(message: impl Into<String>) -> Self {
    InvocationError::Failed(message.into())
  }
}

/// The main error type for container operations.
#[derive(Debug, Error)]
pub enum Error {
  #[error("no object named '{name}' is defined")]
  NoSuchDescriptor { name: String },

  #[error("no object of type '{type_name}' is defined")]
  NoDescriptorOfType { type_name: String },

  #[error("expected a single object of type '{type_name}' but found {}: {candidates:?}", .candidates.len())]
  AmbiguousType {
    type_name: String,
    candidates: Vec<String>,
  },

  #[error("unresolvable circular reference: {}", .cycle.join(" -> "))]
  UnresolvableCycle { cycle: Vec<String> },

  #[error("error creating object '{name}': {source}")]
  Creation {
    name: String,
    #[source]
    source: Box<Error>,
  },

  #[error("cannot proxy '{class}': {reason}")]
  ProxyGeneration { class: String, reason: String },

  #[error("could not find an init method named '{method}' on object '{name}'")]
  InitMethodNotFound { name: String, method: String },

  #[error("object '{name}' is not a factory")]
  NotAFactory { name: String },

  #[error("an object named '{name}' is already defined")]
  DuplicateDescriptor { name: String },

  #[error("invalid pattern '{pattern}': {reason}")]
  InvalidPattern { pattern: String, reason: String },

  #[error("destroy method on object '{name}' failed: {source}")]
  Disposal {
    name: String,
    #[source]
    source: InvocationError,
  },

  #[error(transparent)]
  Invocation(#[from] InvocationError),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),
}

impl Error {
  pub(crate) fn creation(name: &str, source: Error) -> Self {
    Error::Creation {
      name: name.to_owned(),
      source: Box::new(source),
    }
  }

  /// Follows nested `Creation` errors down to the failure that started them.
  pub fn root_cause(&self) -> &Error {
    let mut current = self;
    while let Error::Creation { source, .. } = current {
      current = &**source;
    }
    current
  }
}

/// A specialized `Result` type for container operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
