//! Dynamic values passed to properties, method arguments and return values.

use crate::error::InvocationError;
use crate::object::ObjectRef;

/// A dynamically typed value.
///
/// Managed objects exchange data with the container and with interceptors
/// through `Value`s, so that properties and methods can be described as data
/// in a [`ClassInfo`](crate::ClassInfo) instead of being discovered at runtime.
#[derive(Debug, Clone, Default)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  List(Vec<Value>),
  /// A reference to another managed object (possibly a proxy).
  Object(ObjectRef),
}

impl Value {
  /// A short name of the variant, used in type mismatch errors.
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Str(_) => "string",
      Value::List(_) => "list",
      Value::Object(_) => "object",
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_float(&self) -> Option<f64> {
    match self {
      Value::Float(f) => Some(*f),
      Value::Int(i) => Some(*i as f64),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_object(&self) -> Option<&ObjectRef> {
    match self {
      Value::Object(o) => Some(o),
      _ => None,
    }
  }

  /// Consumes the value as a string, failing with a type mismatch otherwise.
  pub fn into_string(self) -> Result<String, InvocationError> {
    match self {
      Value::Str(s) => Ok(s),
      other => Err(mismatch("string", &other)),
    }
  }

  pub fn into_int(self) -> Result<i64, InvocationError> {
    self.as_int().ok_or_else(|| mismatch("int", &self))
  }

  pub fn into_bool(self) -> Result<bool, InvocationError> {
    self.as_bool().ok_or_else(|| mismatch("bool", &self))
  }

  pub fn into_object(self) -> Result<ObjectRef, InvocationError> {
    match self {
      Value::Object(o) => Ok(o),
      other => Err(mismatch("object", &other)),
    }
  }
}

fn mismatch(expected: &'static str, found: &Value) -> InvocationError {
  InvocationError::TypeMismatch {
    expected,
    found: found.type_name(),
  }
}

// Objects compare by identity, everything else structurally.
impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Int(a), Value::Int(b)) => a == b,
      (Value::Float(a), Value::Float(b)) => a == b,
      (Value::Str(a), Value::Str(b)) => a == b,
      (Value::List(a), Value::List(b)) => a == b,
      (Value::Object(a), Value::Object(b)) => a == b,
      _ => false,
    }
  }
}

impl From<()> for Value {
  fn from(_: ()) -> Self {
    Value::Null
  }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self {
    Value::Bool(v)
  }
}

impl From<i32> for Value {
  fn from(v: i32) -> Self {
    Value::Int(v as i64)
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self {
    Value::Int(v)
  }
}

impl From<usize> for Value {
  fn from(v: usize) -> Self {
    Value::Int(v as i64)
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Value::Float(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Value::Str(v.to_owned())
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Value::Str(v)
  }
}

impl From<ObjectRef> for Value {
  fn from(v: ObjectRef) -> Self {
    Value::Object(v)
  }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(v: Vec<T>) -> Self {
    Value::List(v.into_iter().map(Into::into).collect())
  }
}
