//! Conversion of literal property values to the declared property type.

use crate::class::{PropertyInfo, PropertyKind};
use crate::error::{InvocationError, Result};
use crate::value::Value;

/// Converts a literal property value before it is written to an object.
///
/// Invoked once per literal property during population; a failure aborts
/// the creation of the object.
pub trait ValueResolver: Send + Sync {
  fn resolve(&self, value: Value, property: &PropertyInfo) -> Result<Value>;
}

/// The default resolver: scalar conversions between strings, numbers and booleans.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardValueResolver;

impl ValueResolver for StandardValueResolver {
  fn resolve(&self, value: Value, property: &PropertyInfo) -> Result<Value> {
    if property.kind.accepts(&value) {
      return Ok(value);
    }
    let converted = match (property.kind, &value) {
      (PropertyKind::Int, Value::Str(s)) => s.trim().parse().ok().map(Value::Int),
      (PropertyKind::Float, Value::Str(s)) => s.trim().parse().ok().map(Value::Float),
      (PropertyKind::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
      (PropertyKind::Bool, Value::Str(s)) => s.trim().parse().ok().map(Value::Bool),
      (PropertyKind::Str, Value::Int(i)) => Some(Value::Str(i.to_string())),
      (PropertyKind::Str, Value::Float(f)) => Some(Value::Str(f.to_string())),
      (PropertyKind::Str, Value::Bool(b)) => Some(Value::Str(b.to_string())),
      _ => None,
    };
    converted.ok_or_else(|| {
      InvocationError::TypeMismatch {
        expected: kind_name(property.kind),
        found: value.type_name(),
      }
      .into()
    })
  }
}

fn kind_name(kind: PropertyKind) -> &'static str {
  match kind {
    PropertyKind::Any => "any",
    PropertyKind::Bool => "bool",
    PropertyKind::Int => "int",
    PropertyKind::Float => "float",
    PropertyKind::Str => "string",
    PropertyKind::List => "list",
    PropertyKind::Object => "object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn prop(kind: PropertyKind) -> PropertyInfo {
    PropertyInfo {
      name: "p".into(),
      kind,
    }
  }

  #[test]
  fn strings_convert_to_scalars() {
    let r = StandardValueResolver;
    assert_eq!(r.resolve("42".into(), &prop(PropertyKind::Int)).unwrap(), Value::Int(42));
    assert_eq!(r.resolve("true".into(), &prop(PropertyKind::Bool)).unwrap(), Value::Bool(true));
    assert_eq!(r.resolve(Value::Int(2), &prop(PropertyKind::Float)).unwrap(), Value::Float(2.0));
    assert_eq!(r.resolve(Value::Int(7), &prop(PropertyKind::Str)).unwrap(), Value::from("7"));
  }

  #[test]
  fn unconvertible_values_are_rejected() {
    let err = StandardValueResolver
      .resolve("seven".into(), &prop(PropertyKind::Int))
      .unwrap_err();
    assert_eq!(err.to_string(), "type mismatch: expected int, found string");
  }
}
