//! Rule matching: which classes and methods an advisor applies to.

use crate::class::{ClassInfo, MethodInfo};
use crate::error::{Error, Result};
use regex::Regex;

/// A matching predicate over the capability registry.
///
/// The class-level check runs first and decides whether a class needs a
/// proxy at all; the method-level check then selects the intercepted methods.
pub trait Pointcut: Send + Sync {
  fn matches_class(&self, class: &ClassInfo) -> bool;

  fn matches_method(&self, method: &MethodInfo, class: &ClassInfo) -> bool;
}

/// Matches every method of every class.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyPointcut;

impl Pointcut for AnyPointcut {
  fn matches_class(&self, _: &ClassInfo) -> bool {
    true
  }

  fn matches_method(&self, _: &MethodInfo, _: &ClassInfo) -> bool {
    true
  }
}

/// A `Type.method` glob, where `*` matches any run of characters.
///
/// The type part is checked against the class name and the names of its
/// capability interfaces: `Car.*`, `*Service.get*`, `Vehicle.drive`.
#[derive(Debug, Clone)]
pub struct NamePatternPointcut {
  pattern: String,
  class: Regex,
  method: Regex,
}

impl NamePatternPointcut {
  pub fn new(pattern: &str) -> Result<Self> {
    let (class, method) = pattern.rsplit_once('.').ok_or_else(|| Error::InvalidPattern {
      pattern: pattern.to_owned(),
      reason: "expected 'Type.method'".to_owned(),
    })?;
    if class.is_empty() || method.is_empty() {
      return Err(Error::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: "type and method parts must not be empty".to_owned(),
      });
    }
    Ok(Self {
      pattern: pattern.to_owned(),
      class: glob(pattern, class)?,
      method: glob(pattern, method)?,
    })
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }
}

fn glob(pattern: &str, part: &str) -> Result<Regex> {
  let body = part
    .split('*')
    .map(regex::escape)
    .collect::<Vec<_>>()
    .join(".*");
  Regex::new(&format!("^{body}$")).map_err(|e| Error::InvalidPattern {
    pattern: pattern.to_owned(),
    reason: e.to_string(),
  })
}

impl Pointcut for NamePatternPointcut {
  fn matches_class(&self, class: &ClassInfo) -> bool {
    self.class.is_match(class.name()) || class.interfaces().iter().any(|i| self.class.is_match(&i.name))
  }

  fn matches_method(&self, method: &MethodInfo, class: &ClassInfo) -> bool {
    if !self.method.is_match(&method.name) {
      return false;
    }
    // Through an interface name, only that interface's methods are selected.
    self.class.is_match(class.name())
      || class
        .interfaces()
        .iter()
        .any(|i| self.class.is_match(&i.name) && i.methods.contains(&method.name))
  }
}

/// A pointcut built from two closures.
pub struct FnPointcut<C, M> {
  class: C,
  method: M,
}

impl<C, M> FnPointcut<C, M>
where
  C: Fn(&ClassInfo) -> bool + Send + Sync,
  M: Fn(&MethodInfo, &ClassInfo) -> bool + Send + Sync,
{
  pub fn new(class: C, method: M) -> Self {
    Self { class, method }
  }
}

impl<C, M> Pointcut for FnPointcut<C, M>
where
  C: Fn(&ClassInfo) -> bool + Send + Sync,
  M: Fn(&MethodInfo, &ClassInfo) -> bool + Send + Sync,
{
  fn matches_class(&self, class: &ClassInfo) -> bool {
    (self.class)(class)
  }

  fn matches_method(&self, method: &MethodInfo, class: &ClassInfo) -> bool {
    (self.method)(method, class)
  }
}
