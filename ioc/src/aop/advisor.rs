//! Advisors: a pointcut paired with the advice it applies, and sources of them.

use crate::aop::advice::Advice;
use crate::aop::pointcut::{NamePatternPointcut, Pointcut};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// A rule: a pointcut plus the advice applied wherever it matches.
#[derive(Clone)]
pub struct Advisor {
  name: Option<String>,
  pointcut: Arc<dyn Pointcut>,
  advice: Vec<Advice>,
}

impl Advisor {
  pub fn new(pointcut: impl Pointcut + 'static) -> Self {
    Self {
      name: None,
      pointcut: Arc::new(pointcut),
      advice: Vec::new(),
    }
  }

  /// An advisor matching a `Type.method` glob, see [`NamePatternPointcut`].
  pub fn for_pattern(pattern: &str) -> Result<Self> {
    Ok(Self::new(NamePatternPointcut::new(pattern)?))
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Appends an advice; advice runs in the order it was added.
  pub fn with(mut self, advice: Advice) -> Self {
    self.advice.push(advice);
    self
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn pointcut(&self) -> &dyn Pointcut {
    self.pointcut.as_ref()
  }

  pub fn advice(&self) -> &[Advice] {
    &self.advice
  }
}

impl fmt::Debug for Advisor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Advisor")
      .field("name", &self.name)
      .field("advice", &self.advice)
      .finish_non_exhaustive()
  }
}

/// Supplies advisors from an external source.
pub trait RuleSource {
  fn rules(&self) -> Vec<Advisor>;
}

impl RuleSource for Vec<Advisor> {
  fn rules(&self) -> Vec<Advisor> {
    self.clone()
  }
}
