//! Chain assembly: matching advisors to one method of one class.

use crate::aop::advice::MethodInterceptor;
use crate::aop::advisor::Advisor;
use crate::class::{ClassInfo, MethodInfo};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

/// An ordered interceptor list for one method.
pub type Chain = Arc<[Arc<dyn MethodInterceptor>]>;

/// Identity of a method: its owning class plus its name.
///
/// Keyed by [`ClassInfo::id`] rather than the Rust type, since pointcuts
/// match class names and interfaces and several classes may share a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
  pub class_id: u64,
  pub method: String,
}

impl MethodKey {
  pub fn new(class: &ClassInfo, method: &MethodInfo) -> Self {
    Self {
      class_id: class.id(),
      method: method.name.clone(),
    }
  }
}

// An advisor with its advice already adapted, so every chain shares the same interceptors.
struct RegisteredAdvisor {
  advisor: Advisor,
  interceptors: Vec<Arc<dyn MethodInterceptor>>,
}

/// Holds the registered advisors and the per-method chain cache.
#[derive(Default)]
pub struct ChainAssembler {
  advisors: RwLock<Vec<Arc<RegisteredAdvisor>>>,
  cache: DashMap<MethodKey, Chain>,
}

impl ChainAssembler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers an advisor after all existing ones.
  pub fn add_advisor(&self, advisor: Advisor) {
    let interceptors = advisor
      .advice()
      .iter()
      .cloned()
      .map(|advice| advice.into_interceptor())
      .collect();
    self.advisors.write().push(Arc::new(RegisteredAdvisor {
      advisor,
      interceptors,
    }));
    self.cache.clear();
  }

  pub fn advisor_count(&self) -> usize {
    self.advisors.read().len()
  }

  /// Whether any advisor's class predicate accepts `class`.
  pub fn matches_class(&self, class: &ClassInfo) -> bool {
    self
      .advisors
      .read()
      .iter()
      .any(|r| r.advisor.pointcut().matches_class(class))
  }

  /// The interceptor chain for `method` of `class`, computed once per method.
  pub fn chain(&self, method: &MethodInfo, class: &ClassInfo) -> Chain {
    let key = MethodKey::new(class, method);
    if let Some(chain) = self.cache.get(&key) {
      return Arc::clone(chain.value());
    }
    let chain = self.assemble(method, class);
    Arc::clone(self.cache.entry(key).or_insert(chain).value())
  }

  fn assemble(&self, method: &MethodInfo, class: &ClassInfo) -> Chain {
    let advisors = self.advisors.read();
    let mut chain: Vec<Arc<dyn MethodInterceptor>> = Vec::new();
    for registered in advisors.iter() {
      let pointcut = registered.advisor.pointcut();
      if pointcut.matches_class(class) && pointcut.matches_method(method, class) {
        chain.extend(registered.interceptors.iter().cloned());
      }
    }
    trace!(class = %class.name(), method = %method.name, len = chain.len(), "assembled chain");
    chain.into()
  }
}
