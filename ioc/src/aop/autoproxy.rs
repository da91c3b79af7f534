//! The lifecycle hook that wraps matching objects in proxies.

use crate::aop::chain::ChainAssembler;
use crate::aop::proxy::ProxyFactory;
use crate::config::ProxyStrategy;
use crate::error::Result;
use crate::hooks::ObjectPostProcessor;
use crate::object::ObjectRef;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Proxies every object that at least one advisor applies to.
///
/// An object exposed early to break a circular reference is wrapped at that
/// point, and the same object is then left alone after initialization, so
/// it ends up with exactly one proxy. The container keeps the early proxy as
/// the final reference.
pub struct AutoProxyCreator {
  assembler: Arc<ChainAssembler>,
  factory: ProxyFactory,
  // Name to the address of the instance wrapped early under that name.
  early_proxied: DashMap<String, usize>,
}

impl AutoProxyCreator {
  pub fn new(assembler: Arc<ChainAssembler>, strategy: ProxyStrategy) -> Self {
    Self {
      factory: ProxyFactory::new(Arc::clone(&assembler), strategy),
      assembler,
      early_proxied: DashMap::new(),
    }
  }

  fn wrap_if_necessary(&self, object: ObjectRef, name: &str) -> Result<ObjectRef> {
    if object.is_proxy() || !self.assembler.matches_class(object.class()) {
      return Ok(object);
    }
    debug!(name, class = %object.class().name(), "wrapping object in proxy");
    self.factory.proxy(&object)
  }
}

impl ObjectPostProcessor for AutoProxyCreator {
  fn early_reference(&self, object: ObjectRef, name: &str) -> Result<ObjectRef> {
    self
      .early_proxied
      .insert(name.to_owned(), object.target_addr());
    self.wrap_if_necessary(object, name)
  }

  fn after_initialization(&self, object: ObjectRef, name: &str) -> Result<ObjectRef> {
    match self.early_proxied.remove(name) {
      Some((_, addr)) if addr == object.target_addr() => Ok(object),
      _ => self.wrap_if_necessary(object, name),
    }
  }
}
