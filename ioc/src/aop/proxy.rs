//! Proxy generation.
//!
//! Two wrapper types stand in for runtime class synthesis. An
//! [`InterfaceProxy`] exposes only the methods of the target's capability
//! interfaces; a [`ClassProxy`] overrides every declared method of the class
//! and falls back to the target for everything else. Both route intercepted
//! methods through the chain built by the [`ChainAssembler`].

use crate::aop::chain::ChainAssembler;
use crate::aop::invocation::MethodInvocation;
use crate::config::ProxyStrategy;
use crate::error::{Error, InvocationError, Result};
use crate::object::{Managed, ObjectRef};
use crate::value::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
  Interface,
  Class,
}

/// Builds proxies for targets according to a [`ProxyStrategy`].
#[derive(Clone)]
pub struct ProxyFactory {
  assembler: Arc<ChainAssembler>,
  strategy: ProxyStrategy,
}

impl ProxyFactory {
  pub fn new(assembler: Arc<ChainAssembler>, strategy: ProxyStrategy) -> Self {
    Self {
      assembler,
      strategy,
    }
  }

  /// Picks the proxy kind for `target`, failing if no kind can represent it.
  pub fn select(&self, target: &ObjectRef) -> Result<ProxyKind> {
    let class = target.class();
    let has_interfaces = !class.interfaces().is_empty();
    let kind = match self.strategy {
      ProxyStrategy::Auto if has_interfaces => ProxyKind::Interface,
      ProxyStrategy::Auto => ProxyKind::Class,
      ProxyStrategy::Interface => ProxyKind::Interface,
      ProxyStrategy::Class => ProxyKind::Class,
    };
    match kind {
      ProxyKind::Interface if !has_interfaces => Err(Error::ProxyGeneration {
        class: class.name().to_owned(),
        reason: "no capability interface is declared".to_owned(),
      }),
      ProxyKind::Class if class.is_sealed() => Err(Error::ProxyGeneration {
        class: class.name().to_owned(),
        reason: "the class is sealed".to_owned(),
      }),
      kind => Ok(kind),
    }
  }

  pub fn proxy(&self, target: &ObjectRef) -> Result<ObjectRef> {
    let kind = self.select(target)?;
    debug!(class = %target.class().name(), ?kind, "creating proxy");
    let interceptor = Interceptor {
      target: target.clone(),
      assembler: Arc::clone(&self.assembler),
    };
    Ok(match kind {
      ProxyKind::Interface => ObjectRef::proxy(InterfaceProxy(interceptor), target),
      ProxyKind::Class => ObjectRef::proxy(ClassProxy(interceptor), target),
    })
  }
}

struct Interceptor {
  target: ObjectRef,
  assembler: Arc<ChainAssembler>,
}

impl Interceptor {
  fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
    let class = self.target.class();
    let Some(info) = class.method(method) else {
      return self.target.invoke(method, args);
    };
    let chain = self.assembler.chain(info, class);
    if chain.is_empty() {
      return self.target.invoke(method, args);
    }
    MethodInvocation::new(&self.target, class, info, args.to_vec(), chain).proceed()
  }
}

/// A capability-surface proxy.
pub struct InterfaceProxy(Interceptor);

impl Managed for InterfaceProxy {
  fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
    let class = self.0.target.class();
    if !class.in_interface_surface(method) {
      return Err(InvocationError::NoSuchMethod {
        class: class.name().to_owned(),
        method: method.to_owned(),
      });
    }
    self.0.invoke(method, args)
  }

  fn set_property(&self, name: &str, _: Value) -> Result<(), InvocationError> {
    Err(InvocationError::NoSuchProperty {
      class: self.0.target.class().name().to_owned(),
      property: name.to_owned(),
    })
  }

  fn after_properties_set(&self) -> Result<(), InvocationError> {
    self.0.target.after_properties_set()
  }

  fn destroy(&self) -> Result<(), InvocationError> {
    self.0.target.destroy()
  }

  fn get_object(&self) -> Result<ObjectRef, InvocationError> {
    self.0.target.get_object()
  }
}

/// A subclass-style proxy: the target plays the part of the superclass.
pub struct ClassProxy(Interceptor);

impl Managed for ClassProxy {
  fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
    self.0.invoke(method, args)
  }

  fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
    self.0.target.set_property(name, value)
  }

  fn after_properties_set(&self) -> Result<(), InvocationError> {
    self.0.target.after_properties_set()
  }

  fn destroy(&self) -> Result<(), InvocationError> {
    self.0.target.destroy()
  }

  fn get_object(&self) -> Result<ObjectRef, InvocationError> {
    self.0.target.get_object()
  }
}
