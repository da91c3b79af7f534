//! Extension hooks invoked by the container at fixed points of an object's lifecycle.

use crate::class::ClassInfo;
use crate::descriptor::{DescriptorStore, PropertyValue};
use crate::error::Result;
use crate::object::ObjectRef;
use parking_lot::RwLock;
use std::sync::Arc;

/// A lifecycle interceptor. Every method has a pass-through default, so an
/// implementation only overrides the points it cares about.
///
/// The order in which the container calls them for one object is:
/// `before_instantiation`, (instantiation), `after_instantiation`,
/// `process_properties`, (population), `before_initialization`,
/// (initializers), `after_initialization`. `early_reference` runs only if
/// another object needs this one while it is still being built.
pub trait ObjectPostProcessor: Send + Sync {
  /// Supplies a ready-made object instead of letting the container build one.
  fn before_instantiation(&self, class: &Arc<ClassInfo>, name: &str) -> Result<Option<ObjectRef>> {
    let _ = (class, name);
    Ok(None)
  }

  /// Returning `false` skips property population for this object.
  fn after_instantiation(&self, object: &ObjectRef, name: &str) -> Result<bool> {
    let _ = (object, name);
    Ok(true)
  }

  /// Rewrites the declared property values before they are applied.
  fn process_properties(
    &self,
    properties: Vec<PropertyValue>,
    object: &ObjectRef,
    name: &str,
  ) -> Result<Vec<PropertyValue>> {
    let _ = (object, name);
    Ok(properties)
  }

  fn before_initialization(&self, object: ObjectRef, name: &str) -> Result<ObjectRef> {
    let _ = name;
    Ok(object)
  }

  /// May substitute the object, e.g. with a proxy.
  fn after_initialization(&self, object: ObjectRef, name: &str) -> Result<ObjectRef> {
    let _ = name;
    Ok(object)
  }

  /// Produces the reference handed out while the object is still under
  /// construction, when a circular reference forces early exposure.
  fn early_reference(&self, object: ObjectRef, name: &str) -> Result<ObjectRef> {
    let _ = name;
    Ok(object)
  }
}

/// Runs once over all descriptors before any object is instantiated.
pub trait DescriptorPostProcessor: Send + Sync {
  fn process(&self, descriptors: &DescriptorStore) -> Result<()>;
}

/// The ordered hook lists of a container.
///
/// User hooks run in registration order; the proxy weaving hook, if any,
/// always runs last so that it wraps the object the other hooks produced.
#[derive(Default)]
pub struct HookRegistry {
  hooks: RwLock<Vec<Arc<dyn ObjectPostProcessor>>>,
  weaver: RwLock<Option<Arc<dyn ObjectPostProcessor>>>,
  descriptor_processors: RwLock<Vec<Arc<dyn DescriptorPostProcessor>>>,
}

impl HookRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a hook. Adding the same hook twice moves it to the end.
  pub fn add(&self, hook: Arc<dyn ObjectPostProcessor>) {
    let mut hooks = self.hooks.write();
    hooks.retain(|h| !same_hook(h, &hook));
    hooks.push(hook);
  }

  pub(crate) fn set_weaver(&self, weaver: Arc<dyn ObjectPostProcessor>) {
    *self.weaver.write() = Some(weaver);
  }

  pub fn add_descriptor_processor(&self, processor: Arc<dyn DescriptorPostProcessor>) {
    self.descriptor_processors.write().push(processor);
  }

  /// The hooks to run for one object, in order.
  pub fn snapshot(&self) -> Vec<Arc<dyn ObjectPostProcessor>> {
    let mut hooks = self.hooks.read().clone();
    if let Some(weaver) = self.weaver.read().as_ref() {
      hooks.push(Arc::clone(weaver));
    }
    hooks
  }

  pub fn descriptor_processors(&self) -> Vec<Arc<dyn DescriptorPostProcessor>> {
    self.descriptor_processors.read().clone()
  }

  pub fn len(&self) -> usize {
    self.hooks.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn same_hook(a: &Arc<dyn ObjectPostProcessor>, b: &Arc<dyn ObjectPostProcessor>) -> bool {
  Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Threads `object` through every hook's `early_reference`.
pub(crate) fn early_reference(
  hooks: &[Arc<dyn ObjectPostProcessor>],
  object: ObjectRef,
  name: &str,
) -> Result<ObjectRef> {
  hooks
    .iter()
    .try_fold(object, |current, hook| hook.early_reference(current, name))
}
