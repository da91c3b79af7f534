//! Managed objects and the references the container hands out.

use crate::class::ClassInfo;
use crate::container::Container;
use crate::error::InvocationError;
use crate::value::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The capability surface of an object managed by the container.
///
/// Methods and properties are addressed by name and exchange [`Value`]s. The
/// names an implementation accepts are declared up front in its
/// [`ClassInfo`]; the container and the interception pipeline only work from
/// that metadata.
///
/// Objects may be shared with dependents before their properties are
/// populated (to break circular references), so every method takes `&self`
/// and implementations use interior mutability for state the container
/// writes.
pub trait Managed: Any + Send + Sync {
  /// Calls the named method.
  fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError>;

  /// Writes a declared property. Called during population.
  fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
    let _ = value;
    Err(InvocationError::NoSuchProperty {
      class: std::any::type_name::<Self>().to_owned(),
      property: name.to_owned(),
    })
  }

  /// Receives the object's name and the container building it, for classes
  /// tagged `aware`. Runs after population and before any initializer, so
  /// the object can look up what it needs from `container` here.
  fn set_container(&self, name: &str, container: &Container) -> Result<(), InvocationError> {
    let _ = (name, container);
    Ok(())
  }

  /// Produces the object exposed under this object's name, for classes
  /// tagged `factory`.
  fn get_object(&self) -> Result<ObjectRef, InvocationError> {
    Err(InvocationError::NoSuchMethod {
      class: std::any::type_name::<Self>().to_owned(),
      method: "get_object".to_owned(),
    })
  }

  /// Runs after all properties are set, for classes tagged `initializing`.
  fn after_properties_set(&self) -> Result<(), InvocationError> {
    Ok(())
  }

  /// Runs on container shutdown, for singletons tagged `disposable`.
  fn destroy(&self) -> Result<(), InvocationError> {
    Ok(())
  }
}

/// A handle to an object exposed by the container.
///
/// The handle may point at a raw instance or at a proxy wrapping one.
/// Equality is identity: two references are equal when they expose the same
/// object.
#[derive(Clone)]
pub struct ObjectRef {
  object: Arc<dyn Managed>,
  target: Arc<dyn Any + Send + Sync>,
  class: Arc<ClassInfo>,
  proxied: bool,
}

impl ObjectRef {
  /// Wraps a freshly built instance of `class`.
  pub fn new<T: Managed>(instance: T, class: Arc<ClassInfo>) -> Self {
    Self::from_arc(Arc::new(instance), class)
  }

  pub fn from_arc<T: Managed>(instance: Arc<T>, class: Arc<ClassInfo>) -> Self {
    let target: Arc<dyn Any + Send + Sync> = instance.clone();
    Self {
      object: instance,
      target,
      class,
      proxied: false,
    }
  }

  /// Builds a reference exposing `proxy` in place of `target`.
  pub(crate) fn proxy<P: Managed>(proxy: P, target: &ObjectRef) -> Self {
    Self {
      object: Arc::new(proxy),
      target: Arc::clone(&target.target),
      class: Arc::clone(&target.class),
      proxied: true,
    }
  }

  /// Calls `method` on the exposed object, through its interceptor chain if proxied.
  pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
    self.object.invoke(method, args)
  }

  pub fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
    self.object.set_property(name, value)
  }

  pub(crate) fn after_properties_set(&self) -> Result<(), InvocationError> {
    self.object.after_properties_set()
  }

  pub(crate) fn destroy(&self) -> Result<(), InvocationError> {
    self.object.destroy()
  }

  pub(crate) fn set_container(&self, name: &str, container: &Container) -> Result<(), InvocationError> {
    self.object.set_container(name, container)
  }

  pub(crate) fn get_object(&self) -> Result<ObjectRef, InvocationError> {
    self.object.get_object()
  }

  /// Metadata of the underlying class.
  pub fn class(&self) -> &Arc<ClassInfo> {
    &self.class
  }

  /// Whether this reference exposes a proxy rather than the raw instance.
  pub fn is_proxy(&self) -> bool {
    self.proxied
  }

  /// Returns the underlying instance as its concrete type.
  ///
  /// For a proxy this is the wrapped target, so calls made through the
  /// returned value bypass interception.
  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    Arc::clone(&self.target).downcast::<T>().ok()
  }

  pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
    a.addr() == b.addr()
  }

  fn addr(&self) -> usize {
    Arc::as_ptr(&self.object) as *const () as usize
  }

  /// Address of the underlying instance, shared by a target and its proxies.
  pub(crate) fn target_addr(&self) -> usize {
    Arc::as_ptr(&self.target) as *const () as usize
  }
}

impl PartialEq for ObjectRef {
  fn eq(&self, other: &Self) -> bool {
    ObjectRef::ptr_eq(self, other)
  }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ObjectRef")
      .field("class", &self.class.name())
      .field("addr", &format_args!("{:#x}", self.addr()))
      .field("proxy", &self.proxied)
      .finish()
  }
}
