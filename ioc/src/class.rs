//! The capability registry: per-type metadata declared at registration time.
//!
//! A [`ClassInfo`] records everything the container and the interception
//! pipeline need to know about a constructible type: how to build it, which
//! properties it accepts, which methods it exposes, which capability
//! interfaces group those methods, and which lifecycle capabilities it has.

use crate::container::Container;
use crate::error::Result;
use crate::object::{Managed, ObjectRef};
use crate::value::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

type Constructor = Box<dyn Fn(&Container, &Arc<ClassInfo>) -> Result<ObjectRef> + Send + Sync>;

/// The declared type of a property, used when converting literal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
  Any,
  Bool,
  Int,
  Float,
  Str,
  List,
  Object,
}

impl PropertyKind {
  /// Whether `value` can be assigned without conversion.
  pub fn accepts(&self, value: &Value) -> bool {
    matches!(
      (self, value),
      (PropertyKind::Any, _)
        | (_, Value::Null)
        | (PropertyKind::Bool, Value::Bool(_))
        | (PropertyKind::Int, Value::Int(_))
        | (PropertyKind::Float, Value::Float(_))
        | (PropertyKind::Str, Value::Str(_))
        | (PropertyKind::List, Value::List(_))
        | (PropertyKind::Object, Value::Object(_))
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
  pub name: String,
  pub kind: PropertyKind,
}

/// An invocable method, identified by name within its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
  pub name: String,
  /// The class or capability interface that declares the method.
  pub declared_by: String,
}

/// A named capability interface: a subset of the class's methods that a
/// capability-surface proxy can expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
  pub name: String,
  pub methods: Vec<String>,
}

/// Metadata and construction recipe for one managed type.
pub struct ClassInfo {
  id: u64,
  name: String,
  type_id: TypeId,
  type_name: &'static str,
  properties: Vec<PropertyInfo>,
  methods: Vec<MethodInfo>,
  interfaces: Vec<InterfaceInfo>,
  sealed: bool,
  initializing: bool,
  disposable: bool,
  aware: bool,
  product: Option<(TypeId, &'static str)>,
  constructor: Constructor,
}

impl ClassInfo {
  /// Starts describing a class whose instances are built by `constructor`.
  pub fn builder<T: Managed>(
    name: impl Into<String>,
    constructor: impl Fn() -> T + Send + Sync + 'static,
  ) -> ClassBuilder {
    ClassBuilder::new::<T>(
      name.into(),
      Box::new(move |_, class| Ok(ObjectRef::new(constructor(), Arc::clone(class)))),
    )
  }

  /// Like [`builder`](Self::builder), but the constructor may resolve other
  /// objects from the container. Such constructor dependencies cannot take
  /// part in a circular reference.
  pub fn builder_with<T: Managed>(
    name: impl Into<String>,
    factory: impl Fn(&Container) -> Result<T> + Send + Sync + 'static,
  ) -> ClassBuilder {
    ClassBuilder::new::<T>(
      name.into(),
      Box::new(move |container, class| Ok(ObjectRef::new(factory(container)?, Arc::clone(class)))),
    )
  }

  /// Identity of this class description, unique within the process.
  ///
  /// Two classes built on the same Rust type still get different ids.
  pub fn id(&self) -> u64 {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  /// The Rust type name of the instances.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn properties(&self) -> &[PropertyInfo] {
    &self.properties
  }

  pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
    self.properties.iter().find(|p| p.name == name)
  }

  pub fn methods(&self) -> &[MethodInfo] {
    &self.methods
  }

  pub fn method(&self, name: &str) -> Option<&MethodInfo> {
    self.methods.iter().find(|m| m.name == name)
  }

  pub fn interfaces(&self) -> &[InterfaceInfo] {
    &self.interfaces
  }

  /// Whether the class declares the named capability interface.
  pub fn implements(&self, interface: &str) -> bool {
    self.interfaces.iter().any(|i| i.name == interface)
  }

  /// Whether `method` belongs to one of the declared capability interfaces.
  pub fn in_interface_surface(&self, method: &str) -> bool {
    self
      .interfaces
      .iter()
      .any(|i| i.methods.iter().any(|m| m == method))
  }

  /// Sealed classes cannot be proxied by overriding their methods.
  pub fn is_sealed(&self) -> bool {
    self.sealed
  }

  pub fn is_initializing(&self) -> bool {
    self.initializing
  }

  pub fn is_disposable(&self) -> bool {
    self.disposable
  }

  /// Whether instances want their name and container before initialization.
  pub fn is_aware(&self) -> bool {
    self.aware
  }

  /// Whether instances are factories whose product is exposed in their place.
  pub fn is_factory(&self) -> bool {
    self.product.is_some()
  }

  /// The type of the objects exposed under this class's names: the product
  /// type for factories, the instance type otherwise.
  pub fn exposed_type_id(&self) -> TypeId {
    self.product.map_or(self.type_id, |(type_id, _)| type_id)
  }

  pub fn exposed_type_name(&self) -> &'static str {
    self.product.map_or(self.type_name, |(_, type_name)| type_name)
  }

  pub(crate) fn instantiate(self: &Arc<Self>, container: &Container) -> Result<ObjectRef> {
    (self.constructor)(container, self)
  }
}

impl fmt::Debug for ClassInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ClassInfo")
      .field("name", &self.name)
      .field("type_name", &self.type_name)
      .field("properties", &self.properties)
      .field("methods", &self.methods)
      .field("interfaces", &self.interfaces)
      .field("sealed", &self.sealed)
      .field("factory", &self.is_factory())
      .finish_non_exhaustive()
  }
}

/// A builder for [`ClassInfo`].
pub struct ClassBuilder {
  name: String,
  type_id: TypeId,
  type_name: &'static str,
  properties: Vec<PropertyInfo>,
  methods: Vec<MethodInfo>,
  interfaces: Vec<InterfaceInfo>,
  sealed: bool,
  initializing: bool,
  disposable: bool,
  aware: bool,
  product: Option<(TypeId, &'static str)>,
  constructor: Constructor,
}

impl ClassBuilder {
  fn new<T: Any>(name: String, constructor: Constructor) -> Self {
    Self {
      name,
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      properties: Vec::new(),
      methods: Vec::new(),
      interfaces: Vec::new(),
      sealed: false,
      initializing: false,
      disposable: false,
      aware: false,
      product: None,
      constructor,
    }
  }

  /// Declares a writable property.
  pub fn property(mut self, name: impl Into<String>, kind: PropertyKind) -> Self {
    let name = name.into();
    self.properties.retain(|p| p.name != name);
    self.properties.push(PropertyInfo { name, kind });
    self
  }

  /// Declares a method owned by the class itself.
  pub fn method(mut self, name: impl Into<String>) -> Self {
    let name = name.into();
    if self.methods.iter().all(|m| m.name != name) {
      self.methods.push(MethodInfo {
        name,
        declared_by: self.name.clone(),
      });
    }
    self
  }

  pub fn methods<I, S>(self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    names.into_iter().fold(self, |builder, name| builder.method(name))
  }

  /// Declares a capability interface. Its methods become methods of the class.
  pub fn interface<I, S>(mut self, name: impl Into<String>, methods: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let name = name.into();
    let methods: Vec<String> = methods.into_iter().map(Into::into).collect();
    for method in &methods {
      match self.methods.iter_mut().find(|m| &m.name == method) {
        Some(existing) => existing.declared_by = name.clone(),
        None => self.methods.push(MethodInfo {
          name: method.clone(),
          declared_by: name.clone(),
        }),
      }
    }
    self.interfaces.push(InterfaceInfo { name, methods });
    self
  }

  /// Tags the class as not derivable; it can only be proxied through an interface.
  pub fn sealed(mut self) -> Self {
    self.sealed = true;
    self
  }

  /// Tags the class as having an `after_properties_set` initializer.
  pub fn initializing(mut self) -> Self {
    self.initializing = true;
    self
  }

  /// Tags the class as having a `destroy` disposal hook.
  pub fn disposable(mut self) -> Self {
    self.disposable = true;
    self
  }

  /// Tags the class as wanting its name and container, see [`Managed::set_container`].
  pub fn aware(mut self) -> Self {
    self.aware = true;
    self
  }

  /// Tags the class as a factory of `P` objects. Lookups by name or type see
  /// the product of [`Managed::get_object`]; prefixing the name with
  /// [`FACTORY_PREFIX`](crate::FACTORY_PREFIX) returns the factory itself.
  pub fn factory<P: Any>(mut self) -> Self {
    self.product = Some((TypeId::of::<P>(), std::any::type_name::<P>()));
    self
  }

  pub fn build(self) -> Arc<ClassInfo> {
    Arc::new(ClassInfo {
      id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
      name: self.name,
      type_id: self.type_id,
      type_name: self.type_name,
      properties: self.properties,
      methods: self.methods,
      interfaces: self.interfaces,
      sealed: self.sealed,
      initializing: self.initializing,
      disposable: self.disposable,
      aware: self.aware,
      product: self.product,
      constructor: self.constructor,
    })
  }
}
