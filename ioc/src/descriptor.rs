//! Object descriptors and the store that holds them.

use crate::class::ClassInfo;
use crate::error::{Error, Result};
use crate::value::Value;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
  /// One shared instance for the lifetime of the container.
  #[default]
  Singleton,
  /// A new instance on every lookup.
  Prototype,
}

/// The value side of a declared property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySource {
  Literal(Value),
  /// The object registered under this name.
  Reference(String),
  /// The only object whose exposed type is the given one.
  ByType {
    type_id: TypeId,
    type_name: &'static str,
  },
  /// The only object whose class declares this capability interface.
  ByCapability(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
  pub name: String,
  pub value: PropertySource,
}

/// A declarative recipe for constructing and wiring one named object.
#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
  pub name: String,
  pub class: Arc<ClassInfo>,
  pub scope: Scope,
  pub lazy: bool,
  pub init_method: Option<String>,
  pub destroy_method: Option<String>,
  pub properties: Vec<PropertyValue>,
}

impl ObjectDescriptor {
  /// A non-lazy singleton descriptor without properties.
  pub fn new(name: impl Into<String>, class: Arc<ClassInfo>) -> Self {
    Self {
      name: name.into(),
      class,
      scope: Scope::Singleton,
      lazy: false,
      init_method: None,
      destroy_method: None,
      properties: Vec::new(),
    }
  }

  pub fn scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn prototype(self) -> Self {
    self.scope(Scope::Prototype)
  }

  pub fn lazy(mut self, lazy: bool) -> Self {
    self.lazy = lazy;
    self
  }

  pub fn init_method(mut self, method: impl Into<String>) -> Self {
    self.init_method = Some(method.into());
    self
  }

  pub fn destroy_method(mut self, method: impl Into<String>) -> Self {
    self.destroy_method = Some(method.into());
    self
  }

  /// Adds a literal property value. A later value for the same name replaces it.
  pub fn value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.with_property(name.into(), PropertySource::Literal(value.into()))
  }

  /// Adds a property wired to the object registered as `target`.
  pub fn reference(self, name: impl Into<String>, target: impl Into<String>) -> Self {
    self.with_property(name.into(), PropertySource::Reference(target.into()))
  }

  /// Adds a property wired to the only object of type `T`.
  pub fn by_type<T: Any>(self, name: impl Into<String>) -> Self {
    self.with_property(
      name.into(),
      PropertySource::ByType {
        type_id: TypeId::of::<T>(),
        type_name: std::any::type_name::<T>(),
      },
    )
  }

  /// Adds a property wired to the only object declaring `interface`.
  pub fn by_capability(self, name: impl Into<String>, interface: impl Into<String>) -> Self {
    self.with_property(name.into(), PropertySource::ByCapability(interface.into()))
  }

  fn with_property(mut self, name: String, value: PropertySource) -> Self {
    match self.properties.iter_mut().find(|p| p.name == name) {
      Some(existing) => existing.value = value,
      None => self.properties.push(PropertyValue { name, value }),
    }
    self
  }

  pub fn is_singleton(&self) -> bool {
    self.scope == Scope::Singleton
  }
}

/// Supplies descriptors from an external source (configuration files, scanners...).
pub trait DescriptorSource {
  fn descriptors(&self) -> Result<Vec<ObjectDescriptor>>;
}

impl DescriptorSource for Vec<ObjectDescriptor> {
  fn descriptors(&self) -> Result<Vec<ObjectDescriptor>> {
    Ok(self.clone())
  }
}

/// Name to descriptor lookup table.
#[derive(Default)]
pub struct DescriptorStore {
  descriptors: DashMap<String, Arc<ObjectDescriptor>>,
}

impl DescriptorStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `descriptor`, returning the one it replaced, if any.
  pub fn insert(&self, descriptor: ObjectDescriptor) -> Option<Arc<ObjectDescriptor>> {
    self
      .descriptors
      .insert(descriptor.name.clone(), Arc::new(descriptor))
  }

  pub fn get(&self, name: &str) -> Result<Arc<ObjectDescriptor>> {
    self
      .descriptors
      .get(name)
      .map(|d| Arc::clone(d.value()))
      .ok_or_else(|| Error::NoSuchDescriptor {
        name: name.to_owned(),
      })
  }

  pub fn contains(&self, name: &str) -> bool {
    self.descriptors.contains_key(name)
  }

  /// Applies `update` to a copy of the named descriptor and stores the result.
  pub fn update(&self, name: &str, update: impl FnOnce(&mut ObjectDescriptor)) -> Result<()> {
    let mut entry = self
      .descriptors
      .get_mut(name)
      .ok_or_else(|| Error::NoSuchDescriptor {
        name: name.to_owned(),
      })?;
    let mut descriptor = ObjectDescriptor::clone(entry.value());
    update(&mut descriptor);
    *entry.value_mut() = Arc::new(descriptor);
    Ok(())
  }

  /// All registered names, sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.descriptors.iter().map(|e| e.key().clone()).collect();
    names.sort();
    names
  }

  /// Sorted names of the descriptors matching `filter`.
  pub fn names_where(&self, filter: impl Fn(&ObjectDescriptor) -> bool) -> Vec<String> {
    let mut names: Vec<String> = self
      .descriptors
      .iter()
      .filter(|e| filter(e.value()))
      .map(|e| e.key().clone())
      .collect();
    names.sort();
    names
  }

  /// Sorted names of the descriptors exposing objects of `type_id`.
  pub fn names_of_type(&self, type_id: TypeId) -> Vec<String> {
    self.names_where(|d| d.class.exposed_type_id() == type_id)
  }

  pub fn len(&self) -> usize {
    self.descriptors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.descriptors.is_empty()
  }
}
