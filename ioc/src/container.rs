//! The `Container` struct: descriptor registration, object creation and lookup.

use crate::aop::{Advisor, AutoProxyCreator, ChainAssembler, RuleSource};
use crate::config::{ContainerConfig, ProxyStrategy};
use crate::core::CreationGuard;
use crate::descriptor::{DescriptorSource, DescriptorStore, ObjectDescriptor, PropertySource};
use crate::error::{Error, InvocationError, Result};
use crate::hooks::{early_reference, DescriptorPostProcessor, HookRegistry, ObjectPostProcessor};
use crate::object::ObjectRef;
use crate::resolver::{StandardValueResolver, ValueResolver};
use crate::singleton::{SingletonRegistry, SlotState};
use crate::value::Value;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Name prefix that asks for a factory object itself rather than its product.
pub const FACTORY_PREFIX: &str = "&";

/// The object container.
///
/// Holds object descriptors, creates and wires objects on demand, keeps one
/// shared instance per singleton name, and wraps objects matched by a
/// registered [`Advisor`] in proxies. All operations take `&self`; the
/// container is safe to share between threads.
pub struct Container {
  id: u64,
  config: ContainerConfig,
  descriptors: DescriptorStore,
  singletons: SingletonRegistry,
  hooks: HookRegistry,
  assembler: Arc<ChainAssembler>,
  resolver: Arc<dyn ValueResolver>,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.id)
      .field("config", &self.config)
      .field("descriptors", &self.descriptors.len())
      .field("advisors", &self.assembler.advisor_count())
      .finish_non_exhaustive()
  }
}

impl Container {
  /// Creates an empty container with the default configuration.
  pub fn new() -> Self {
    ContainerBuilder::new().build()
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::new()
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.config
  }

  // --- Registration ---

  /// Registers a descriptor under its name.
  ///
  /// Replacing an existing descriptor fails with
  /// [`Error::DuplicateDescriptor`] unless overriding is allowed.
  pub fn register(&self, descriptor: ObjectDescriptor) -> Result<()> {
    let name = descriptor.name.clone();
    if !self.config.allow_descriptor_overriding && self.descriptors.contains(&name) {
      return Err(Error::DuplicateDescriptor { name });
    }
    if self.descriptors.insert(descriptor).is_some() {
      debug!(name = %name, "overriding object descriptor");
    } else {
      trace!(name = %name, "registered object descriptor");
    }
    Ok(())
  }

  /// Registers every descriptor `source` supplies. Returns how many were registered.
  pub fn load(&self, source: &dyn DescriptorSource) -> Result<usize> {
    let descriptors = source.descriptors()?;
    let count = descriptors.len();
    for descriptor in descriptors {
      self.register(descriptor)?;
    }
    Ok(count)
  }

  /// Registers an interception rule after all existing ones.
  ///
  /// Only objects created afterwards are proxied for it, but existing
  /// proxies pick up its advice for the methods it matches.
  pub fn add_advisor(&self, advisor: Advisor) {
    debug!(advisor = ?advisor.name(), "registered advisor");
    self.assembler.add_advisor(advisor);
  }

  pub fn load_rules(&self, source: &dyn RuleSource) -> usize {
    let rules = source.rules();
    let count = rules.len();
    rules.into_iter().for_each(|rule| self.add_advisor(rule));
    count
  }

  pub fn add_post_processor(&self, hook: Arc<dyn ObjectPostProcessor>) {
    self.hooks.add(hook);
  }

  /// Adds a hook that [`refresh`](Self::refresh) runs over the descriptors.
  pub fn add_descriptor_processor(&self, processor: Arc<dyn DescriptorPostProcessor>) {
    self.hooks.add_descriptor_processor(processor);
  }

  // --- Introspection ---

  pub fn contains(&self, name: &str) -> bool {
    self.descriptors.contains(name)
  }

  pub fn descriptor(&self, name: &str) -> Result<Arc<ObjectDescriptor>> {
    self.descriptors.get(name)
  }

  /// All registered descriptor names, sorted.
  pub fn descriptor_names(&self) -> Vec<String> {
    self.descriptors.names()
  }

  pub fn singleton_state(&self, name: &str) -> SlotState {
    self.singletons.state(name)
  }

  /// Names of the singletons created so far, sorted.
  pub fn singleton_names(&self) -> Vec<String> {
    self.singletons.finished_names()
  }

  /// Names of the objects that were handed a reference to `name` while being created.
  pub fn dependents(&self, name: &str) -> Vec<String> {
    self.singletons.dependents(name)
  }

  pub fn chains(&self) -> &Arc<ChainAssembler> {
    &self.assembler
  }

  // --- Lookup ---

  /// Returns the object registered as `name`, creating it if needed.
  ///
  /// Singletons are created once and then shared; prototypes are created on
  /// every call. For a factory class the product of its
  /// [`get_object`](crate::Managed::get_object) is returned, and
  /// `"&name"` returns the factory itself.
  pub fn get(&self, name: &str) -> Result<ObjectRef> {
    if let Some(factory) = name.strip_prefix(FACTORY_PREFIX) {
      let object = self.get_instance(factory)?;
      if !object.class().is_factory() {
        return Err(Error::NotAFactory {
          name: factory.to_owned(),
        });
      }
      return Ok(object);
    }
    let object = self.get_instance(name)?;
    if object.class().is_factory() {
      return self.product(name, &object);
    }
    Ok(object)
  }

  fn get_instance(&self, name: &str) -> Result<ObjectRef> {
    if let Some(requester) = CreationGuard::current(self.id) {
      self.singletons.register_dependent(name, &requester);
    }
    if let Some(object) = self.singletons.resolve(name)? {
      trace!(name, "returning cached singleton");
      return Ok(object);
    }
    let descriptor = self.descriptors.get(name)?;
    self.create(&descriptor)
  }

  /// Returns the object registered as `name` as its concrete type.
  ///
  /// The returned value is the raw instance, even when the container
  /// exposes a proxy for it.
  pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let object = self.get(name)?;
    object.downcast::<T>().ok_or_else(|| {
      InvocationError::TypeMismatch {
        expected: std::any::type_name::<T>(),
        found: object.class().type_name(),
      }
      .into()
    })
  }

  /// Returns the only object exposed as type `T`.
  pub fn get_by_type<T: Any>(&self) -> Result<ObjectRef> {
    self.get_by_type_id(TypeId::of::<T>(), std::any::type_name::<T>())
  }

  fn get_by_type_id(&self, type_id: TypeId, type_name: &str) -> Result<ObjectRef> {
    let candidates = self.descriptors.names_of_type(type_id);
    self.single(candidates, type_name)
  }

  /// Returns the only object whose class declares the capability interface `interface`.
  pub fn get_by_capability(&self, interface: &str) -> Result<ObjectRef> {
    let candidates = self
      .descriptors
      .names_where(|d| d.class.implements(interface));
    self.single(candidates, interface)
  }

  /// Every object exposed as type `T`, keyed by name.
  pub fn objects_of_type<T: Any>(&self) -> Result<BTreeMap<String, ObjectRef>> {
    self
      .descriptors
      .names_of_type(TypeId::of::<T>())
      .into_iter()
      .map(|name| {
        let object = self.get(&name)?;
        Ok((name, object))
      })
      .collect()
  }

  fn single(&self, mut candidates: Vec<String>, type_name: &str) -> Result<ObjectRef> {
    match candidates.len() {
      0 => Err(Error::NoDescriptorOfType {
        type_name: type_name.to_owned(),
      }),
      1 => {
        let name = candidates.remove(0);
        self.get(&name)
      }
      _ => Err(Error::AmbiguousType {
        type_name: type_name.to_owned(),
        candidates,
      }),
    }
  }

  // --- Lifecycle ---

  /// Creates every non-lazy singleton that does not exist yet.
  pub fn pre_instantiate_singletons(&self) -> Result<()> {
    let names = self
      .descriptors
      .names_where(|d| d.is_singleton() && !d.lazy);
    debug!(count = names.len(), "pre-instantiating singletons");
    for name in names {
      self.get(&name)?;
    }
    Ok(())
  }

  /// Runs the descriptor processors, then creates the non-lazy singletons
  /// if `eager_singletons` is set.
  pub fn refresh(&self) -> Result<()> {
    for processor in self.hooks.descriptor_processors() {
      processor.process(&self.descriptors)?;
    }
    if self.config.eager_singletons {
      self.pre_instantiate_singletons()?;
    }
    Ok(())
  }

  /// Disposes the singletons, most recently created first, and forgets them.
  ///
  /// Every disposal runs even if an earlier one fails; the first failure is
  /// returned.
  pub fn shutdown(&self) -> Result<()> {
    debug!(container = self.id, "shutting down");
    self.singletons.destroy_singletons()
  }

  // --- Creation ---

  fn create(&self, descriptor: &ObjectDescriptor) -> Result<ObjectRef> {
    let name = descriptor.name.as_str();
    let _guard = CreationGuard::enter(self.id, name)?;
    self.do_create(descriptor).map_err(|err| {
      if descriptor.is_singleton() {
        self.singletons.discard(name);
      }
      debug!(name, error = %err, "object creation failed");
      Error::creation(name, err)
    })
  }

  fn do_create(&self, descriptor: &ObjectDescriptor) -> Result<ObjectRef> {
    let name = descriptor.name.as_str();
    let class = &descriptor.class;
    let hooks = self.hooks.snapshot();

    for hook in &hooks {
      if let Some(object) = hook.before_instantiation(class, name)? {
        debug!(name, "instantiation supplied by hook");
        let object = hooks
          .iter()
          .try_fold(object, |current, hook| hook.after_initialization(current, name))?;
        return Ok(self.finish(descriptor, object));
      }
    }

    debug!(name, class = %class.name(), "instantiating");
    let raw = class.instantiate(self)?;

    if descriptor.is_singleton() && self.config.allow_circular_references {
      let early_hooks = hooks.clone();
      let early = raw.clone();
      let early_name = name.to_owned();
      self.singletons.register_factory(name, move || {
        early_reference(&early_hooks, early.clone(), &early_name)
      });
    }

    let mut populate = true;
    for hook in &hooks {
      if !hook.after_instantiation(&raw, name)? {
        populate = false;
        break;
      }
    }
    if populate {
      self.populate(descriptor, &raw, &hooks)?;
    }
    if class.is_aware() {
      trace!(name, "handing the container to an aware object");
      raw.set_container(name, self)?;
    }

    let mut exposed = hooks
      .iter()
      .try_fold(raw.clone(), |current, hook| hook.before_initialization(current, name))?;
    self.initialize(descriptor, &exposed)?;
    exposed = hooks
      .iter()
      .try_fold(exposed, |current, hook| hook.after_initialization(current, name))?;

    if descriptor.is_singleton() {
      let tagged = class.is_disposable();
      if tagged || descriptor.destroy_method.is_some() {
        self
          .singletons
          .register_disposable(name, raw.clone(), tagged, descriptor.destroy_method.clone());
      }
      if let Some(early) = self.singletons.early(name) {
        if exposed != raw && exposed != early {
          warn!(name, "object was replaced after an early reference was handed out; keeping the early reference");
        }
        exposed = early;
      }
    }
    Ok(self.finish(descriptor, exposed))
  }

  // The object a factory exposes under `name`, cached for singleton factories.
  fn product(&self, name: &str, factory: &ObjectRef) -> Result<ObjectRef> {
    let singleton = self.descriptors.get(name)?.is_singleton();
    if singleton {
      if let Some(product) = self.singletons.product(name) {
        return Ok(product);
      }
    }
    trace!(name, "asking factory for its product");
    let product = factory
      .get_object()
      .map_err(|err| Error::creation(name, err.into()))?;
    let product = self
      .hooks
      .snapshot()
      .iter()
      .try_fold(product, |current, hook| hook.after_initialization(current, name))?;
    if singleton {
      Ok(self.singletons.cache_product(name, product))
    } else {
      Ok(product)
    }
  }

  fn finish(&self, descriptor: &ObjectDescriptor, object: ObjectRef) -> ObjectRef {
    if descriptor.is_singleton() {
      debug!(name = %descriptor.name, proxy = object.is_proxy(), "singleton ready");
      self.singletons.promote(&descriptor.name, object)
    } else {
      object
    }
  }

  fn populate(
    &self,
    descriptor: &ObjectDescriptor,
    object: &ObjectRef,
    hooks: &[Arc<dyn ObjectPostProcessor>],
  ) -> Result<()> {
    let name = descriptor.name.as_str();
    let properties = hooks
      .iter()
      .try_fold(descriptor.properties.clone(), |current, hook| {
        hook.process_properties(current, object, name)
      })?;

    for property in properties {
      let info = descriptor
        .class
        .property(&property.name)
        .ok_or_else(|| InvocationError::NoSuchProperty {
          class: descriptor.class.name().to_owned(),
          property: property.name.clone(),
        })?;
      let value = match property.value {
        PropertySource::Literal(value) => self.resolver.resolve(value, info)?,
        PropertySource::Reference(target) => {
          trace!(name, property = %property.name, target = %target, "resolving reference");
          Value::Object(self.get(&target)?)
        }
        PropertySource::ByType { type_id, type_name } => {
          trace!(name, property = %property.name, type_name, "resolving by type");
          Value::Object(self.get_by_type_id(type_id, type_name)?)
        }
        PropertySource::ByCapability(interface) => {
          trace!(name, property = %property.name, interface = %interface, "resolving by capability");
          Value::Object(self.get_by_capability(&interface)?)
        }
      };
      object.set_property(&property.name, value)?;
    }
    Ok(())
  }

  fn initialize(&self, descriptor: &ObjectDescriptor, object: &ObjectRef) -> Result<()> {
    let class = &descriptor.class;
    if class.is_initializing() {
      trace!(name = %descriptor.name, "running after_properties_set");
      object.after_properties_set()?;
    }
    if let Some(method) = &descriptor.init_method {
      // Tagged classes already ran it.
      if class.is_initializing() && method == "after_properties_set" {
        return Ok(());
      }
      if class.method(method).is_none() {
        return Err(Error::InitMethodNotFound {
          name: descriptor.name.clone(),
          method: method.clone(),
        });
      }
      trace!(name = %descriptor.name, method = %method, "running init method");
      object.invoke(method, &[])?;
    }
    Ok(())
  }
}

/// A builder for [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
  config: ContainerConfig,
  resolver: Option<Arc<dyn ValueResolver>>,
}

impl fmt::Debug for ContainerBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContainerBuilder")
      .field("config", &self.config)
      .field("custom_resolver", &self.resolver.is_some())
      .finish()
  }
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replaces the whole configuration, e.g. one loaded from YAML.
  pub fn config(mut self, config: ContainerConfig) -> Self {
    self.config = config;
    self
  }

  pub fn proxy_strategy(mut self, strategy: ProxyStrategy) -> Self {
    self.config.proxy_strategy = strategy;
    self
  }

  /// Whether singletons are exposed early to break circular references.
  pub fn allow_circular_references(mut self, allow: bool) -> Self {
    self.config.allow_circular_references = allow;
    self
  }

  pub fn eager_singletons(mut self, eager: bool) -> Self {
    self.config.eager_singletons = eager;
    self
  }

  pub fn allow_descriptor_overriding(mut self, allow: bool) -> Self {
    self.config.allow_descriptor_overriding = allow;
    self
  }

  /// Sets the converter applied to literal property values.
  pub fn value_resolver(mut self, resolver: impl ValueResolver + 'static) -> Self {
    self.resolver = Some(Arc::new(resolver));
    self
  }

  pub fn build(self) -> Container {
    let assembler = Arc::new(ChainAssembler::new());
    let hooks = HookRegistry::new();
    hooks.set_weaver(Arc::new(AutoProxyCreator::new(
      Arc::clone(&assembler),
      self.config.proxy_strategy,
    )));
    Container {
      id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
      config: self.config,
      descriptors: DescriptorStore::new(),
      singletons: SingletonRegistry::new(),
      hooks,
      assembler,
      resolver: self
        .resolver
        .unwrap_or_else(|| Arc::new(StandardValueResolver)),
    }
  }
}
