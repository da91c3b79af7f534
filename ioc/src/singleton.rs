//! The tiered singleton exposure cache.
//!
//! Every singleton name maps to one slot whose state moves from `Factory`
//! (raw instance exists, early exposure possible on demand) to `Early`
//! (a reference was handed out mid-construction to break a cycle) to
//! `Final` (construction finished). A missing slot is the `Empty` state.
//!
//! The registry also remembers which singletons were handed a reference to
//! which, so that a failed creation can take down the dependents still
//! holding its abandoned early reference.

use crate::error::{Error, InvocationError, Result};
use crate::object::ObjectRef;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

type EarlyFactory = Box<dyn Fn() -> Result<ObjectRef> + Send + Sync>;

// Runs its factory at most once, even when several threads hit the slot together.
struct EarlyReference {
  factory: EarlyFactory,
  cell: OnceCell<ObjectRef>,
}

enum Slot {
  Factory(Arc<EarlyReference>),
  Early(ObjectRef),
  Final(ObjectRef),
}

/// Observable state of a singleton slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
  Empty,
  Factory,
  Early,
  Final,
}

struct Disposable {
  name: String,
  object: ObjectRef,
  tagged: bool,
  destroy_method: Option<String>,
}

impl Disposable {
  fn destroy(&self) -> Result<(), InvocationError> {
    if self.tagged {
      self.object.destroy()?;
    }
    if let Some(method) = &self.destroy_method {
      // A tagged class already ran `destroy` above.
      if !(self.tagged && method == "destroy") {
        self.object.invoke(method, &[])?;
      }
    }
    Ok(())
  }
}

/// Owns singleton identity and the disposal registrations of singletons.
#[derive(Default)]
pub struct SingletonRegistry {
  slots: DashMap<String, Slot>,
  disposables: Mutex<Vec<Disposable>>,
  // Name to the names of the singletons that were handed a reference to it.
  dependents: DashMap<String, Vec<String>>,
  // Products of singleton factories, by factory name.
  products: DashMap<String, ObjectRef>,
}

impl SingletonRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Looks `name` up in the finished, early and factory tiers, in that order.
  ///
  /// A factory hit runs the factory, stores its result as the early
  /// reference and retires the factory. `Ok(None)` means nothing has been
  /// exposed yet and the caller has to create the object.
  pub fn resolve(&self, name: &str) -> Result<Option<ObjectRef>> {
    let pending = match self.slots.get(name) {
      None => return Ok(None),
      Some(slot) => match slot.value() {
        Slot::Final(object) | Slot::Early(object) => return Ok(Some(object.clone())),
        Slot::Factory(pending) => Arc::clone(pending),
      },
    };

    let early = pending.cell.get_or_try_init(|| (pending.factory)())?.clone();
    if let Some(mut slot) = self.slots.get_mut(name) {
      let unchanged = matches!(slot.value(), Slot::Factory(current) if Arc::ptr_eq(current, &pending));
      if unchanged {
        debug!(name, proxy = early.is_proxy(), "exposed early reference");
        *slot = Slot::Early(early.clone());
      }
    }
    Ok(Some(early))
  }

  /// The finished or early reference for `name`, never running a factory.
  pub fn early(&self, name: &str) -> Option<ObjectRef> {
    self.slots.get(name).and_then(|slot| match slot.value() {
      Slot::Final(object) | Slot::Early(object) => Some(object.clone()),
      Slot::Factory(_) => None,
    })
  }

  /// Installs a lazily evaluated early reference for a singleton under construction.
  ///
  /// A slot that already holds state is left alone: when several threads
  /// build the same singleton, the first one's early reference is the one
  /// every thread sees.
  pub fn register_factory(
    &self,
    name: &str,
    factory: impl Fn() -> Result<ObjectRef> + Send + Sync + 'static,
  ) {
    if let Entry::Vacant(entry) = self.slots.entry(name.to_owned()) {
      entry.insert(Slot::Factory(Arc::new(EarlyReference {
        factory: Box::new(factory),
        cell: OnceCell::new(),
      })));
    }
  }

  /// Records the finished reference for `name` and drops its early state.
  ///
  /// A reference that was already handed out, finished or early, is kept
  /// and returned instead of `object`.
  pub fn promote(&self, name: &str, object: ObjectRef) -> ObjectRef {
    match self.slots.entry(name.to_owned()) {
      Entry::Occupied(mut entry) => {
        let object = match entry.get() {
          Slot::Final(existing) => return existing.clone(),
          Slot::Early(early) => early.clone(),
          Slot::Factory(_) => object,
        };
        entry.insert(Slot::Final(object.clone()));
        object
      }
      Entry::Vacant(entry) => {
        entry.insert(Slot::Final(object.clone()));
        object
      }
    }
  }

  /// The cached product of the singleton factory `name`.
  pub fn product(&self, name: &str) -> Option<ObjectRef> {
    self.products.get(name).map(|p| p.value().clone())
  }

  /// Caches the product of a singleton factory. The first product cached wins.
  pub fn cache_product(&self, name: &str, product: ObjectRef) -> ObjectRef {
    self
      .products
      .entry(name.to_owned())
      .or_insert(product)
      .value()
      .clone()
  }

  /// Records that `dependent` was handed a reference to `name` while being created.
  pub fn register_dependent(&self, name: &str, dependent: &str) {
    if name == dependent {
      return;
    }
    let mut entry = self.dependents.entry(name.to_owned()).or_default();
    if !entry.iter().any(|d| d == dependent) {
      entry.push(dependent.to_owned());
    }
  }

  /// Names of the singletons that were handed a reference to `name`, sorted.
  pub fn dependents(&self, name: &str) -> Vec<String> {
    let mut names = self
      .dependents
      .get(name)
      .map(|d| d.value().clone())
      .unwrap_or_default();
    names.sort();
    names
  }

  /// Forgets the early and factory state of a singleton whose creation failed.
  ///
  /// Every singleton that was handed its early reference is destroyed and
  /// forgotten as well, finished or not, together with their own
  /// dependents. A later lookup then rebuilds all of them around one new
  /// instance.
  pub fn discard(&self, name: &str) {
    self
      .slots
      .remove_if(name, |_, slot| !matches!(slot, Slot::Final(_)));
    for dependent in self.take_dependents(name) {
      self.destroy_singleton(&dependent);
    }
  }

  fn take_dependents(&self, name: &str) -> Vec<String> {
    self
      .dependents
      .remove(name)
      .map(|(_, dependents)| dependents)
      .unwrap_or_default()
  }

  // Removes one singleton, runs its disposal right away, then does the same for its dependents.
  fn destroy_singleton(&self, name: &str) {
    if self.slots.remove(name).is_some() {
      debug!(name, "discarding dependent of a failed singleton");
    }
    self.products.remove(name);
    let disposables: Vec<Disposable> = {
      let mut registered = self.disposables.lock();
      let (matching, rest): (Vec<Disposable>, Vec<Disposable>) = std::mem::take(&mut *registered)
        .into_iter()
        .partition(|d| d.name == name);
      *registered = rest;
      matching
    };
    for disposable in disposables.into_iter().rev() {
      if let Err(source) = disposable.destroy() {
        warn!(name, error = %source, "destroy method failed");
      }
    }
    for dependent in self.take_dependents(name) {
      self.destroy_singleton(&dependent);
    }
  }

  pub fn state(&self, name: &str) -> SlotState {
    match self.slots.get(name).as_deref() {
      None => SlotState::Empty,
      Some(Slot::Factory(_)) => SlotState::Factory,
      Some(Slot::Early(_)) => SlotState::Early,
      Some(Slot::Final(_)) => SlotState::Final,
    }
  }

  /// Sorted names of all finished singletons.
  pub fn finished_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .slots
      .iter()
      .filter(|e| matches!(e.value(), Slot::Final(_)))
      .map(|e| e.key().clone())
      .collect();
    names.sort();
    names
  }

  pub(crate) fn register_disposable(
    &self,
    name: &str,
    object: ObjectRef,
    tagged: bool,
    destroy_method: Option<String>,
  ) {
    self.disposables.lock().push(Disposable {
      name: name.to_owned(),
      object,
      tagged,
      destroy_method,
    });
  }

  /// Runs every registered disposal exactly once, most recent first.
  ///
  /// Failures are logged and do not stop the remaining disposals; the first
  /// one is returned.
  pub fn destroy_singletons(&self) -> Result<()> {
    let disposables = std::mem::take(&mut *self.disposables.lock());
    let mut first_error = None;
    for disposable in disposables.into_iter().rev() {
      debug!(name = %disposable.name, "destroying singleton");
      if let Err(source) = disposable.destroy() {
        warn!(name = %disposable.name, error = %source, "destroy method failed");
        first_error.get_or_insert(Error::Disposal {
          name: disposable.name,
          source,
        });
      }
    }
    self.slots.clear();
    self.dependents.clear();
    self.products.clear();
    first_error.map_or(Ok(()), Err)
  }
}
