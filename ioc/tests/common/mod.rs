// Shared fixtures for the integration tests.
#![allow(dead_code)]

use fibre_weave::{ClassInfo, InvocationError, Managed, ObjectRef, PropertyKind, Value};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log() -> Log {
  Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
  log.lock().clone()
}

// --- Car ---

#[derive(Default)]
pub struct Car {
  brand: Mutex<String>,
  pub drives: AtomicUsize,
}

impl Managed for Car {
  fn invoke(&self, method: &str, _: &[Value]) -> Result<Value, InvocationError> {
    match method {
      "getBrand" => Ok(self.brand.lock().clone().into()),
      "drive" => {
        self.drives.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{} is driving", self.brand.lock()).into())
      }
      "fail" => Err(InvocationError::failed("engine stalled")),
      _ => Err(InvocationError::NoSuchMethod {
        class: "Car".into(),
        method: method.into(),
      }),
    }
  }

  fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
    match name {
      "brand" => *self.brand.lock() = value.into_string()?,
      _ => {
        return Err(InvocationError::NoSuchProperty {
          class: "Car".into(),
          property: name.into(),
        })
      }
    }
    Ok(())
  }
}

/// `Car` without capability interfaces.
pub fn car_class() -> Arc<ClassInfo> {
  ClassInfo::builder("Car", Car::default)
    .property("brand", PropertyKind::Str)
    .methods(["getBrand", "drive", "fail"])
    .build()
}

/// `Car` declaring `drive` through the `Vehicle` interface.
pub fn vehicle_class() -> Arc<ClassInfo> {
  ClassInfo::builder("Car", Car::default)
    .property("brand", PropertyKind::Str)
    .methods(["getBrand", "fail"])
    .interface("Vehicle", ["drive"])
    .build()
}

// --- A and B: two types wired to each other ---

#[derive(Default)]
pub struct Linked {
  peer: Mutex<Option<ObjectRef>>,
  calls: AtomicUsize,
}

impl Linked {
  fn invoke(&self, class: &str, method: &str) -> Result<Value, InvocationError> {
    match method {
      "name" => {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(class.to_lowercase().into())
      }
      "peer" => Ok(self.peer().map(Value::Object).unwrap_or_default()),
      _ => Err(InvocationError::NoSuchMethod {
        class: class.into(),
        method: method.into(),
      }),
    }
  }

  fn set(&self, class: &str, expected: &str, name: &str, value: Value) -> Result<(), InvocationError> {
    if name != expected {
      return Err(InvocationError::NoSuchProperty {
        class: class.into(),
        property: name.into(),
      });
    }
    *self.peer.lock() = Some(value.into_object()?);
    Ok(())
  }

  pub fn peer(&self) -> Option<ObjectRef> {
    self.peer.lock().clone()
  }

  /// Calls that reached the raw instance.
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[derive(Default)]
pub struct A(pub Linked);

impl Managed for A {
  fn invoke(&self, method: &str, _: &[Value]) -> Result<Value, InvocationError> {
    self.0.invoke("A", method)
  }

  fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
    self.0.set("A", "b", name, value)
  }
}

#[derive(Default)]
pub struct B(pub Linked);

impl Managed for B {
  fn invoke(&self, method: &str, _: &[Value]) -> Result<Value, InvocationError> {
    self.0.invoke("B", method)
  }

  fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
    self.0.set("B", "a", name, value)
  }
}

pub fn a_class() -> Arc<ClassInfo> {
  ClassInfo::builder("A", A::default)
    .property("b", PropertyKind::Object)
    .methods(["name", "peer"])
    .build()
}

pub fn b_class() -> Arc<ClassInfo> {
  ClassInfo::builder("B", B::default)
    .property("a", PropertyKind::Object)
    .methods(["name", "peer"])
    .build()
}

// --- A resource recording its lifecycle ---

pub struct Resource {
  label: Mutex<String>,
  log: Log,
}

impl Resource {
  pub fn new(log: Log) -> Self {
    Self {
      label: Mutex::new(String::new()),
      log,
    }
  }

  fn record(&self, event: &str) {
    self
      .log
      .lock()
      .push(format!("{}:{}", self.label.lock(), event));
  }
}

impl Managed for Resource {
  fn invoke(&self, method: &str, _: &[Value]) -> Result<Value, InvocationError> {
    match method {
      "open" | "close" | "work" => {
        self.record(method);
        Ok(Value::Null)
      }
      "explode" => Err(InvocationError::failed("boom")),
      _ => Err(InvocationError::NoSuchMethod {
        class: "Resource".into(),
        method: method.into(),
      }),
    }
  }

  fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
    match name {
      "label" => *self.label.lock() = value.into_string()?,
      _ => {
        return Err(InvocationError::NoSuchProperty {
          class: "Resource".into(),
          property: name.into(),
        })
      }
    }
    Ok(())
  }

  fn after_properties_set(&self) -> Result<(), InvocationError> {
    self.record("init");
    Ok(())
  }

  fn destroy(&self) -> Result<(), InvocationError> {
    self.record("destroy");
    Ok(())
  }
}

/// A tagged initializing and disposable resource with `open`, `close`,
/// `work` and `explode` methods, writing its events to `log`.
pub fn resource_class(log: &Log) -> Arc<ClassInfo> {
  let log = Arc::clone(log);
  ClassInfo::builder("Resource", move || Resource::new(Arc::clone(&log)))
    .property("label", PropertyKind::Str)
    .methods(["open", "close", "work", "explode"])
    .initializing()
    .disposable()
    .build()
}
