//! Public macros for ergonomic object lookup and invocation.

/// Looks an object up in the given container, returning `Option`.
///
/// Accepts the same forms as [`resolve!`], prefixed by the container:
///
/// ```
/// use fibre_weave::{maybe_resolve_from, Container};
///
/// let container = Container::new();
/// assert!(maybe_resolve_from!(&container, "missing").is_none());
/// ```
#[macro_export]
macro_rules! maybe_resolve_from {
  ($container:expr, $name:literal) => {
    $container.get($name).ok()
  };
  ($container:expr, name $name:expr) => {
    $container.get(::std::convert::AsRef::<str>::as_ref(&$name)).ok()
  };
  ($container:expr, capability $interface:expr) => {
    $container.get_by_capability($interface).ok()
  };
  ($container:expr, $type:ty) => {
    $container.get_by_type::<$type>().ok()
  };
  ($container:expr, $type:ty, $name:expr) => {
    $container.get_as::<$type>($name).ok()
  };
}

/// Looks an object up in the given container, panicking if it cannot be
/// provided.
///
/// - `resolve_from!(c, "name")` returns the exposed [`ObjectRef`](crate::ObjectRef).
/// - `resolve_from!(c, name expr)` does the same for a name held in a variable.
/// - `resolve_from!(c, capability "Iface")` returns the only object declaring the interface.
/// - `resolve_from!(c, Type)` returns the only object of type `Type`.
/// - `resolve_from!(c, Type, "name")` returns the raw `Arc<Type>` behind `name`.
#[macro_export]
macro_rules! resolve_from {
  ($container:expr, $name:literal) => {
    $container
      .get($name)
      .unwrap_or_else(|e| panic!("Failed to resolve required object '{}': {}", $name, e))
  };
  ($container:expr, name $name:expr) => {
    $container
      .get(::std::convert::AsRef::<str>::as_ref(&$name))
      .unwrap_or_else(|e| panic!("Failed to resolve required object '{}': {}", $name, e))
  };
  ($container:expr, capability $interface:expr) => {
    $container.get_by_capability($interface).unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required capability '{}': {}",
        $interface, e
      )
    })
  };
  ($container:expr, $type:ty) => {
    $container.get_by_type::<$type>().unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required object of type {}: {}",
        std::any::type_name::<$type>(),
        e
      )
    })
  };
  ($container:expr, $type:ty, $name:expr) => {
    $container.get_as::<$type>($name).unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required object '{}' as {}: {}",
        $name,
        std::any::type_name::<$type>(),
        e
      )
    })
  };
}

/// Looks an object up in the global container, panicking if it cannot be
/// provided. See [`resolve_from!`] for the accepted forms.
///
/// ```
/// use fibre_weave::{global, resolve, ClassInfo, InvocationError, Managed, ObjectDescriptor, Value};
///
/// struct Clock;
/// impl Managed for Clock {
///   fn invoke(&self, method: &str, _: &[Value]) -> Result<Value, InvocationError> {
///     match method {
///       "now" => Ok(Value::Int(42)),
///       _ => Err(InvocationError::failed(method)),
///     }
///   }
/// }
///
/// let class = ClassInfo::builder("Clock", || Clock).method("now").build();
/// global().register(ObjectDescriptor::new("doc_clock", class)).unwrap();
///
/// let clock = resolve!("doc_clock");
/// assert_eq!(clock.invoke("now", &[]).unwrap(), Value::Int(42));
/// ```
#[macro_export]
macro_rules! resolve {
  ($($args:tt)+) => {
    $crate::resolve_from!($crate::global(), $($args)+)
  };
}

/// Like [`resolve!`], returning `Option` instead of panicking.
#[macro_export]
macro_rules! maybe_resolve {
  ($($args:tt)+) => {
    $crate::maybe_resolve_from!($crate::global(), $($args)+)
  };
}

/// Calls a method on an [`ObjectRef`](crate::ObjectRef), converting each
/// argument into a [`Value`](crate::Value).
///
/// ```ignore
/// let total = invoke!(calculator, "add", 2, 3)?;
/// ```
#[macro_export]
macro_rules! invoke {
  ($object:expr, $method:expr) => {
    $object.invoke($method, &[])
  };
  ($object:expr, $method:expr, $($arg:expr),+ $(,)?) => {
    $object.invoke($method, &[$($crate::Value::from($arg)),+])
  };
}
