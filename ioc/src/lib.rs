//! # Fibre Weave
//!
//! An object container with method interception.
//!
//! Objects are described by [`ObjectDescriptor`]s: a name, a [`ClassInfo`]
//! (construction recipe plus the properties, methods and capability
//! interfaces the type declares), a scope and the property values to wire
//! in. The [`Container`] creates objects on demand, keeps one shared
//! instance per singleton, and resolves circular references between
//! singletons by exposing them before they are fully built.
//!
//! [`Advisor`]s pair a [`Pointcut`] with ordered [`Advice`]. Every object an
//! advisor applies to is handed out wrapped in a proxy, and calls to the
//! matched methods run through an interceptor chain. This also holds for
//! objects exposed early in a circular reference: dependents and later
//! callers see the same proxy.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_weave::{
//!   Advice, Advisor, ClassInfo, Container, InvocationError, Managed, ObjectDescriptor,
//!   PropertyKind, Value,
//! };
//! use parking_lot::Mutex;
//!
//! #[derive(Default)]
//! struct Greeter {
//!   greeting: Mutex<String>,
//! }
//!
//! impl Managed for Greeter {
//!   fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
//!     match method {
//!       "greet" => {
//!         let who = args.first().and_then(Value::as_str).unwrap_or("world");
//!         Ok(format!("{}, {}!", self.greeting.lock(), who).into())
//!       }
//!       _ => Err(InvocationError::failed(format!("unknown method {method}"))),
//!     }
//!   }
//!
//!   fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
//!     match name {
//!       "greeting" => *self.greeting.lock() = value.into_string()?,
//!       _ => return Err(InvocationError::failed(format!("unknown property {name}"))),
//!     }
//!     Ok(())
//!   }
//! }
//!
//! let container = Container::new();
//! let class = ClassInfo::builder("Greeter", Greeter::default)
//!   .property("greeting", PropertyKind::Str)
//!   .method("greet")
//!   .build();
//! container
//!   .register(ObjectDescriptor::new("greeter", class).value("greeting", "Hello"))
//!   .unwrap();
//! container.add_advisor(
//!   Advisor::for_pattern("Greeter.greet")
//!     .unwrap()
//!     .with(Advice::after_returning(|value, _| {
//!       Ok(format!("{} :)", value.as_str().unwrap_or_default()).into())
//!     })),
//! );
//!
//! let greeter = container.get("greeter").unwrap();
//! assert!(greeter.is_proxy());
//! assert_eq!(
//!   greeter.invoke("greet", &["Rust".into()]).unwrap(),
//!   Value::from("Hello, Rust! :)")
//! );
//! ```

pub mod aop;
mod class;
mod config;
mod container;
mod core;
mod descriptor;
mod error;
mod global;
mod hooks;
mod macros;
mod object;
mod resolver;
mod singleton;
mod value;

pub use aop::{
  Advice, Advisor, AnyPointcut, ChainAssembler, FnPointcut, MethodInterceptor, MethodInvocation,
  NamePatternPointcut, Pointcut, ProxyFactory, RuleSource,
};
pub use class::{ClassBuilder, ClassInfo, InterfaceInfo, MethodInfo, PropertyInfo, PropertyKind};
pub use config::{ContainerConfig, ProxyStrategy};
pub use container::{Container, ContainerBuilder, FACTORY_PREFIX};
pub use descriptor::{
  DescriptorSource, DescriptorStore, ObjectDescriptor, PropertySource, PropertyValue, Scope,
};
pub use error::{Error, InvocationError, Result};
pub use global::global;
pub use hooks::{DescriptorPostProcessor, HookRegistry, ObjectPostProcessor};
pub use object::{Managed, ObjectRef};
pub use resolver::{StandardValueResolver, ValueResolver};
pub use singleton::{SingletonRegistry, SlotState};
pub use value::Value;
