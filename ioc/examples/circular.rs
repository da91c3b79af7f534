//! Two singletons referring to each other, one of them proxied.
//!
//! Run with `cargo run --example circular` to see the creation steps logged.

use fibre_weave::{
  Advice, Advisor, ClassInfo, Container, InvocationError, Managed, ObjectDescriptor, ObjectRef,
  PropertyKind, Value,
};
use parking_lot::Mutex;

#[derive(Default)]
struct Service {
  name: &'static str,
  peer: Mutex<Option<ObjectRef>>,
}

impl Managed for Service {
  fn invoke(&self, method: &str, _: &[Value]) -> Result<Value, InvocationError> {
    match method {
      "name" => Ok(self.name.into()),
      "peer" => Ok(self.peer.lock().clone().map(Value::Object).unwrap_or_default()),
      _ => Err(InvocationError::failed(format!("no method {method}"))),
    }
  }

  fn set_property(&self, _: &str, value: Value) -> Result<(), InvocationError> {
    *self.peer.lock() = Some(value.into_object()?);
    Ok(())
  }
}

fn main() -> fibre_weave::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();

  let orders = ClassInfo::builder("Orders", || Service {
    name: "orders",
    ..Default::default()
  })
  .property("billing", PropertyKind::Object)
  .methods(["name", "peer"])
  .build();
  let billing = ClassInfo::builder("Billing", || Service {
    name: "billing",
    ..Default::default()
  })
  .property("orders", PropertyKind::Object)
  .methods(["name", "peer"])
  .build();

  let container = Container::new();
  container.register(ObjectDescriptor::new("orders", orders).reference("billing", "billing"))?;
  container.register(ObjectDescriptor::new("billing", billing).reference("orders", "orders"))?;
  container.add_advisor(Advisor::for_pattern("Orders.name")?.with(Advice::before(|inv| {
    println!("  -> calling {}.{}", inv.class().name(), inv.method().name);
    Ok(())
  })));

  container.refresh()?;

  let orders = container.get("orders")?;
  let billing = container.get("billing")?;
  let orders_seen_by_billing = billing.invoke("peer", &[])?.into_object()?;

  println!("orders is a proxy: {}", orders.is_proxy());
  println!(
    "billing holds the same orders reference: {}",
    orders_seen_by_billing == orders
  );
  println!("orders.name() = {:?}", orders_seen_by_billing.invoke("name", &[])?);
  container.shutdown()
}
