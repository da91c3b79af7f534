use fibre_weave::{global, resolve, ClassInfo, InvocationError, Managed, ObjectDescriptor, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

// A simple object that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

impl Managed for RequestTracker {
  fn invoke(&self, method: &str, _: &[Value]) -> Result<Value, InvocationError> {
    match method {
      "id" => Ok(Value::from(self.id)),
      _ => Err(InvocationError::failed(format!("no method {method}"))),
    }
  }
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() -> fibre_weave::Result<()> {
  let tracker = ClassInfo::builder("RequestTracker", || {
    println!("Creating RequestTracker...");
    RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    }
  })
  .method("id")
  .build();

  // The singleton is created once; the prototype on every lookup.
  global().register(ObjectDescriptor::new("singleton_tracker", tracker.clone()))?;
  global().register(ObjectDescriptor::new("transient_tracker", tracker).prototype())?;

  println!("--- Resolving Singletons ---");
  let s1 = resolve!("singleton_tracker");
  let s2 = resolve!("singleton_tracker");
  println!(
    "Singleton 1 ID: {:?}, Singleton 2 ID: {:?}",
    s1.invoke("id", &[])?,
    s2.invoke("id", &[])?
  );
  assert_eq!(s1, s2, "Singleton references should be identical");
  println!("Singleton references are the same object, as expected.\n");

  println!("--- Resolving Prototypes ---");
  let t1 = resolve!("transient_tracker");
  let t2 = resolve!("transient_tracker");
  println!(
    "Prototype 1 ID: {:?}, Prototype 2 ID: {:?}",
    t1.invoke("id", &[])?,
    t2.invoke("id", &[])?
  );
  assert_ne!(t1, t2, "Prototype references should be different");
  println!("Prototype references are different objects, as expected.");
  Ok(())
}
