//! Every advice kind around one method, plus a fallback on failure.

use fibre_weave::{
  invoke, Advice, Advisor, ClassInfo, Container, InvocationError, Managed, ObjectDescriptor,
  Value,
};
use std::time::Instant;

struct Calculator;

impl Managed for Calculator {
  fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
    let a = args.first().and_then(Value::as_int).unwrap_or_default();
    let b = args.get(1).and_then(Value::as_int).unwrap_or_default();
    match method {
      "add" => Ok(Value::Int(a + b)),
      "divide" if b == 0 => Err(InvocationError::failed("division by zero")),
      "divide" => Ok(Value::Int(a / b)),
      _ => Err(InvocationError::failed(format!("no method {method}"))),
    }
  }
}

fn main() -> fibre_weave::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_target(false)
    .init();

  let container = Container::new();
  let class = ClassInfo::builder("Calculator", || Calculator)
    .interface("Arithmetic", ["add", "divide"])
    .build();
  container.register(ObjectDescriptor::new("calculator", class))?;

  container.add_advisor(
    Advisor::for_pattern("Arithmetic.*")?
      .named("tracing")
      .with(Advice::after(|inv| {
        println!("  after {}", inv.method().name);
        Ok(())
      }))
      .with(Advice::before(|inv| {
        println!("  before {}{:?}", inv.method().name, inv.arguments());
        Ok(())
      }))
      .with(Advice::around(|inv| {
        let started = Instant::now();
        let result = inv.proceed();
        println!("  {} took {:?}", inv.method().name, started.elapsed());
        result
      }))
      .with(Advice::after_returning(|value, _| {
        println!("  returned {value:?}");
        Ok(value)
      })),
  );
  container.add_advisor(
    Advisor::for_pattern("Calculator.divide")?
      .named("fallback")
      .with(Advice::after_throwing(|err, _| {
        println!("  recovering from '{err}'");
        Ok(Value::Null)
      })),
  );

  let calculator = container.get("calculator")?;
  println!("add(2, 3):");
  println!("= {:?}", invoke!(calculator, "add", 2, 3)?);
  println!("divide(1, 0):");
  println!("= {:?}", invoke!(calculator, "divide", 1, 0)?);
  Ok(())
}
