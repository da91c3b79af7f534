mod common;

use common::{car_class, entries, log, resource_class, vehicle_class, Log, A};
use fibre_weave::{
  Advice, Advisor, AnyPointcut, ClassInfo, Container, Error, FnPointcut, InvocationError,
  ObjectDescriptor, ProxyStrategy, Value,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn porsche(container: &Container) {
  container
    .register(ObjectDescriptor::new("car", car_class()).value("brand", "porsche"))
    .unwrap();
}

fn recording(log: &Log, entry: &'static str) -> Advice {
  let log = Arc::clone(log);
  Advice::before(move |_| {
    log.lock().push(entry.to_owned());
    Ok(())
  })
}

#[test]
fn test_car_scenario() {
  let container = Container::new();
  porsche(&container);
  let tags = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&tags);
  container.add_advisor(Advisor::for_pattern("Car.*").unwrap().with(Advice::before(
    move |inv| {
      let _tag = inv.method().name.to_uppercase();
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(())
    },
  )));

  let first = container.get("car").unwrap();
  let second = container.get("car").unwrap();
  assert_eq!(first, second);
  assert!(first.is_proxy());

  assert_eq!(first.invoke("getBrand", &[]).unwrap(), Value::from("porsche"));
  assert_eq!(tags.load(Ordering::SeqCst), 1);
  assert_eq!(second.invoke("getBrand", &[]).unwrap(), Value::from("porsche"));
  assert_eq!(tags.load(Ordering::SeqCst), 2);
}

// Runs the target and each advice kind once, with the advisors registered in `order`.
fn run_in_order(order: &[&str]) -> Vec<String> {
  let events = log();
  let container = Container::new();
  container
    .register(ObjectDescriptor::new("res", resource_class(&events)).value("label", "res"))
    .unwrap();
  for kind in order {
    let log = Arc::clone(&events);
    let advice = match *kind {
      "before" => recording(&events, "before"),
      "after" => Advice::after(move |_| {
        log.lock().push("after".into());
        Ok(())
      }),
      "after_returning" => Advice::after_returning(move |value, _| {
        log.lock().push("after_returning".into());
        Ok(value)
      }),
      "around" => Advice::around(move |inv| {
        log.lock().push("around in".into());
        let result = inv.proceed();
        log.lock().push("around out".into());
        result
      }),
      other => panic!("unknown advice kind {other}"),
    };
    container.add_advisor(Advisor::for_pattern("Resource.work").unwrap().with(advice));
  }

  let res = container.get("res").unwrap();
  events.lock().clear();
  res.invoke("work", &[]).unwrap();
  entries(&events)
}

fn position(events: &[String], entry: &str) -> usize {
  events
    .iter()
    .position(|e| e == entry)
    .unwrap_or_else(|| panic!("{entry} missing from {events:?}"))
}

#[test]
fn test_advice_placement_does_not_depend_on_registration_order() {
  let orders: [&[&str]; 3] = [
    &["before", "after", "after_returning", "around"],
    &["after", "after_returning", "around", "before"],
    &["around", "after_returning", "before", "after"],
  ];
  for order in orders {
    let events = run_in_order(order);
    assert_eq!(events.len(), 6, "{events:?}");
    let target = position(&events, "res:work");
    assert!(position(&events, "before") < target, "{events:?}");
    assert!(position(&events, "around in") < target, "{events:?}");
    assert!(position(&events, "around out") > target, "{events:?}");
    assert!(position(&events, "after") > target, "{events:?}");
    assert!(position(&events, "after_returning") > target, "{events:?}");
  }
}

#[test]
fn test_chain_follows_registration_order() {
  let events = log();
  let container = Container::new();
  container
    .register(ObjectDescriptor::new("res", resource_class(&events)).value("label", "res"))
    .unwrap();
  container.add_advisor(
    Advisor::for_pattern("Resource.*")
      .unwrap()
      .with(recording(&events, "first"))
      .with(recording(&events, "second")),
  );
  container.add_advisor(Advisor::for_pattern("*.work").unwrap().with(recording(&events, "third")));

  let res = container.get("res").unwrap();
  events.lock().clear();
  res.invoke("work", &[]).unwrap();
  assert_eq!(entries(&events), ["first", "second", "third", "res:work"]);

  events.lock().clear();
  res.invoke("open", &[]).unwrap();
  assert_eq!(entries(&events), ["first", "second", "res:open"]);
}

#[test]
fn test_unmatched_objects_are_not_proxied() {
  let container = Container::new();
  porsche(&container);
  container.add_advisor(Advisor::for_pattern("Boat.*").unwrap().with(Advice::before(|_| {
    Err(InvocationError::failed("should never run"))
  })));

  let car = container.get("car").unwrap();
  assert!(!car.is_proxy());
  assert_eq!(car.invoke("getBrand", &[]).unwrap(), Value::from("porsche"));
}

#[test]
fn test_unmatched_methods_of_a_proxy_call_the_target_directly() {
  let container = Container::new();
  porsche(&container);
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  container.add_advisor(Advisor::for_pattern("Car.drive").unwrap().with(Advice::before(
    move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(())
    },
  )));

  let car = container.get("car").unwrap();
  assert!(car.is_proxy());
  let class = car.class();
  assert!(container
    .chains()
    .chain(class.method("getBrand").unwrap(), class)
    .is_empty());

  car.invoke("getBrand", &[]).unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 0);
  car.invoke("drive", &[]).unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_chains_are_cached_per_method() {
  let container = Container::new();
  container.add_advisor(Advisor::new(AnyPointcut).with(Advice::before(|_| Ok(()))));
  let class = car_class();
  let method = class.method("drive").unwrap();

  let first = container.chains().chain(method, &class);
  let second = container.chains().chain(method, &class);
  assert_eq!(first.len(), 1);
  assert!(Arc::ptr_eq(&first, &second));

  // A new advisor invalidates the cached chains.
  container.add_advisor(Advisor::new(AnyPointcut).with(Advice::after(|_| Ok(()))));
  let third = container.chains().chain(method, &class);
  assert_eq!(third.len(), 2);
  assert!(!Arc::ptr_eq(&first, &third));
}

fn counting(counter: &Arc<AtomicUsize>) -> Advice {
  let counter = Arc::clone(counter);
  Advice::before(move |_| {
    counter.fetch_add(1, Ordering::SeqCst);
    Ok(())
  })
}

#[test]
fn test_classes_sharing_a_type_get_their_own_chains() {
  let container = Container::new();
  let orders = ClassInfo::builder("Orders", A::default)
    .methods(["name", "peer"])
    .build();
  let billing = ClassInfo::builder("Billing", A::default)
    .methods(["name", "peer"])
    .build();
  container.register(ObjectDescriptor::new("orders", orders)).unwrap();
  container.register(ObjectDescriptor::new("billing", billing)).unwrap();

  let orders_advice = Arc::new(AtomicUsize::new(0));
  let billing_advice = Arc::new(AtomicUsize::new(0));
  container.add_advisor(Advisor::for_pattern("Orders.*").unwrap().with(counting(&orders_advice)));
  container.add_advisor(Advisor::for_pattern("Billing.*").unwrap().with(counting(&billing_advice)));

  container.get("orders").unwrap().invoke("name", &[]).unwrap();
  container.get("billing").unwrap().invoke("name", &[]).unwrap();
  assert_eq!(orders_advice.load(Ordering::SeqCst), 1);
  assert_eq!(billing_advice.load(Ordering::SeqCst), 1);
}

#[test]
fn test_predicate_pointcuts_select_methods() {
  let container = Container::new();
  porsche(&container);
  let pointcut = FnPointcut::new(
    |class: &ClassInfo| class.name() == "Car",
    |method: &fibre_weave::MethodInfo, _: &ClassInfo| method.name.starts_with("get"),
  );
  container.add_advisor(Advisor::new(pointcut).with(Advice::after_returning(|value, _| {
    Ok(Value::from(value.into_string()?.to_uppercase()))
  })));

  let car = container.get("car").unwrap();
  assert_eq!(car.invoke("getBrand", &[]).unwrap(), Value::from("PORSCHE"));
  assert_eq!(
    car.invoke("drive", &[]).unwrap(),
    Value::from("porsche is driving")
  );
}

#[test]
fn test_around_advice_can_rewrite_arguments_and_results() {
  let container = Container::new();
  let class = ClassInfo::builder("Echo", Echo::default).method("echo").build();
  container
    .register(ObjectDescriptor::new("echo", class))
    .unwrap();
  container.add_advisor(Advisor::for_pattern("Echo.echo").unwrap().with(Advice::around(|inv| {
    inv.arguments_mut().push(Value::from("extra"));
    let value = inv.proceed()?;
    Ok(Value::List(vec![value, Value::from(inv.position())]))
  })));

  let echo = container.get("echo").unwrap();
  assert_eq!(
    echo.invoke("echo", &["x".into()]).unwrap(),
    Value::List(vec![Value::from(vec!["x", "extra"]), Value::Int(1)])
  );
}

#[derive(Default)]
struct Echo;

impl fibre_weave::Managed for Echo {
  fn invoke(&self, _: &str, args: &[Value]) -> Result<Value, InvocationError> {
    Ok(Value::List(args.to_vec()))
  }
}

#[test]
fn test_before_advice_failure_prevents_the_call() {
  let events = log();
  let container = Container::new();
  container
    .register(ObjectDescriptor::new("res", resource_class(&events)).value("label", "res"))
    .unwrap();
  container.add_advisor(Advisor::for_pattern("Resource.work").unwrap().with(Advice::before(
    |_| Err(InvocationError::failed("denied")),
  )));

  let res = container.get("res").unwrap();
  events.lock().clear();
  assert_eq!(
    res.invoke("work", &[]).unwrap_err(),
    InvocationError::failed("denied")
  );
  assert!(entries(&events).is_empty());
}

#[test]
fn test_after_throwing_can_substitute_a_result() {
  let container = Container::new();
  porsche(&container);
  container.add_advisor(
    Advisor::for_pattern("Car.fail")
      .unwrap()
      .with(Advice::after_throwing(|err, _| {
        Ok(Value::from(format!("recovered from {err}")))
      })),
  );

  let car = container.get("car").unwrap();
  assert_eq!(
    car.invoke("fail", &[]).unwrap(),
    Value::from("recovered from engine stalled")
  );
}

#[test]
fn test_after_throwing_can_reraise() {
  let container = Container::new();
  porsche(&container);
  let seen = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&seen);
  container.add_advisor(Advisor::new(AnyPointcut).with(Advice::after_throwing(move |err, _| {
    counter.fetch_add(1, Ordering::SeqCst);
    Err(err)
  })));

  let car = container.get("car").unwrap();
  assert_eq!(car.invoke("getBrand", &[]).unwrap(), Value::from("porsche"));
  assert_eq!(seen.load(Ordering::SeqCst), 0);
  assert_eq!(
    car.invoke("fail", &[]).unwrap_err(),
    InvocationError::failed("engine stalled")
  );
  assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_after_advice_runs_when_the_target_fails() {
  let container = Container::new();
  porsche(&container);
  let runs = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&runs);
  container.add_advisor(Advisor::for_pattern("Car.fail").unwrap().with(Advice::after(
    move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
      Err(InvocationError::failed("cleanup failed"))
    },
  )));

  let car = container.get("car").unwrap();
  // The target's failure wins over the advice's own.
  assert_eq!(
    car.invoke("fail", &[]).unwrap_err(),
    InvocationError::failed("engine stalled")
  );
  assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_after_returning_is_skipped_on_failure() {
  let container = Container::new();
  porsche(&container);
  let runs = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&runs);
  container.add_advisor(Advisor::new(AnyPointcut).with(Advice::after_returning(
    move |value, _| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(value)
    },
  )));

  let car = container.get("car").unwrap();
  assert!(car.invoke("fail", &[]).is_err());
  assert_eq!(runs.load(Ordering::SeqCst), 0);
  car.invoke("drive", &[]).unwrap();
  assert_eq!(runs.load(Ordering::SeqCst), 1);
}

// --- Proxy strategies ---

fn vehicle(container: &Container) {
  container
    .register(ObjectDescriptor::new("car", vehicle_class()).value("brand", "saab"))
    .unwrap();
  container.add_advisor(Advisor::new(AnyPointcut).with(Advice::before(|_| Ok(()))));
}

#[test]
fn test_interface_proxy_exposes_only_the_capability_surface() {
  let container = Container::new();
  vehicle(&container);

  let car = container.get("car").unwrap();
  assert!(car.is_proxy());
  assert_eq!(car.invoke("drive", &[]).unwrap(), Value::from("saab is driving"));
  assert_eq!(
    car.invoke("getBrand", &[]).unwrap_err(),
    InvocationError::NoSuchMethod {
      class: "Car".into(),
      method: "getBrand".into()
    }
  );
  assert!(matches!(
    car.set_property("brand", "volvo".into()),
    Err(InvocationError::NoSuchProperty { .. })
  ));
}

#[test]
fn test_class_proxy_exposes_every_method() {
  let container = Container::builder()
    .proxy_strategy(ProxyStrategy::Class)
    .build();
  vehicle(&container);

  let car = container.get("car").unwrap();
  assert!(car.is_proxy());
  assert_eq!(car.invoke("getBrand", &[]).unwrap(), Value::from("saab"));
  assert_eq!(car.invoke("drive", &[]).unwrap(), Value::from("saab is driving"));
}

#[test]
fn test_sealed_class_cannot_get_a_class_proxy() {
  let container = Container::new();
  let sealed = ClassInfo::builder("Sealed", Echo::default)
    .method("echo")
    .sealed()
    .build();
  container
    .register(ObjectDescriptor::new("sealed", sealed))
    .unwrap();
  container.add_advisor(Advisor::new(AnyPointcut).with(Advice::before(|_| Ok(()))));

  let err = container.get("sealed").unwrap_err();
  assert!(matches!(err.root_cause(), Error::ProxyGeneration { class, .. } if class == "Sealed"));
}

#[test]
fn test_interface_strategy_needs_an_interface() {
  let container = Container::builder()
    .proxy_strategy(ProxyStrategy::Interface)
    .build();
  porsche(&container);
  container.add_advisor(Advisor::new(AnyPointcut).with(Advice::before(|_| Ok(()))));

  let err = container.get("car").unwrap_err();
  assert!(matches!(err.root_cause(), Error::ProxyGeneration { .. }));
}

#[test]
fn test_rules_load_from_a_source() {
  let container = Container::new();
  porsche(&container);
  let rules = vec![
    Advisor::for_pattern("Car.getBrand")
      .unwrap()
      .named("shout")
      .with(Advice::after_returning(|value, _| {
        Ok(Value::from(format!("{}!", value.into_string()?)))
      })),
  ];
  assert_eq!(container.load_rules(&rules), 1);

  let car = container.get("car").unwrap();
  assert_eq!(car.invoke("getBrand", &[]).unwrap(), Value::from("porsche!"));
}
