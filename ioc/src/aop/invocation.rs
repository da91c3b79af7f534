//! Chain execution for one intercepted call.

use crate::aop::chain::Chain;
use crate::class::{ClassInfo, MethodInfo};
use crate::error::InvocationError;
use crate::object::ObjectRef;
use crate::value::Value;
use std::sync::Arc;
use tracing::trace;

/// The state of one call travelling through an interceptor chain.
///
/// Each interceptor receives the invocation and calls [`proceed`](Self::proceed)
/// to hand control to the next one; the last `proceed` calls the target. The
/// cursor lives here, so concurrent calls of the same method never share it.
pub struct MethodInvocation<'a> {
  target: &'a ObjectRef,
  class: &'a ClassInfo,
  method: &'a MethodInfo,
  arguments: Vec<Value>,
  chain: Chain,
  // Number of interceptors entered so far.
  cursor: usize,
}

impl<'a> MethodInvocation<'a> {
  pub(crate) fn new(
    target: &'a ObjectRef,
    class: &'a ClassInfo,
    method: &'a MethodInfo,
    arguments: Vec<Value>,
    chain: Chain,
  ) -> Self {
    Self {
      target,
      class,
      method,
      arguments,
      chain,
      cursor: 0,
    }
  }

  /// Runs the next interceptor, or the target once the chain is exhausted.
  pub fn proceed(&mut self) -> Result<Value, InvocationError> {
    if self.cursor == self.chain.len() {
      trace!(class = %self.class.name(), method = %self.method.name, "invoking target");
      return self.target.invoke(&self.method.name, &self.arguments);
    }
    let interceptor = Arc::clone(&self.chain[self.cursor]);
    self.cursor += 1;
    trace!(method = %self.method.name, position = self.cursor, "entering interceptor");
    interceptor.invoke(self)
  }

  pub fn method(&self) -> &MethodInfo {
    self.method
  }

  pub fn class(&self) -> &ClassInfo {
    self.class
  }

  pub fn arguments(&self) -> &[Value] {
    &self.arguments
  }

  /// Arguments as the target will receive them; interceptors may rewrite them.
  pub fn arguments_mut(&mut self) -> &mut Vec<Value> {
    &mut self.arguments
  }

  /// The raw target the call ends at.
  pub fn this(&self) -> &ObjectRef {
    self.target
  }

  /// How many interceptors have been entered so far.
  pub fn position(&self) -> usize {
    self.cursor
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aop::advice::{Advice, MethodInterceptor};
  use crate::class::ClassInfo;
  use crate::object::Managed;
  use parking_lot::Mutex;

  struct Echo;
  impl Managed for Echo {
    fn invoke(&self, _: &str, args: &[Value]) -> Result<Value, InvocationError> {
      Ok(args.first().cloned().unwrap_or_default())
    }
  }

  fn chain(advice: Vec<Advice>) -> Chain {
    advice
      .into_iter()
      .map(Advice::into_interceptor)
      .collect::<Vec<Arc<dyn MethodInterceptor>>>()
      .into()
  }

  #[test]
  fn around_interceptors_nest_in_chain_order() {
    let class = ClassInfo::builder("Echo", || Echo).method("echo").build();
    let target = ObjectRef::new(Echo, Arc::clone(&class));
    let log = Arc::new(Mutex::new(Vec::new()));
    let (outer, inner) = (Arc::clone(&log), Arc::clone(&log));
    let chain = chain(vec![
      Advice::around(move |inv| {
        outer.lock().push("outer in");
        let result = inv.proceed();
        outer.lock().push("outer out");
        result
      }),
      Advice::around(move |inv| {
        inner.lock().push("inner");
        inv.arguments_mut()[0] = Value::from("rewritten");
        inv.proceed()
      }),
    ]);
    let method = class.method("echo").unwrap();
    let mut invocation = MethodInvocation::new(&target, &class, method, vec!["x".into()], chain);
    assert_eq!(invocation.proceed().unwrap(), Value::from("rewritten"));
    assert_eq!(*log.lock(), ["outer in", "inner", "outer out"]);
  }

  #[test]
  fn an_empty_chain_calls_the_target() {
    let class = ClassInfo::builder("Echo", || Echo).method("echo").build();
    let target = ObjectRef::new(Echo, Arc::clone(&class));
    let method = class.method("echo").unwrap();
    let mut invocation = MethodInvocation::new(&target, &class, method, vec![7.into()], chain(vec![]));
    assert_eq!(invocation.proceed().unwrap(), Value::Int(7));
    assert_eq!(invocation.position(), 0);
  }
}
