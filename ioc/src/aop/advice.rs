//! Advice kinds and the interceptors that give each one its wrapping discipline.
//!
//! Every advice is adapted to a [`MethodInterceptor`]. Where an adapter calls
//! [`MethodInvocation::proceed`] within its own body is what places its
//! advice before or after the target call, whatever the chain order is.

use crate::aop::invocation::MethodInvocation;
use crate::error::InvocationError;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// The uniform contract of every chain element.
pub trait MethodInterceptor: Send + Sync {
  fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Value, InvocationError>;
}

impl<F> MethodInterceptor for F
where
  F: Fn(&mut MethodInvocation<'_>) -> Result<Value, InvocationError> + Send + Sync,
{
  fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Value, InvocationError> {
    self(invocation)
  }
}

/// Runs before the target call. A failure prevents the call.
pub trait BeforeAdvice: Send + Sync {
  fn before(&self, invocation: &MethodInvocation<'_>) -> Result<(), InvocationError>;
}

impl<F> BeforeAdvice for F
where
  F: Fn(&MethodInvocation<'_>) -> Result<(), InvocationError> + Send + Sync,
{
  fn before(&self, invocation: &MethodInvocation<'_>) -> Result<(), InvocationError> {
    self(invocation)
  }
}

/// Runs after the target call, whether it returned or failed.
pub trait AfterAdvice: Send + Sync {
  fn after(&self, invocation: &MethodInvocation<'_>) -> Result<(), InvocationError>;
}

impl<F> AfterAdvice for F
where
  F: Fn(&MethodInvocation<'_>) -> Result<(), InvocationError> + Send + Sync,
{
  fn after(&self, invocation: &MethodInvocation<'_>) -> Result<(), InvocationError> {
    self(invocation)
  }
}

/// Runs after the target call returned; may rewrite the returned value.
pub trait AfterReturningAdvice: Send + Sync {
  fn after_returning(
    &self,
    value: Value,
    invocation: &MethodInvocation<'_>,
  ) -> Result<Value, InvocationError>;
}

impl<F> AfterReturningAdvice for F
where
  F: Fn(Value, &MethodInvocation<'_>) -> Result<Value, InvocationError> + Send + Sync,
{
  fn after_returning(
    &self,
    value: Value,
    invocation: &MethodInvocation<'_>,
  ) -> Result<Value, InvocationError> {
    self(value, invocation)
  }
}

/// Runs when the target call failed. Returning `Ok` substitutes a result,
/// returning `Err` re-raises (the same or another error).
pub trait AfterThrowingAdvice: Send + Sync {
  fn after_throwing(
    &self,
    error: InvocationError,
    invocation: &MethodInvocation<'_>,
  ) -> Result<Value, InvocationError>;
}

impl<F> AfterThrowingAdvice for F
where
  F: Fn(InvocationError, &MethodInvocation<'_>) -> Result<Value, InvocationError> + Send + Sync,
{
  fn after_throwing(
    &self,
    error: InvocationError,
    invocation: &MethodInvocation<'_>,
  ) -> Result<Value, InvocationError> {
    self(error, invocation)
  }
}

/// One unit of cross-cutting behavior attached to an advisor.
#[derive(Clone)]
pub enum Advice {
  Before(Arc<dyn BeforeAdvice>),
  After(Arc<dyn AfterAdvice>),
  AfterReturning(Arc<dyn AfterReturningAdvice>),
  AfterThrowing(Arc<dyn AfterThrowingAdvice>),
  Around(Arc<dyn MethodInterceptor>),
}

impl Advice {
  pub fn before<F>(advice: F) -> Self
  where
    F: Fn(&MethodInvocation<'_>) -> Result<(), InvocationError> + Send + Sync + 'static,
  {
    Advice::Before(Arc::new(advice))
  }

  pub fn after<F>(advice: F) -> Self
  where
    F: Fn(&MethodInvocation<'_>) -> Result<(), InvocationError> + Send + Sync + 'static,
  {
    Advice::After(Arc::new(advice))
  }

  pub fn after_returning<F>(advice: F) -> Self
  where
    F: Fn(Value, &MethodInvocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
  {
    Advice::AfterReturning(Arc::new(advice))
  }

  pub fn after_throwing<F>(advice: F) -> Self
  where
    F: Fn(InvocationError, &MethodInvocation<'_>) -> Result<Value, InvocationError>
      + Send
      + Sync
      + 'static,
  {
    Advice::AfterThrowing(Arc::new(advice))
  }

  pub fn around<F>(interceptor: F) -> Self
  where
    F: Fn(&mut MethodInvocation<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
  {
    Advice::Around(Arc::new(interceptor))
  }

  /// Wraps the advice in the interceptor that gives it its place around the call.
  pub(crate) fn into_interceptor(self) -> Arc<dyn MethodInterceptor> {
    match self {
      Advice::Before(advice) => Arc::new(BeforeInterceptor(advice)),
      Advice::After(advice) => Arc::new(AfterInterceptor(advice)),
      Advice::AfterReturning(advice) => Arc::new(AfterReturningInterceptor(advice)),
      Advice::AfterThrowing(advice) => Arc::new(AfterThrowingInterceptor(advice)),
      Advice::Around(interceptor) => interceptor,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Advice::Before(_) => "before",
      Advice::After(_) => "after",
      Advice::AfterReturning(_) => "after_returning",
      Advice::AfterThrowing(_) => "after_throwing",
      Advice::Around(_) => "around",
    }
  }
}

impl fmt::Debug for Advice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Advice").field(&self.kind()).finish()
  }
}

struct BeforeInterceptor(Arc<dyn BeforeAdvice>);

impl MethodInterceptor for BeforeInterceptor {
  fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Value, InvocationError> {
    self.0.before(invocation)?;
    invocation.proceed()
  }
}

struct AfterInterceptor(Arc<dyn AfterAdvice>);

impl MethodInterceptor for AfterInterceptor {
  fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Value, InvocationError> {
    let result = invocation.proceed();
    let after = self.0.after(invocation);
    match (result, after) {
      (Ok(value), Ok(())) => Ok(value),
      (Ok(_), Err(err)) => Err(err),
      (Err(err), Ok(())) => Err(err),
      (Err(err), Err(advice_err)) => {
        warn!(method = %invocation.method().name, error = %advice_err, "after advice failed while propagating an error");
        Err(err)
      }
    }
  }
}

struct AfterReturningInterceptor(Arc<dyn AfterReturningAdvice>);

impl MethodInterceptor for AfterReturningInterceptor {
  fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Value, InvocationError> {
    let value = invocation.proceed()?;
    self.0.after_returning(value, invocation)
  }
}

struct AfterThrowingInterceptor(Arc<dyn AfterThrowingAdvice>);

impl MethodInterceptor for AfterThrowingInterceptor {
  fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Value, InvocationError> {
    match invocation.proceed() {
      Ok(value) => Ok(value),
      Err(err) => self.0.after_throwing(err, invocation),
    }
  }
}
