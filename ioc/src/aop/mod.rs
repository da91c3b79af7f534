//! Method interception: rules, chains and proxies.

pub mod advice;
pub mod advisor;
pub mod autoproxy;
pub mod chain;
pub mod invocation;
pub mod pointcut;
pub mod proxy;

pub use advice::{
  Advice, AfterAdvice, AfterReturningAdvice, AfterThrowingAdvice, BeforeAdvice, MethodInterceptor,
};
pub use advisor::{Advisor, RuleSource};
pub use autoproxy::AutoProxyCreator;
pub use chain::{Chain, ChainAssembler, MethodKey};
pub use invocation::MethodInvocation;
pub use pointcut::{AnyPointcut, FnPointcut, NamePatternPointcut, Pointcut};
pub use proxy::{ClassProxy, InterfaceProxy, ProxyFactory, ProxyKind};
