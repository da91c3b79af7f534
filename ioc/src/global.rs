//! The global container instance.

use crate::container::Container;
use once_cell::sync::Lazy;

// Created on first access.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::new);

/// Provides a reference to the global container, configured with the defaults.
///
/// Descriptors and advisors can be registered on it from anywhere in an
/// application; the [`resolve!`](crate::resolve) family of macros reads from it.
///
/// ```
/// use fibre_weave::global;
///
/// assert!(!global().contains("nothing_registered_under_this_name"));
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
