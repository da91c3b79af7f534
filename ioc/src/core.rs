//! Core, non-public data structures for the container.

use crate::error::{Error, Result};
use std::cell::RefCell;

thread_local! {
  // The objects currently being created on this thread, outermost first,
  // tagged with the id of the container creating them.
  static CREATION_STACK: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// An RAII guard that detects unresolvable circular references.
///
/// Entering pushes the object name onto the thread-local creation stack. If
/// the name is already there, the object was requested again before its own
/// creation finished and no early reference could be exposed for it, so the
/// guard reports the cycle instead of recursing forever.
pub(crate) struct CreationGuard {
  container: u64,
  name: String,
}

impl CreationGuard {
  pub(crate) fn enter(container: u64, name: &str) -> Result<Self> {
    CREATION_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(start) = stack
        .iter()
        .position(|(id, entry)| *id == container && entry == name)
      {
        let mut cycle: Vec<String> = stack[start..]
          .iter()
          .filter(|(id, _)| *id == container)
          .map(|(_, entry)| entry.clone())
          .collect();
        cycle.push(name.to_owned());
        return Err(Error::UnresolvableCycle { cycle });
      }
      stack.push((container, name.to_owned()));
      Ok(())
    })?;
    Ok(Self {
      container,
      name: name.to_owned(),
    })
  }

  /// The innermost object `container` is creating on this thread, if any.
  pub(crate) fn current(container: u64) -> Option<String> {
    CREATION_STACK.with(|stack| {
      stack
        .borrow()
        .iter()
        .rev()
        .find(|(id, _)| *id == container)
        .map(|(_, name)| name.clone())
    })
  }
}

impl Drop for CreationGuard {
  fn drop(&mut self) {
    CREATION_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(pos) = stack
        .iter()
        .rposition(|(id, entry)| *id == self.container && *entry == self.name)
      {
        stack.remove(pos);
      }
    });
  }
}
