//! Core, non-public bookkeeping for a resolution in progress.

use crate::error::{InjectError, Result};
use crate::instance::Instance;
use crate::token::Token;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

thread_local! {
  // The (container, token) pairs currently being produced on this thread.
  // Seeing a pair twice means the dependency graph loops back on itself.
  static RESOLVING_STACK: RefCell<HashSet<ResolutionKey>> = RefCell::new(HashSet::new());
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct ResolutionKey {
  container: u64,
  token: Token,
}

/// An RAII guard to detect circular dependencies.
///
/// When created, it adds the key to the thread-local resolution stack and
/// fails with [`InjectError::CyclicDependency`] if the key is already there.
/// When dropped, it removes the key again, so sibling resolutions of the same
/// token are unaffected.
pub(crate) struct ResolutionGuard {
  key: ResolutionKey,
}

impl ResolutionGuard {
  pub(crate) fn enter(container: u64, token: &Token) -> Result<Self> {
    let key = ResolutionKey {
      container,
      token: token.clone(),
    };
    RESOLVING_STACK.with(|stack| {
      // `insert` returns `false` if the value was already present.
      if stack.borrow_mut().insert(key.clone()) {
        Ok(Self { key })
      } else {
        Err(InjectError::CyclicDependency(token.clone()))
      }
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.key);
    });
  }
}

/// State shared by every nested resolution below one top-level `resolve`
/// or `resolve_all` call. Dropped when that call returns.
#[derive(Default)]
pub(crate) struct ResolutionContext {
  scoped: HashMap<u64, Instance>,
}

impl ResolutionContext {
  pub(crate) fn scoped(&self, registration: u64) -> Option<Instance> {
    self.scoped.get(&registration).cloned()
  }

  pub(crate) fn remember(&mut self, registration: u64, instance: &Instance) {
    self.scoped.insert(registration, instance.clone());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reentering_the_same_key_is_a_cycle() {
    let token = Token::from("loop");
    let _outer = ResolutionGuard::enter(1, &token).unwrap();

    assert!(matches!(
      ResolutionGuard::enter(1, &token),
      Err(InjectError::CyclicDependency(_))
    ));
    // Another container resolving the same token is not a cycle.
    assert!(ResolutionGuard::enter(2, &token).is_ok());
  }

  #[test]
  fn dropping_the_guard_releases_the_key() {
    let token = Token::from("sibling");
    drop(ResolutionGuard::enter(1, &token).unwrap());
    assert!(ResolutionGuard::enter(1, &token).is_ok());
  }
}
