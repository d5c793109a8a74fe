//! Lazy handles that break construction cycles between mutually dependent
//! classes.
//!
//! If `A` needs `B` and `B` needs `A`, one side takes a [`Delayed`] handle
//! instead of the real value. The handle is cheap to create and builds the
//! real instance the first time it is dereferenced, by which point the other
//! side has finished constructing.

use crate::error::{InjectError, Result};
use crate::instance::Instance;
use crate::token::Class;
use crate::type_info::Injectable;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// A placeholder for a class reference that is looked up only when needed.
///
/// Used both as a token (`Token::Delayed`) and as a provider
/// (`Provider::Delayed`). Two delayed constructors are the same token only if
/// one is a clone of the other.
#[derive(Clone)]
pub struct DelayedConstructor {
  accessor: Arc<dyn Fn() -> Class + Send + Sync>,
}

impl DelayedConstructor {
  pub fn new<F>(accessor: F) -> Self
  where
    F: Fn() -> Class + Send + Sync + 'static,
  {
    Self {
      accessor: Arc::new(accessor),
    }
  }

  /// The class this placeholder stands for.
  pub fn class(&self) -> Class {
    (self.accessor)()
  }

  /// Creates an uncreated handle. `create` runs on first access only.
  pub(crate) fn create_handle<F>(&self, create: F) -> Instance
  where
    F: Fn(Class) -> Result<Instance> + Send + Sync + 'static,
  {
    Instance::new(LazyInstance {
      constructor: self.clone(),
      create: Box::new(create),
      cell: OnceCell::new(),
    })
  }
}

/// Shorthand for a delayed constructor of `T`.
pub fn delay<T: Injectable>() -> DelayedConstructor {
  DelayedConstructor::new(Class::of::<T>)
}

impl PartialEq for DelayedConstructor {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.accessor, &other.accessor)
  }
}

impl Eq for DelayedConstructor {}

impl Hash for DelayedConstructor {
  fn hash<H: Hasher>(&self, state: &mut H) {
    (Arc::as_ptr(&self.accessor) as *const () as usize).hash(state);
  }
}

impl fmt::Debug for DelayedConstructor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "DelayedConstructor({})", self.class().name())
  }
}

/// The untyped state behind a [`Delayed`] handle: uncreated with a creator,
/// or created with its value.
pub(crate) struct LazyInstance {
  constructor: DelayedConstructor,
  create: Box<dyn Fn(Class) -> Result<Instance> + Send + Sync>,
  cell: OnceCell<Instance>,
}

impl LazyInstance {
  /// Creates the real instance on first call. A failed creation leaves the
  /// handle uncreated so a later access may retry.
  fn force(&self) -> Result<&Instance> {
    self
      .cell
      .get_or_try_init(|| (self.create)(self.constructor.class()))
  }
}

/// A typed view over a lazily created `T`.
///
/// Every access goes through a one-time creation; clones of the handle share
/// the created instance.
pub struct Delayed<T> {
  handle: Arc<LazyInstance>,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Delayed<T> {
  pub(crate) fn from_handle(handle: Arc<LazyInstance>) -> Self {
    Self {
      handle,
      _marker: PhantomData,
    }
  }

  /// Returns the real instance, creating it if needed.
  pub fn try_get(&self) -> Result<&T> {
    let instance = self.handle.force()?;
    instance
      .downcast_ref::<T>()
      .ok_or_else(|| InjectError::TypeMismatch {
        expected: std::any::type_name::<T>(),
        found: instance.type_name(),
      })
  }

  /// The real instance as a shared pointer, creating it if needed.
  pub fn try_shared(&self) -> Result<Arc<T>> {
    self.handle.force()?.try_downcast::<T>()
  }

  pub fn is_created(&self) -> bool {
    self.handle.cell.get().is_some()
  }

  /// Whether both handles share the same lazy state.
  pub fn ptr_eq(a: &Self, b: &Self) -> bool {
    Arc::ptr_eq(&a.handle, &b.handle)
  }
}

impl<T: Any + Send + Sync> Deref for Delayed<T> {
  type Target = T;

  /// # Panics
  ///
  /// Panics if the real instance cannot be created. Use
  /// [`try_get`](Delayed::try_get) to handle the error instead.
  fn deref(&self) -> &T {
    match self.try_get() {
      Ok(value) => value,
      Err(e) => panic!(
        "Failed to create delayed instance of {}: {}",
        std::any::type_name::<T>(),
        e
      ),
    }
  }
}

impl<T> Clone for Delayed<T> {
  fn clone(&self) -> Self {
    Self {
      handle: self.handle.clone(),
      _marker: PhantomData,
    }
  }
}

impl<T> fmt::Debug for Delayed<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Delayed")
      .field("class", &self.handle.constructor.class())
      .field("created", &self.handle.cell.get().is_some())
      .finish()
  }
}
