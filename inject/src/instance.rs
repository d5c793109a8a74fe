//! Type-erased values flowing through the resolver, and the capabilities a
//! value may expose to the container.

use crate::delayed::{Delayed, LazyInstance};
use crate::error::{InjectError, Result};
use futures_util::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A resolved value.
///
/// Internally this is an `Arc<T>` hidden behind `dyn Any`, so `T` may be a
/// trait object. Cloning an `Instance` never clones the value itself: every
/// clone downcasts to the very same `Arc<T>`.
#[derive(Clone)]
pub struct Instance {
  value: Arc<dyn Any + Send + Sync>,
  type_name: &'static str,
  disposable: Option<Arc<dyn Disposable>>,
  transform: Option<Arc<dyn Transform>>,
}

impl Instance {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Wraps an existing shared value without copying it.
  pub fn from_arc<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      value: Arc::new(value),
      type_name: std::any::type_name::<T>(),
      disposable: None,
      transform: None,
    }
  }

  /// Wraps a value the container should dispose of when it is itself disposed.
  pub fn disposable<T: Disposable + Any>(value: T) -> Self {
    let value = Arc::new(value);
    let mut instance = Self::from_arc(value.clone());
    instance.disposable = Some(value);
    instance
  }

  /// Wraps a value that can be used as the transform of a parameter.
  pub fn transform<T: Transform + Any>(value: T) -> Self {
    let value = Arc::new(value);
    let mut instance = Self::from_arc(value.clone());
    instance.transform = Some(value);
    instance
  }

  /// Returns the shared value if it is a `T`.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.value.downcast_ref::<Arc<T>>().cloned()
  }

  pub fn downcast_ref<T: ?Sized + Any + Send + Sync>(&self) -> Option<&T> {
    self.value.downcast_ref::<Arc<T>>().map(|value| &**value)
  }

  /// Like [`downcast`](Self::downcast), but reports a [`InjectError::TypeMismatch`].
  pub fn try_downcast<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.downcast::<T>().ok_or_else(|| InjectError::TypeMismatch {
      expected: std::any::type_name::<T>(),
      found: self.type_name,
    })
  }

  pub fn is<T: ?Sized + Any + Send + Sync>(&self) -> bool {
    self.value.is::<Arc<T>>()
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// Whether both instances are handles to the same value.
  pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
    Arc::ptr_eq(&a.value, &b.value)
  }

  pub(crate) fn disposer(&self) -> Option<Arc<dyn Disposable>> {
    self.disposable.clone()
  }

  /// The transform capability, either attached through [`Instance::transform`]
  /// or because the value itself is an `Arc<dyn Transform>`.
  pub(crate) fn transformer(&self) -> Option<Arc<dyn Transform>> {
    self
      .transform
      .clone()
      .or_else(|| self.downcast::<dyn Transform>())
  }
}

impl<T: ?Sized + Any + Send + Sync> From<Arc<T>> for Instance {
  fn from(value: Arc<T>) -> Self {
    Instance::from_arc(value)
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Instance({})", self.type_name)
  }
}

/// The outcome of a disposal: either already settled, or a future that
/// settles later.
pub enum Disposal {
  Ready(Result<()>),
  Pending(BoxFuture<'static, Result<()>>),
}

impl Disposal {
  pub fn done() -> Self {
    Disposal::Ready(Ok(()))
  }

  pub fn pending<F>(future: F) -> Self
  where
    F: Future<Output = Result<()>> + Send + 'static,
  {
    Disposal::Pending(Box::pin(future))
  }

  pub fn is_pending(&self) -> bool {
    matches!(self, Disposal::Pending(_))
  }

  /// Waits for the disposal to settle.
  pub async fn settle(self) -> Result<()> {
    match self {
      Disposal::Ready(result) => result,
      Disposal::Pending(future) => future.await,
    }
  }
}

impl fmt::Debug for Disposal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Disposal::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
      Disposal::Pending(_) => f.write_str("Pending(..)"),
    }
  }
}

/// A value holding resources that must be released when its container is
/// disposed.
pub trait Disposable: Send + Sync {
  fn dispose(&self) -> Disposal;
}

/// Post-processes a resolved dependency before it reaches the consuming
/// constructor.
pub trait Transform: Send + Sync {
  fn transform(&self, incoming: Arg, args: &[Instance]) -> Result<Instance>;
}

/// A single constructor argument.
#[derive(Clone, Debug)]
pub enum Arg {
  One(Instance),
  /// Every value bound to a token, in registration order.
  Many(Vec<Instance>),
}

impl Arg {
  pub fn value<T: Any + Send + Sync>(value: T) -> Self {
    Arg::One(Instance::new(value))
  }

  fn describe(&self) -> &'static str {
    match self {
      Arg::One(instance) => instance.type_name(),
      Arg::Many(_) => "a list of instances",
    }
  }
}

impl From<Instance> for Arg {
  fn from(instance: Instance) -> Self {
    Arg::One(instance)
  }
}

impl From<Vec<Instance>> for Arg {
  fn from(instances: Vec<Instance>) -> Self {
    Arg::Many(instances)
  }
}

/// The ordered argument list handed to [`Injectable::construct`](crate::Injectable::construct).
///
/// Each accessor consumes the next position. Type errors are reported against
/// the owning class and position.
#[derive(Debug)]
pub struct Args {
  class: &'static str,
  values: std::vec::IntoIter<Arg>,
  supplied: usize,
  position: usize,
}

impl Args {
  pub fn new(class: &'static str, values: Vec<Arg>) -> Self {
    Self {
      class,
      supplied: values.len(),
      values: values.into_iter(),
      position: 0,
    }
  }

  /// Number of arguments not consumed yet.
  pub fn remaining(&self) -> usize {
    self.values.len()
  }

  pub fn next_arg(&mut self) -> Result<Arg> {
    let position = self.position;
    let arg = self.values.next().ok_or(InjectError::MissingArgument {
      class: self.class,
      position,
      supplied: self.supplied,
    })?;
    self.position += 1;
    Ok(arg)
  }

  pub fn next_instance(&mut self) -> Result<Instance> {
    match self.next_arg()? {
      Arg::One(instance) => Ok(instance),
      other => Err(self.mismatch("a single instance", &other)),
    }
  }

  /// The next argument as a shared `T`.
  pub fn next<T: ?Sized + Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
    match self.next_arg()? {
      Arg::One(instance) => instance.try_downcast::<T>().map_err(|e| self.wrap(e)),
      other => Err(self.mismatch(std::any::type_name::<T>(), &other)),
    }
  }

  /// The next argument as every `T` bound to its token.
  pub fn next_all<T: ?Sized + Any + Send + Sync>(&mut self) -> Result<Vec<Arc<T>>> {
    match self.next_arg()? {
      Arg::Many(instances) => instances
        .iter()
        .map(|instance| instance.try_downcast::<T>())
        .collect::<Result<Vec<_>>>()
        .map_err(|e| self.wrap(e)),
      other => Err(self.mismatch("a list of instances", &other)),
    }
  }

  /// The next argument as a lazy handle produced for a delayed token.
  pub fn next_delayed<T: Any + Send + Sync>(&mut self) -> Result<Delayed<T>> {
    match self.next_arg()? {
      Arg::One(instance) => instance
        .try_downcast::<LazyInstance>()
        .map(Delayed::from_handle)
        .map_err(|e| self.wrap(e)),
      other => Err(self.mismatch(std::any::type_name::<Delayed<T>>(), &other)),
    }
  }

  // Errors refer to the position just consumed.
  fn wrap(&self, source: InjectError) -> InjectError {
    InjectError::at_param(self.class, self.position - 1, None, source)
  }

  fn mismatch(&self, expected: &'static str, found: &Arg) -> InjectError {
    self.wrap(InjectError::TypeMismatch {
      expected,
      found: found.describe(),
    })
  }
}
