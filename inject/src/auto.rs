//! Construction-time auto-injection.
//!
//! Callers construct a type directly, supplying only the leading arguments
//! they care about; the remaining constructor positions are resolved from a
//! container. The result is a plain `T`, so its nominal type is unchanged.

use crate::container::Container;
use crate::error::Result;
use crate::global::global;
use crate::instance::{Arg, Args};
use crate::resolver::complete_arguments;
use crate::token::Class;
use crate::type_info::{type_info, Injectable};

/// Fills in constructor arguments from a container.
#[derive(Debug, Clone, Copy)]
pub struct AutoInjector<'c> {
  container: &'c Container,
}

impl<'c> AutoInjector<'c> {
  pub fn new(container: &'c Container) -> Self {
    Self { container }
  }

  /// The full argument list for `T`: `supplied` followed by every remaining
  /// declared parameter, resolved from the container.
  ///
  /// Parameters come from the type information store, or straight from
  /// `T::metadata()` if `T` was never declared injectable.
  pub fn arguments<T: Injectable>(&self, supplied: Vec<Arg>) -> Result<Args> {
    let class = Class::of::<T>();
    let params = type_info()
      .lookup(&class)
      .unwrap_or_else(|| T::metadata().into());
    let values = complete_arguments(self.container, &class, params, supplied)?;
    Ok(Args::new(class.name(), values))
  }

  /// Constructs `T` from `supplied` plus resolved arguments.
  pub fn construct<T: Injectable>(&self, supplied: Vec<Arg>) -> Result<T> {
    let mut args = self.arguments::<T>(supplied)?;
    T::construct(&mut args)
  }
}

/// Constructs `T`, resolving every argument after `supplied` from the default
/// container.
pub fn auto_inject<T: Injectable>(supplied: Vec<Arg>) -> Result<T> {
  AutoInjector::new(global()).construct(supplied)
}

/// Constructs `T` with zero explicit arguments.
pub fn auto_construct<T: Injectable>() -> Result<T> {
  auto_inject(Vec::new())
}
