//! The default container instance and the declarations bound to it.

use crate::container::Container;
use crate::error::Result;
use crate::token::Class;
use crate::type_info::{declare_injectable, Injectable};
use once_cell::sync::Lazy;

// The default container, created on first access.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::default);

/// Provides a reference to the default container.
///
/// This is the container used by [`auto_inject`](crate::auto_inject),
/// [`declare_singleton`] and the `resolve!` macros.
///
/// # Examples
///
/// ```
/// use fibre_inject::global;
/// use std::sync::Arc;
///
/// global()
///   .register_instance("greeting", Arc::new(String::from("Hello from global!")))
///   .unwrap();
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}

/// Marks `T` injectable and binds it as a singleton in the default container.
pub fn declare_singleton<T: Injectable>() -> Result<()> {
  declare_injectable::<T>();
  global().register_singleton(Class::of::<T>(), None)?;
  Ok(())
}
