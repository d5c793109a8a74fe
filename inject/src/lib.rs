//! # Fibre Inject
//!
//! A token-driven Inversion of Control (IoC) resolution engine for Rust.
//!
//! Fibre Inject turns declarative bindings (token → provider) into live object
//! graphs. Bindings can be registered at any point, looked up through a
//! hierarchy of containers, cached according to their lifecycle, observed
//! through interceptors, and made lazy to break construction cycles.
//!
//! ## Core Concepts
//!
//! - **Token**: identifies a binding. A class (a Rust type), a string name, a
//!   [`Symbol`] or a [`DelayedConstructor`].
//! - **Provider**: how a binding produces its value: a value, a class, a
//!   factory or a redirect to another token.
//! - **Lifecycle**: transient, singleton, resolution-scoped or container-scoped.
//! - **Injectable**: a type that declares its constructor parameters and can be
//!   built by the container.
//! - **Default container**: a process-wide container, accessible via `global()`.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{Args, Container, Injectable, Lifecycle, Param, Result, Token};
//! use std::sync::Arc;
//!
//! struct Config {
//!   url: String,
//! }
//!
//! struct Database {
//!   config: Arc<Config>,
//! }
//!
//! impl Injectable for Database {
//!   fn metadata() -> Vec<Param> {
//!     vec![Param::named("config", Token::from("config"))]
//!   }
//!   fn construct(args: &mut Args) -> Result<Self> {
//!     Ok(Database { config: args.next()? })
//!   }
//! }
//!
//! fn main() -> Result<()> {
//!   fibre_inject::declare_injectable::<Database>();
//!
//!   let container = Container::new();
//!   container
//!     .register_instance("config", Arc::new(Config { url: "postgres://localhost".into() }))?
//!     .register_class::<Database>(Lifecycle::Singleton.into())?;
//!
//!   let db = container.resolve::<Database>(Token::of::<Database>())?;
//!   assert_eq!(db.config.url, "postgres://localhost");
//!   assert!(Arc::ptr_eq(&db, &container.resolve::<Database>(Token::of::<Database>())?));
//!   Ok(())
//! }
//! ```

mod auto;
mod container;
mod core;
mod delayed;
mod error;
mod global;
mod instance;
mod interceptors;
mod macros;
mod provider;
mod resolver;
mod token;
mod type_info;

pub use auto::{auto_construct, auto_inject, AutoInjector};
pub use container::Container;
pub use delayed::{delay, Delayed, DelayedConstructor};
pub use error::{BoxError, InjectError, Result};
pub use global::{declare_singleton, global};
pub use instance::{Arg, Args, Disposable, Disposal, Instance, Transform};
pub use interceptors::{
  Frequency, InterceptorOptions, PostResolutionCallback, PreResolutionCallback, ResolutionType,
  Resolved,
};
pub use provider::{FactoryFn, Lifecycle, Provider, RegistrationOptions};
pub use token::{Class, Symbol, Token};
pub use type_info::{
  declare_injectable, declare_injectable_with, param_info, type_info, Injectable, Param,
  ParamInfo, TypeInfoStore,
};
