//! The main `Container` struct: registration, hierarchy, caches and disposal.

use crate::error::{InjectError, Result};
use crate::instance::{Disposable, Disposal, Instance};
use crate::interceptors::{
  InterceptorOptions, InterceptorRegistry, ResolutionType, Resolved,
};
use crate::provider::{Lifecycle, Provider, ProviderRegistry, Registration, RegistrationOptions};
use crate::token::{Class, Token};
use crate::type_info::Injectable;
use dashmap::DashMap;
use futures_util::future::join_all;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// The Inversion of Control (IoC) container.
///
/// A `Container` is a cheap, clonable handle; clones share the same
/// registrations and caches. Child containers created with
/// [`create_child_container`](Container::create_child_container) fall back to
/// their parent for bindings they do not hold themselves, but never write
/// into the parent.
///
/// # Concurrency
///
/// The container is `Send + Sync` and resolution never holds an internal lock
/// while user code runs. Registration is not guarded against resolutions that
/// are in flight on the same container: callers must not mutate a registry
/// while a resolution using it is running.
#[derive(Clone, Default)]
pub struct Container {
  pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
  pub(crate) id: u64,
  pub(crate) registry: ProviderRegistry,
  pub(crate) interceptors: InterceptorRegistry,
  // Singletons owned by this container and container-scoped values resolved
  // through it, keyed by registration id.
  pub(crate) instances: DashMap<u64, Instance>,
  pub(crate) parent: Option<Container>,
  disposables: Mutex<Vec<Arc<dyn Disposable>>>,
  disposed: AtomicBool,
}

static NEXT_CONTAINER: AtomicU64 = AtomicU64::new(1);

impl Inner {
  fn new(parent: Option<Container>) -> Self {
    Self {
      id: NEXT_CONTAINER.fetch_add(1, Ordering::Relaxed),
      registry: ProviderRegistry::default(),
      interceptors: InterceptorRegistry::default(),
      instances: DashMap::new(),
      parent,
      disposables: Mutex::new(Vec::new()),
      disposed: AtomicBool::new(false),
    }
  }
}

impl Default for Inner {
  fn default() -> Self {
    Self::new(None)
  }
}

impl Container {
  /// Creates a new, empty root `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  pub(crate) fn id(&self) -> u64 {
    self.inner.id
  }

  pub(crate) fn downgrade(&self) -> Weak<Inner> {
    Arc::downgrade(&self.inner)
  }

  pub(crate) fn upgrade(inner: &Weak<Inner>) -> Option<Container> {
    inner.upgrade().map(|inner| Container { inner })
  }

  pub(crate) fn ensure_not_disposed(&self) -> Result<()> {
    if self.inner.disposed.load(Ordering::Acquire) {
      Err(InjectError::Disposed)
    } else {
      Ok(())
    }
  }

  pub(crate) fn track_disposable(&self, disposable: Arc<dyn Disposable>) {
    self.inner.disposables.lock().push(disposable);
  }

  /// Follows redirects from `target` through this container and its
  /// ancestors and fails if the chain leads back to a token already on the path.
  fn check_redirect_cycle(&self, token: &Token, target: &Token) -> Result<()> {
    let mut path = vec![token.clone()];
    let mut next = Some(target.clone());
    while let Some(current) = next {
      if path.contains(&current) {
        path.push(current);
        let rendered = path
          .iter()
          .map(ToString::to_string)
          .collect::<Vec<_>>()
          .join(" -> ");
        return Err(InjectError::TokenCycle(rendered));
      }
      next = self.redirect_target(&current);
      path.push(current);
    }
    Ok(())
  }

  /// The redirect target of `token` in the nearest container that binds it.
  fn redirect_target(&self, token: &Token) -> Option<Token> {
    let mut current = Some(self);
    while let Some(container) = current {
      if container.inner.registry.has(token) {
        return container.inner.registry.redirect_target(token);
      }
      current = container.inner.parent.as_ref();
    }
    None
  }

  // --- Registration ---

  /// Appends `provider` under `token` and sets the token's lifecycle.
  ///
  /// A later registration for the same token wins for [`resolve`](Container::resolve),
  /// while [`resolve_all`](Container::resolve_all) returns every registration in order.
  pub fn register(
    &self,
    token: impl Into<Token>,
    provider: Provider,
    options: RegistrationOptions,
  ) -> Result<&Self> {
    self.ensure_not_disposed()?;
    let token = token.into();

    match &provider {
      Provider::Value(_) | Provider::Factory(_) if options.lifecycle != Lifecycle::Transient => {
        return Err(InjectError::IncompatibleLifecycle {
          token,
          lifecycle: options.lifecycle,
        });
      }
      Provider::Class(class) if !class.is_constructible() => {
        return Err(InjectError::InvalidProvider(format!(
          "class provider for \"{}\" has no constructor; bind it to a value, factory or injectable class",
          token
        )));
      }
      Provider::Token(target) => self.check_redirect_cycle(&token, target)?,
      _ => {}
    }

    debug!(
      token = %token,
      provider = provider.kind(),
      lifecycle = ?options.lifecycle,
      "registered provider"
    );
    self.inner.registry.append(token, provider, options.lifecycle);
    Ok(self)
  }

  /// Binds `token` to an existing value. The very same value is returned by
  /// every resolution.
  pub fn register_instance(&self, token: impl Into<Token>, instance: impl Into<Instance>) -> Result<&Self> {
    self.register(token, Provider::Value(instance.into()), RegistrationOptions::default())
  }

  /// Binds `from` to `to`: a class provider for constructible classes, a
  /// redirect otherwise.
  pub fn register_type(&self, from: impl Into<Token>, to: impl Into<Token>) -> Result<&Self> {
    self.register(
      from,
      Provider::from_token(to.into()),
      RegistrationOptions::default(),
    )
  }

  /// Binds `from` as a singleton.
  ///
  /// A constructible class token without `to` is bound to itself. Any other
  /// token needs a `to` target and fails with [`InjectError::InvalidProvider`] without one.
  pub fn register_singleton(&self, from: impl Into<Token>, to: Option<Token>) -> Result<&Self> {
    let from = from.into();
    let provider = match to {
      Some(to) if from.is_constructor() && to.is_named() => Provider::from_token(from.clone()),
      Some(to) => Provider::from_token(to),
      None if from.is_constructor() => Provider::from_token(from.clone()),
      None => {
        return Err(InjectError::InvalidProvider(format!(
          "cannot register the type name \"{}\" as a singleton without a \"to\" token",
          from
        )))
      }
    };
    self.register(from, provider, Lifecycle::Singleton.into())
  }

  /// Binds the class `T` to itself.
  pub fn register_class<T: Injectable>(&self, options: RegistrationOptions) -> Result<&Self> {
    self.register(Class::of::<T>(), Provider::class::<T>(), options)
  }

  pub fn register_factory<F>(&self, token: impl Into<Token>, factory: F) -> Result<&Self>
  where
    F: Fn(&Container) -> Result<Instance> + Send + Sync + 'static,
  {
    self.register(token, Provider::factory(factory), RegistrationOptions::default())
  }

  /// Whether `token` has a provider here or, if `recursive`, in an ancestor.
  pub fn is_registered(&self, token: impl Into<Token>, recursive: bool) -> bool {
    let token = token.into();
    let mut current = Some(self);
    while let Some(container) = current {
      if container.inner.registry.has(&token) {
        return true;
      }
      if !recursive {
        return false;
      }
      current = container.inner.parent.as_ref();
    }
    false
  }

  // --- Hierarchy & caches ---

  /// Creates a container that falls back to this one for missing bindings.
  ///
  /// The child has its own caches and interceptors. Singletons stay cached in
  /// the container that holds their binding, so a child shares them with its
  /// parent. Container-scoped bindings are copied into the child as local
  /// bindings, giving it instances of its own.
  pub fn create_child_container(&self) -> Container {
    let child = Container {
      inner: Arc::new(Inner::new(Some(self.clone()))),
    };
    child.inner.registry.inherit_scoped(&self.inner.registry);
    debug!(parent = self.id(), child = child.id(), "created child container");
    child
  }

  /// Drops every binding, interceptor and cached instance of this container.
  pub fn reset(&self) {
    debug!(container = self.id(), "resetting container");
    self.inner.registry.clear();
    self.inner.interceptors.clear();
    self.clear_instances();
  }

  /// Drops cached singleton and container-scoped instances, keeping bindings.
  pub fn clear_instances(&self) {
    self.inner.instances.clear();
  }

  // --- Interceptors ---

  /// Runs `callback` before each due resolution of `token`.
  pub fn before_resolution<F>(&self, token: impl Into<Token>, callback: F, options: InterceptorOptions)
  where
    F: Fn(&Token, ResolutionType) -> Result<()> + Send + Sync + 'static,
  {
    self
      .inner
      .interceptors
      .add_pre(token.into(), Arc::new(callback), options);
  }

  /// Runs `callback` after each due, successful resolution of `token`.
  pub fn after_resolution<F>(&self, token: impl Into<Token>, callback: F, options: InterceptorOptions)
  where
    F: Fn(&Token, Resolved<'_>, ResolutionType) -> Result<()> + Send + Sync + 'static,
  {
    self
      .inner
      .interceptors
      .add_post(token.into(), Arc::new(callback), options);
  }

  // --- Disposal ---

  /// Disposes every tracked instance in creation order.
  ///
  /// Returns [`Disposal::Pending`] if any disposer is asynchronous; it settles
  /// once all of them have. Failures are collected into
  /// [`InjectError::Disposal`]. Calling `dispose` again does nothing.
  pub fn dispose(&self) -> Disposal {
    if self.inner.disposed.swap(true, Ordering::AcqRel) {
      return Disposal::done();
    }
    let disposables = std::mem::take(&mut *self.inner.disposables.lock());
    debug!(container = self.id(), count = disposables.len(), "disposing container");

    let mut failures = Vec::new();
    let mut pending = Vec::new();
    for disposable in disposables {
      match disposable.dispose() {
        Disposal::Ready(Ok(())) => {}
        Disposal::Ready(Err(e)) => failures.push(e),
        Disposal::Pending(future) => pending.push(future),
      }
    }

    if pending.is_empty() {
      return Disposal::Ready(settle(failures));
    }
    Disposal::pending(async move {
      for result in join_all(pending).await {
        if let Err(e) = result {
          failures.push(e);
        }
      }
      settle(failures)
    })
  }

  pub fn is_disposed(&self) -> bool {
    self.inner.disposed.load(Ordering::Acquire)
  }

  // --- Typed resolution ---

  /// Resolves `token` as a shared `T`.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self, token: impl Into<Token>) -> Result<Arc<T>> {
    self.resolve_instance(token)?.try_downcast::<T>()
  }

  /// Resolves every binding of `token` as shared `T`s, in registration order.
  pub fn resolve_all<T: ?Sized + Any + Send + Sync>(
    &self,
    token: impl Into<Token>,
  ) -> Result<Vec<Arc<T>>> {
    self
      .resolve_all_instances(token)?
      .iter()
      .map(Instance::try_downcast::<T>)
      .collect()
  }
}

fn settle(failures: Vec<InjectError>) -> Result<()> {
  if failures.is_empty() {
    return Ok(());
  }
  for failure in &failures {
    warn!(error = %failure, "disposer failed");
  }
  Err(InjectError::Disposal(failures))
}

impl std::fmt::Debug for Container {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.inner.id)
      .field("parent", &self.inner.parent.as_ref().map(Container::id))
      .field("disposed", &self.is_disposed())
      .finish()
  }
}

pub(crate) struct Located {
  /// The container holding the registration.
  pub(crate) owner: Container,
  pub(crate) registration: Registration,
  pub(crate) lifecycle: Lifecycle,
}

impl Container {
  /// The newest registration of `token`, searching this container then its ancestors.
  pub(crate) fn locate(&self, token: &Token) -> Option<Located> {
    let mut current = Some(self);
    while let Some(container) = current {
      if let Some((registration, lifecycle)) = container.inner.registry.last(token) {
        return Some(Located {
          owner: container.clone(),
          registration,
          lifecycle,
        });
      }
      current = container.inner.parent.as_ref();
    }
    None
  }

  /// Every registration of `token` from the nearest container holding any.
  pub(crate) fn locate_all(&self, token: &Token) -> Option<Vec<Located>> {
    let mut current = Some(self);
    while let Some(container) = current {
      if let Some((registrations, lifecycle)) = container.inner.registry.all(token) {
        let located = registrations
          .into_iter()
          .map(|registration| Located {
            owner: container.clone(),
            registration,
            lifecycle,
          })
          .collect();
        return Some(located);
      }
      current = container.inner.parent.as_ref();
    }
    None
  }
}
