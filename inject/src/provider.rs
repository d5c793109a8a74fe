//! Providers, lifecycles and the per-container provider registry.

use crate::container::Container;
use crate::delayed::DelayedConstructor;
use crate::error::Result;
use crate::instance::Instance;
use crate::token::{Class, Token};
use crate::type_info::Injectable;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Governs how long a produced value is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
  /// A fresh value on every resolution.
  #[default]
  Transient,
  /// Created once per owning container and shared with its descendants until
  /// the owner's instances are cleared.
  Singleton,
  /// Shared by every consumer within one top-level `resolve`/`resolve_all` call.
  ResolutionScoped,
  /// Created once per container that resolves it. The binding is copied into
  /// every child container at creation, making it a local binding of the child.
  ContainerScoped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationOptions {
  pub lifecycle: Lifecycle,
}

impl RegistrationOptions {
  pub fn new(lifecycle: Lifecycle) -> Self {
    Self { lifecycle }
  }
}

impl From<Lifecycle> for RegistrationOptions {
  fn from(lifecycle: Lifecycle) -> Self {
    Self { lifecycle }
  }
}

pub type FactoryFn = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// The value-producing strategy of a binding.
#[derive(Clone)]
pub enum Provider {
  /// Returned as is, never copied.
  Value(Instance),
  /// Built from the class's declared parameters.
  Class(Class),
  /// A class built lazily, on first use of the returned handle.
  Delayed(DelayedConstructor),
  /// Invoked with the resolving container.
  Factory(FactoryFn),
  /// Resolves another token instead.
  Token(Token),
}

impl Provider {
  pub fn value<T: Any + Send + Sync>(value: T) -> Self {
    Provider::Value(Instance::new(value))
  }

  pub fn shared<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Provider::Value(Instance::from_arc(value))
  }

  pub fn class<T: Injectable>() -> Self {
    Provider::Class(Class::of::<T>())
  }

  pub fn factory<F>(factory: F) -> Self
  where
    F: Fn(&Container) -> Result<Instance> + Send + Sync + 'static,
  {
    Provider::Factory(Arc::new(factory))
  }

  /// Picks the provider a bare token stands for: constructible classes and
  /// delayed constructors build themselves, names and key-only classes redirect.
  pub fn from_token(token: Token) -> Self {
    match token {
      Token::Class(class) if class.is_constructible() => Provider::Class(class),
      Token::Delayed(delayed) => Provider::Delayed(delayed),
      named => Provider::Token(named),
    }
  }

  pub(crate) fn kind(&self) -> &'static str {
    match self {
      Provider::Value(_) => "value",
      Provider::Class(_) => "class",
      Provider::Delayed(_) => "delayed",
      Provider::Factory(_) => "factory",
      Provider::Token(_) => "token",
    }
  }
}

impl fmt::Debug for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Provider::Value(instance) => f.debug_tuple("Value").field(instance).finish(),
      Provider::Class(class) => f.debug_tuple("Class").field(class).finish(),
      Provider::Delayed(delayed) => f.debug_tuple("Delayed").field(&delayed.class()).finish(),
      Provider::Factory(_) => f.write_str("Factory(..)"),
      Provider::Token(token) => f.debug_tuple("Token").field(token).finish(),
    }
  }
}

static NEXT_REGISTRATION: AtomicU64 = AtomicU64::new(1);

/// One provider appended under a token. The id keys every lifecycle cache.
#[derive(Clone, Debug)]
pub(crate) struct Registration {
  pub(crate) id: u64,
  pub(crate) provider: Provider,
}

struct ProviderEntry {
  lifecycle: Lifecycle,
  registrations: Vec<Registration>,
}

/// Per-container map from token to its ordered providers.
///
/// Every accessor clones what it needs out of the map so no shard lock is
/// held while the resolver runs user code.
#[derive(Default)]
pub(crate) struct ProviderRegistry {
  entries: DashMap<Token, ProviderEntry>,
}

impl ProviderRegistry {
  pub(crate) fn append(&self, token: Token, provider: Provider, lifecycle: Lifecycle) {
    let registration = Registration {
      id: NEXT_REGISTRATION.fetch_add(1, Ordering::Relaxed),
      provider,
    };
    let mut entry = self.entries.entry(token).or_insert_with(|| ProviderEntry {
      lifecycle,
      registrations: Vec::new(),
    });
    entry.lifecycle = lifecycle;
    entry.registrations.push(registration);
  }

  pub(crate) fn has(&self, token: &Token) -> bool {
    self.entries.contains_key(token)
  }

  /// The newest registration, used by single resolution.
  pub(crate) fn last(&self, token: &Token) -> Option<(Registration, Lifecycle)> {
    let entry = self.entries.get(token)?;
    let registration = entry.registrations.last()?.clone();
    Some((registration, entry.lifecycle))
  }

  pub(crate) fn all(&self, token: &Token) -> Option<(Vec<Registration>, Lifecycle)> {
    self
      .entries
      .get(token)
      .map(|entry| (entry.registrations.clone(), entry.lifecycle))
  }

  /// The target of `token`'s newest provider if that provider is a redirect.
  pub(crate) fn redirect_target(&self, token: &Token) -> Option<Token> {
    match self.last(token)? {
      (
        Registration {
          provider: Provider::Token(target),
          ..
        },
        _,
      ) => Some(target),
      _ => None,
    }
  }

  /// Copies every container-scoped entry of `parent` into this registry.
  pub(crate) fn inherit_scoped(&self, parent: &ProviderRegistry) {
    for entry in parent.entries.iter() {
      if entry.lifecycle != Lifecycle::ContainerScoped {
        continue;
      }
      self.entries.insert(
        entry.key().clone(),
        ProviderEntry {
          lifecycle: entry.lifecycle,
          registrations: entry.registrations.clone(),
        },
      );
    }
  }

  pub(crate) fn clear(&self) {
    self.entries.clear();
  }
}
