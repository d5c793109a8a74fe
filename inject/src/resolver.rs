//! The resolution algorithm.
//!
//! A public `resolve*` call opens a [`ResolutionContext`] that every nested
//! resolution shares; it is dropped when the outermost call returns. Along the
//! way each token is looked up in the container chain, its newest (or every)
//! provider is run, constructor parameters are resolved recursively from the
//! type information store, and lifecycle caches and interceptors are applied.

use crate::container::{Container, Located};
use crate::core::{ResolutionContext, ResolutionGuard};
use crate::delayed::{Delayed, DelayedConstructor, LazyInstance};
use crate::error::{InjectError, Result};
use crate::instance::{Arg, Args, Instance};
use crate::interceptors::{ResolutionType, Resolved};
use crate::provider::{Lifecycle, Provider};
use crate::token::{Class, Token};
use crate::type_info::{type_info, Param, ParamInfo};
use std::any::Any;
use std::sync::Arc;
use tracing::trace;

impl Container {
  /// Resolves `token` to its type-erased value.
  pub fn resolve_instance(&self, token: impl Into<Token>) -> Result<Instance> {
    let mut context = ResolutionContext::default();
    self.resolve_in(&token.into(), &mut context)
  }

  /// Resolves every binding of `token`, in registration order.
  pub fn resolve_all_instances(&self, token: impl Into<Token>) -> Result<Vec<Instance>> {
    let mut context = ResolutionContext::default();
    self.resolve_all_in(&token.into(), &mut context)
  }

  /// Resolves `token` to a lazy handle. The token is usually a
  /// [`DelayedConstructor`], or is bound to one.
  pub fn resolve_delayed<T: Any + Send + Sync>(&self, token: impl Into<Token>) -> Result<Delayed<T>> {
    self
      .resolve_instance(token)?
      .try_downcast::<LazyInstance>()
      .map(Delayed::from_handle)
  }

  pub(crate) fn resolve_in(&self, token: &Token, context: &mut ResolutionContext) -> Result<Instance> {
    self.ensure_not_disposed()?;
    trace!(container = self.id(), token = %token, "resolving");
    self.inner.interceptors.before(token, ResolutionType::Single)?;

    let instance = {
      let _guard = ResolutionGuard::enter(self.id(), token)?;
      match self.locate(token) {
        Some(located) => self.resolve_registration(located, context)?,
        None => self.construct_unregistered(token, context)?,
      }
    };

    self
      .inner
      .interceptors
      .after(token, Resolved::Single(&instance), ResolutionType::Single)?;
    Ok(instance)
  }

  pub(crate) fn resolve_all_in(
    &self,
    token: &Token,
    context: &mut ResolutionContext,
  ) -> Result<Vec<Instance>> {
    self.ensure_not_disposed()?;
    trace!(container = self.id(), token = %token, "resolving all");
    self.inner.interceptors.before(token, ResolutionType::All)?;

    let instances = {
      let _guard = ResolutionGuard::enter(self.id(), token)?;
      match self.locate_all(token) {
        Some(located) => located
          .into_iter()
          .map(|located| self.resolve_registration(located, context))
          .collect::<Result<Vec<_>>>()?,
        None => vec![self.construct_unregistered(token, context)?],
      }
    };

    self
      .inner
      .interceptors
      .after(token, Resolved::All(&instances), ResolutionType::All)?;
    Ok(instances)
  }

  /// Without a binding, only a constructible class (or a delayed constructor)
  /// can stand for itself.
  fn construct_unregistered(&self, token: &Token, context: &mut ResolutionContext) -> Result<Instance> {
    match token {
      Token::Class(class) if class.is_constructible() => self.construct(class, context),
      Token::Delayed(delayed) => Ok(self.delayed_handle(delayed)),
      _ => Err(InjectError::Unregistered(token.clone())),
    }
  }

  fn resolve_registration(&self, located: Located, context: &mut ResolutionContext) -> Result<Instance> {
    let Located {
      owner,
      registration,
      lifecycle,
    } = located;

    let cache = match lifecycle {
      Lifecycle::Singleton => Some(&owner.inner.instances),
      Lifecycle::ContainerScoped => Some(&self.inner.instances),
      Lifecycle::ResolutionScoped => {
        if let Some(hit) = context.scoped(registration.id) {
          return Ok(hit);
        }
        None
      }
      Lifecycle::Transient => None,
    };
    if let Some(hit) = cache.and_then(|cache| cache.get(&registration.id)) {
      return Ok(hit.value().clone());
    }

    let produced = self.produce(&registration.provider, context)?;

    let instance = match cache {
      // The first value stored wins.
      Some(cache) => cache.entry(registration.id).or_insert(produced).value().clone(),
      None => produced,
    };
    if lifecycle == Lifecycle::ResolutionScoped {
      context.remember(registration.id, &instance);
    }
    Ok(instance)
  }

  fn produce(&self, provider: &Provider, context: &mut ResolutionContext) -> Result<Instance> {
    match provider {
      Provider::Value(instance) => Ok(instance.clone()),
      Provider::Factory(factory) => factory(self),
      Provider::Token(target) => self.resolve_in(target, context),
      Provider::Class(class) => self.construct(class, context),
      Provider::Delayed(delayed) => Ok(self.delayed_handle(delayed)),
    }
  }

  /// Builds `class` from its declared parameters and tracks the result for
  /// disposal if it exposes that capability.
  pub(crate) fn construct(&self, class: &Class, context: &mut ResolutionContext) -> Result<Instance> {
    let params = type_info().get(class);
    let values = self.resolve_arguments(class, &params, Vec::new(), context)?;
    let mut args = Args::new(class.name(), values);
    let instance = class.instantiate(&mut args).unwrap_or_else(|| {
      Err(InjectError::InvalidProvider(format!(
        "\"{}\" cannot be constructed",
        class.name()
      )))
    })?;

    if let Some(disposable) = instance.disposer() {
      self.track_disposable(disposable);
    }
    Ok(instance)
  }

  /// Completes `supplied` into a full argument list by resolving every
  /// parameter after the supplied prefix.
  pub(crate) fn resolve_arguments(
    &self,
    class: &Class,
    params: &[Param],
    mut supplied: Vec<Arg>,
    context: &mut ResolutionContext,
  ) -> Result<Vec<Arg>> {
    let skip = supplied.len();
    for (position, param) in params.iter().enumerate().skip(skip) {
      let arg = self
        .resolve_param(&param.info, context)
        .map_err(|source| InjectError::at_param(class.name(), position, param.name, source))?;
      supplied.push(arg);
    }
    Ok(supplied)
  }

  fn resolve_param(&self, info: &ParamInfo, context: &mut ResolutionContext) -> Result<Arg> {
    match info {
      ParamInfo::Token(token)
      | ParamInfo::Descriptor {
        token,
        multiple: false,
      } => Ok(Arg::One(self.resolve_in(token, context)?)),
      ParamInfo::Descriptor {
        token,
        multiple: true,
      } => Ok(Arg::Many(self.resolve_all_in(token, context)?)),
      ParamInfo::Transform {
        token,
        transform,
        args,
        multiple,
      } => {
        let transformer = self
          .resolve_in(transform, context)?
          .transformer()
          .ok_or_else(|| InjectError::NotATransform(transform.clone()))?;
        let incoming = if *multiple {
          Arg::Many(self.resolve_all_in(token, context)?)
        } else {
          Arg::One(self.resolve_in(token, context)?)
        };
        Ok(Arg::One(transformer.transform(incoming, args)?))
      }
    }
  }

  /// A lazy handle whose creation resolves the real class through this
  /// container, in a resolution of its own.
  fn delayed_handle(&self, delayed: &DelayedConstructor) -> Instance {
    let container = self.downgrade();
    delayed.create_handle(move |class| {
      let container = Container::upgrade(&container).ok_or(InjectError::ContainerDropped(class.name()))?;
      container.resolve_instance(class)
    })
  }
}

/// Resolves `class`'s parameters after `supplied` and returns the complete
/// argument list.
pub(crate) fn complete_arguments(
  container: &Container,
  class: &Class,
  params: Arc<[Param]>,
  supplied: Vec<Arg>,
) -> Result<Vec<Arg>> {
  let mut context = ResolutionContext::default();
  container.ensure_not_disposed()?;
  container.resolve_arguments(class, &params, supplied, &mut context)
}
