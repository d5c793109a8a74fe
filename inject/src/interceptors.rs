//! Callbacks fired around resolutions of a token.

use crate::error::Result;
use crate::instance::Instance;
use crate::token::Token;
use dashmap::DashMap;
use std::sync::Arc;

/// How often an interceptor fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
  #[default]
  Always,
  Once,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterceptorOptions {
  pub frequency: Frequency,
}

impl InterceptorOptions {
  pub fn always() -> Self {
    Self {
      frequency: Frequency::Always,
    }
  }

  pub fn once() -> Self {
    Self {
      frequency: Frequency::Once,
    }
  }
}

/// Which entry point triggered a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionType {
  Single,
  All,
}

/// The value handed to post-resolution interceptors.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
  Single(&'a Instance),
  All(&'a [Instance]),
}

pub type PreResolutionCallback = Arc<dyn Fn(&Token, ResolutionType) -> Result<()> + Send + Sync>;
pub type PostResolutionCallback =
  Arc<dyn Fn(&Token, Resolved<'_>, ResolutionType) -> Result<()> + Send + Sync>;

#[derive(Clone)]
struct Interceptor<C> {
  callback: C,
  frequency: Frequency,
}

pub(crate) struct InterceptorList<C> {
  by_token: DashMap<Token, Vec<Interceptor<C>>>,
}

impl<C> Default for InterceptorList<C> {
  fn default() -> Self {
    Self {
      by_token: DashMap::new(),
    }
  }
}

impl<C: Clone> InterceptorList<C> {
  fn add(&self, token: Token, callback: C, options: InterceptorOptions) {
    self.by_token.entry(token).or_default().push(Interceptor {
      callback,
      frequency: options.frequency,
    });
  }

  /// Takes the callbacks due for one resolution of `token`, in registration
  /// order. `Once` callbacks leave the registry here, before they run, so a
  /// failing or re-entrant callback still fires only once.
  fn take_due(&self, token: &Token) -> Vec<C> {
    let Some(mut interceptors) = self.by_token.get_mut(token) else {
      return Vec::new();
    };
    let due = interceptors
      .iter()
      .map(|interceptor| interceptor.callback.clone())
      .collect();
    interceptors.retain(|interceptor| interceptor.frequency == Frequency::Always);
    due
  }

  fn clear(&self) {
    self.by_token.clear();
  }
}

/// Per-container pre and post resolution callbacks. Not inherited by children.
#[derive(Default)]
pub(crate) struct InterceptorRegistry {
  pre: InterceptorList<PreResolutionCallback>,
  post: InterceptorList<PostResolutionCallback>,
}

impl InterceptorRegistry {
  pub(crate) fn add_pre(
    &self,
    token: Token,
    callback: PreResolutionCallback,
    options: InterceptorOptions,
  ) {
    self.pre.add(token, callback, options);
  }

  pub(crate) fn add_post(
    &self,
    token: Token,
    callback: PostResolutionCallback,
    options: InterceptorOptions,
  ) {
    self.post.add(token, callback, options);
  }

  pub(crate) fn before(&self, token: &Token, resolution_type: ResolutionType) -> Result<()> {
    for callback in self.pre.take_due(token) {
      callback(token, resolution_type)?;
    }
    Ok(())
  }

  pub(crate) fn after(
    &self,
    token: &Token,
    resolved: Resolved<'_>,
    resolution_type: ResolutionType,
  ) -> Result<()> {
    for callback in self.post.take_due(token) {
      callback(token, resolved, resolution_type)?;
    }
    Ok(())
  }

  pub(crate) fn clear(&self) {
    self.pre.clear();
    self.post.clear();
  }
}
