//! Constructor metadata: what each class needs injected, position by position.

use crate::error::{InjectError, Result};
use crate::instance::{Args, Instance};
use crate::token::{Class, Token};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A type the container knows how to build.
///
/// `metadata` plays the role of compiler-reported constructor parameter types.
/// Types that do not describe their parameters there must supply explicit
/// tokens through [`declare_injectable_with`].
///
/// # Examples
///
/// ```
/// use fibre_inject::{Args, Injectable, Param, Result, Token};
/// use std::sync::Arc;
///
/// struct Database;
/// impl Injectable for Database {
///   fn construct(_: &mut Args) -> Result<Self> {
///     Ok(Database)
///   }
/// }
///
/// struct UserService {
///   db: Arc<Database>,
/// }
/// impl Injectable for UserService {
///   fn metadata() -> Vec<Param> {
///     vec![Param::named("db", Token::of::<Database>())]
///   }
///   fn construct(args: &mut Args) -> Result<Self> {
///     Ok(UserService { db: args.next()? })
///   }
/// }
/// ```
pub trait Injectable: Any + Send + Sync + Sized {
  /// The declared constructor parameters, in order.
  fn metadata() -> Vec<Param> {
    Vec::new()
  }

  fn construct(args: &mut Args) -> Result<Self>;

  /// Erases the constructed value. Override to expose capabilities such as
  /// disposal via [`Instance::disposable`].
  fn into_instance(self) -> Instance {
    Instance::new(self)
  }
}

/// How a single constructor position is resolved.
#[derive(Clone, Debug)]
pub enum ParamInfo {
  Token(Token),
  Descriptor {
    token: Token,
    multiple: bool,
  },
  /// Resolves `token` (or every binding of it, if `multiple`) and hands the
  /// result to the transform resolved from `transform`, together with `args`.
  Transform {
    token: Token,
    transform: Token,
    args: Vec<Instance>,
    multiple: bool,
  },
}

impl ParamInfo {
  /// Every binding of `token`, in registration order.
  pub fn all(token: impl Into<Token>) -> Self {
    ParamInfo::Descriptor {
      token: token.into(),
      multiple: true,
    }
  }

  pub fn transformed(
    token: impl Into<Token>,
    transform: impl Into<Token>,
    args: Vec<Instance>,
  ) -> Self {
    ParamInfo::Transform {
      token: token.into(),
      transform: transform.into(),
      args,
      multiple: false,
    }
  }

  pub fn transformed_all(
    token: impl Into<Token>,
    transform: impl Into<Token>,
    args: Vec<Instance>,
  ) -> Self {
    ParamInfo::Transform {
      token: token.into(),
      transform: transform.into(),
      args,
      multiple: true,
    }
  }
}

impl From<Token> for ParamInfo {
  fn from(token: Token) -> Self {
    ParamInfo::Token(token)
  }
}

impl From<&str> for ParamInfo {
  fn from(name: &str) -> Self {
    ParamInfo::Token(Token::from(name))
  }
}

/// A constructor position: its resolution rule and, when known, its name.
#[derive(Clone, Debug)]
pub struct Param {
  pub name: Option<&'static str>,
  pub info: ParamInfo,
}

impl Param {
  pub fn named(name: &'static str, info: impl Into<ParamInfo>) -> Self {
    Self {
      name: Some(name),
      info: info.into(),
    }
  }

  pub fn unnamed(info: impl Into<ParamInfo>) -> Self {
    Self {
      name: None,
      info: info.into(),
    }
  }
}

/// Process-wide map from class identity to its ordered parameters.
#[derive(Default)]
pub struct TypeInfoStore {
  params: DashMap<TypeId, Arc<[Param]>>,
}

static TYPE_INFO: Lazy<TypeInfoStore> = Lazy::new(TypeInfoStore::default);

/// Provides a reference to the process-wide type information store.
pub fn type_info() -> &'static TypeInfoStore {
  &TYPE_INFO
}

impl TypeInfoStore {
  /// Stores the parameters of `class`. Re-declaring a class replaces them.
  pub fn declare(&self, class: &Class, params: Vec<Param>) {
    tracing::debug!(class = class.name(), params = params.len(), "declared injectable");
    self.params.insert(class.type_id(), params.into());
  }

  /// The parameters of `class`, or an empty list if it was never declared.
  pub fn get(&self, class: &Class) -> Arc<[Param]> {
    self.lookup(class).unwrap_or_else(|| Arc::from(Vec::new()))
  }

  pub fn is_declared(&self, class: &Class) -> bool {
    self.params.contains_key(&class.type_id())
  }

  pub(crate) fn lookup(&self, class: &Class) -> Option<Arc<[Param]>> {
    self
      .params
      .get(&class.type_id())
      .map(|entry| entry.value().clone())
  }
}

/// Marks `T` injectable, capturing its declared parameters.
pub fn declare_injectable<T: Injectable>() {
  type_info().declare(&Class::of::<T>(), T::metadata());
}

/// Marks `T` injectable, overriding the tokens at specific positions.
///
/// An override may extend the declared list by exactly one position at a
/// time; skipping positions fails with [`InjectError::ParameterGap`].
pub fn declare_injectable_with<T, I>(overrides: I) -> Result<()>
where
  T: Injectable,
  I: IntoIterator<Item = (usize, ParamInfo)>,
{
  let class = Class::of::<T>();
  let mut params = T::metadata();
  let mut overrides: Vec<_> = overrides.into_iter().collect();
  overrides.sort_by_key(|(position, _)| *position);

  for (position, info) in overrides {
    let declared = params.len();
    match params.get_mut(position) {
      Some(param) => param.info = info,
      None if position == declared => params.push(Param::unnamed(info)),
      None => {
        return Err(InjectError::ParameterGap {
          class: class.name(),
          position,
          declared,
        })
      }
    }
  }

  type_info().declare(&class, params);
  Ok(())
}

/// The stored parameters of `class`.
pub fn param_info(class: &Class) -> Arc<[Param]> {
  type_info().get(class)
}
