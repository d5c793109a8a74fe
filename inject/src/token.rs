//! Tokens identify bindings inside a container.

use crate::delayed::DelayedConstructor;
use crate::error::Result;
use crate::instance::{Args, Instance};
use crate::type_info::Injectable;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type ConstructFn = fn(&mut Args) -> Result<Instance>;

/// A reference to a class: a concrete Rust type, optionally paired with the
/// means to construct it.
///
/// Two `Class` values are equal when they describe the same type, whether or
/// not they carry a constructor. This lets an interface key created with
/// [`Class::key`] and a constructible class created with [`Class::of`] address
/// the same binding.
#[derive(Clone, Copy)]
pub struct Class {
  type_id: TypeId,
  type_name: &'static str,
  construct: Option<ConstructFn>,
}

impl Class {
  /// A constructible class for an [`Injectable`] type.
  pub fn of<T: Injectable>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      construct: Some(construct_erased::<T>),
    }
  }

  /// A key-only class. Use this for trait objects and plain data types that
  /// are always bound explicitly.
  pub fn key<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      construct: None,
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  /// The fully qualified type name.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// The type name without its module path, as used in error messages.
  pub fn name(&self) -> &'static str {
    short_type_name(self.type_name)
  }

  pub fn is_constructible(&self) -> bool {
    self.construct.is_some()
  }

  pub(crate) fn instantiate(&self, args: &mut Args) -> Option<Result<Instance>> {
    self.construct.map(|construct| construct(args))
  }
}

fn construct_erased<T: Injectable>(args: &mut Args) -> Result<Instance> {
  T::construct(args).map(T::into_instance)
}

impl PartialEq for Class {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id
  }
}

impl Eq for Class {}

impl Hash for Class {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
  }
}

impl fmt::Debug for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A process-unique token with a human readable description.
///
/// Unlike string tokens, two symbols with the same description are distinct.
#[derive(Clone)]
pub struct Symbol {
  id: u64,
  description: Arc<str>,
}

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

impl Symbol {
  pub fn new(description: impl Into<Arc<str>>) -> Self {
    Self {
      id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
      description: description.into(),
    }
  }

  pub fn description(&self) -> &str {
    &self.description
  }
}

impl PartialEq for Symbol {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for Symbol {}

impl Hash for Symbol {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Symbol({})", self.description)
  }
}

/// Identifies a binding.
///
/// Classes and symbols compare by identity, names compare by value and
/// delayed constructors compare by the identity of their accessor.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Token {
  Class(Class),
  Name(Arc<str>),
  Symbol(Symbol),
  Delayed(DelayedConstructor),
}

impl Token {
  /// The token of a constructible class.
  pub fn of<T: Injectable>() -> Self {
    Token::Class(Class::of::<T>())
  }

  /// The token of a type that is only ever bound explicitly, such as `dyn Trait`.
  pub fn key<T: ?Sized + Any>() -> Self {
    Token::Class(Class::key::<T>())
  }

  pub fn named(name: impl Into<Arc<str>>) -> Self {
    Token::Name(name.into())
  }

  /// `true` for string and symbol tokens.
  pub fn is_named(&self) -> bool {
    matches!(self, Token::Name(_) | Token::Symbol(_))
  }

  /// `true` for constructible class and delayed-constructor tokens.
  pub fn is_constructor(&self) -> bool {
    match self {
      Token::Class(class) => class.is_constructible(),
      Token::Delayed(_) => true,
      _ => false,
    }
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Token::Class(class) => f.write_str(class.name()),
      Token::Name(name) => f.write_str(name),
      Token::Symbol(symbol) => write!(f, "Symbol({})", symbol.description()),
      Token::Delayed(delayed) => write!(f, "Delayed({})", delayed.class().name()),
    }
  }
}

impl fmt::Debug for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Token::Class(class) => write!(f, "Class({})", class.name()),
      Token::Name(name) => write!(f, "Name({:?})", name),
      Token::Symbol(symbol) => write!(f, "{:?}", symbol),
      Token::Delayed(delayed) => write!(f, "Delayed({})", delayed.class().name()),
    }
  }
}

impl From<&str> for Token {
  fn from(name: &str) -> Self {
    Token::Name(Arc::from(name))
  }
}

impl From<String> for Token {
  fn from(name: String) -> Self {
    Token::Name(Arc::from(name))
  }
}

impl From<Class> for Token {
  fn from(class: Class) -> Self {
    Token::Class(class)
  }
}

impl From<Symbol> for Token {
  fn from(symbol: Symbol) -> Self {
    Token::Symbol(symbol)
  }
}

impl From<&Symbol> for Token {
  fn from(symbol: &Symbol) -> Self {
    Token::Symbol(symbol.clone())
  }
}

impl From<DelayedConstructor> for Token {
  fn from(delayed: DelayedConstructor) -> Self {
    Token::Delayed(delayed)
  }
}

impl From<&Token> for Token {
  fn from(token: &Token) -> Self {
    token.clone()
  }
}

/// Strips the module path from a type name, leaving generic arguments intact.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
  let end = full.find('<').unwrap_or(full.len());
  match full[..end].rfind("::") {
    Some(idx) => &full[idx + 2..],
    None => full,
  }
}
