use crate::provider::Lifecycle;
use crate::token::Token;
use thiserror::Error;

/// A boxed error raised by user code (factories, disposers, transforms).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the `fibre_inject` library.
#[derive(Debug, Error)]
pub enum InjectError {
  #[error("Attempted to resolve unregistered dependency token: \"{0}\"")]
  Unregistered(Token),

  #[error(
    "Cannot inject the dependency {} of \"{class}\" constructor. Reason:\n{}",
    describe_param(.param, .position),
    indent(.source)
  )]
  ConstructorInjection {
    class: &'static str,
    position: usize,
    param: Option<&'static str>,
    #[source]
    source: Box<InjectError>,
  },

  #[error("Invalid provider: {0}")]
  InvalidProvider(String),

  #[error("Cannot use lifecycle \"{lifecycle:?}\" with value or factory providers (token \"{token}\")")]
  IncompatibleLifecycle { token: Token, lifecycle: Lifecycle },

  #[error("Token registration cycle detected! {0}")]
  TokenCycle(String),

  #[error("Circular dependency detected while resolving \"{0}\". Break the cycle with `delay`.")]
  CyclicDependency(Token),

  #[error("Expected a value of type `{expected}` but the container produced `{found}`")]
  TypeMismatch {
    expected: &'static str,
    found: &'static str,
  },

  #[error("Constructor of \"{class}\" requested argument #{position} but only {supplied} were resolved")]
  MissingArgument {
    class: &'static str,
    position: usize,
    supplied: usize,
  },

  #[error("Parameter override for \"{class}\" at position #{position} leaves a gap after {declared} declared parameters")]
  ParameterGap {
    class: &'static str,
    position: usize,
    declared: usize,
  },

  #[error("Token \"{0}\" did not resolve to a transform")]
  NotATransform(Token),

  #[error("This container has been disposed, you cannot interact with a disposed container")]
  Disposed,

  #[error("The container backing a delayed instance of \"{0}\" has been dropped")]
  ContainerDropped(&'static str),

  #[error("{}", describe_failures(.0))]
  Disposal(Vec<InjectError>),

  #[error("{0}")]
  Custom(#[from] BoxError),
}

impl InjectError {
  /// Wraps any user-level error.
  pub fn custom<E>(error: E) -> Self
  where
    E: Into<BoxError>,
  {
    InjectError::Custom(error.into())
  }

  pub(crate) fn at_param(
    class: &'static str,
    position: usize,
    param: Option<&'static str>,
    source: InjectError,
  ) -> Self {
    InjectError::ConstructorInjection {
      class,
      position,
      param,
      source: Box::new(source),
    }
  }
}

fn describe_param(param: &Option<&'static str>, position: &usize) -> String {
  match param {
    Some(name) => format!("\"{}\" at position #{}", name, position),
    None => format!("at position #{}", position),
  }
}

fn indent(source: &InjectError) -> String {
  source
    .to_string()
    .lines()
    .map(|line| format!("    {}", line))
    .collect::<Vec<_>>()
    .join("\n")
}

fn describe_failures(failures: &[InjectError]) -> String {
  let reasons = failures
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ");
  format!("{} disposer(s) failed: {}", failures.len(), reasons)
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = InjectError> = std::result::Result<T, E>;
