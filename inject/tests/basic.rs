use fibre_inject::{
  declare_injectable, Args, Class, Container, InjectError, Injectable, Lifecycle, Param, ParamInfo,
  Provider, RegistrationOptions, Symbol, Token,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

struct Logger {
  prefix: String,
}

trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}

struct GermanGreeter;
impl Greeter for GermanGreeter {
  fn greet(&self) -> String {
    "Hallo!".to_string()
  }
}

static REPO_COUNT: AtomicUsize = AtomicUsize::new(0);

struct Repo {
  serial: usize,
}

impl Injectable for Repo {
  fn construct(_: &mut Args) -> fibre_inject::Result<Self> {
    Ok(Repo {
      serial: REPO_COUNT.fetch_add(1, Ordering::SeqCst),
    })
  }
}

struct UserService {
  repo: Arc<Repo>,
  logger: Arc<Logger>,
  greeters: Vec<Arc<dyn Greeter>>,
}

impl Injectable for UserService {
  fn metadata() -> Vec<Param> {
    vec![
      Param::named("repo", Token::of::<Repo>()),
      Param::named("logger", "Logger"),
      Param::named("greeters", ParamInfo::all(Token::key::<dyn Greeter>())),
    ]
  }

  fn construct(args: &mut Args) -> fibre_inject::Result<Self> {
    Ok(UserService {
      repo: args.next()?,
      logger: args.next()?,
      greeters: args.next_all()?,
    })
  }
}

struct Mailer {
  _host: Arc<String>,
}

impl Injectable for Mailer {
  fn metadata() -> Vec<Param> {
    vec![Param::named("host", "smtp_host")]
  }

  fn construct(args: &mut Args) -> fibre_inject::Result<Self> {
    Ok(Mailer { _host: args.next()? })
  }
}

struct Newsletter {
  _mailer: Arc<Mailer>,
}

impl Injectable for Newsletter {
  fn metadata() -> Vec<Param> {
    vec![Param::unnamed(Token::of::<Mailer>())]
  }

  fn construct(args: &mut Args) -> fibre_inject::Result<Self> {
    Ok(Newsletter { _mailer: args.next()? })
  }
}

fn logger_container() -> (Container, Arc<Logger>) {
  let container = Container::new();
  let logger = Arc::new(Logger {
    prefix: "[app]".to_string(),
  });
  container.register_instance("Logger", logger.clone()).unwrap();
  (container, logger)
}

// --- Basic Tests ---

#[test]
fn test_value_provider_returns_the_same_reference() {
  // Arrange
  let (container, logger) = logger_container();

  // Act
  let resolved = container.resolve::<Logger>("Logger").unwrap();

  // Assert
  assert_eq!(resolved.prefix, "[app]");
  assert!(Arc::ptr_eq(&logger, &resolved));
}

#[test]
fn test_transient_class_returns_distinct_instances() {
  // Arrange
  let container = Container::new();
  container
    .register_class::<Repo>(Lifecycle::Transient.into())
    .unwrap();

  // Act
  let r1 = container.resolve::<Repo>(Token::of::<Repo>()).unwrap();
  let r2 = container.resolve::<Repo>(Token::of::<Repo>()).unwrap();

  // Assert
  assert!(!Arc::ptr_eq(&r1, &r2));
  assert_ne!(r1.serial, r2.serial);
}

#[test]
fn test_singleton_returns_identical_instance() {
  // Arrange
  let container = Container::new();
  container
    .register_singleton(Token::of::<Repo>(), None)
    .unwrap();

  // Act
  let r1 = container.resolve::<Repo>(Token::of::<Repo>()).unwrap();
  let r2 = container.resolve::<Repo>(Token::of::<Repo>()).unwrap();

  // Assert
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_unregistered_class_is_its_own_provider() {
  let container = Container::new();

  let r1 = container.resolve::<Repo>(Token::of::<Repo>()).unwrap();
  let r2 = container.resolve::<Repo>(Token::of::<Repo>()).unwrap();

  assert!(!Arc::ptr_eq(&r1, &r2));
  assert_eq!(
    container.resolve_all::<Repo>(Token::of::<Repo>()).unwrap().len(),
    1
  );
}

#[test]
fn test_constructor_arguments_follow_declared_params() {
  // Arrange
  declare_injectable::<UserService>();
  let (container, logger) = logger_container();
  container
    .register_singleton(Token::of::<Repo>(), None)
    .unwrap()
    .register_instance(
      Token::key::<dyn Greeter>(),
      Arc::new(EnglishGreeter) as Arc<dyn Greeter>,
    )
    .unwrap()
    .register_instance(
      Token::key::<dyn Greeter>(),
      Arc::new(GermanGreeter) as Arc<dyn Greeter>,
    )
    .unwrap();

  // Act
  let service = container
    .resolve::<UserService>(Token::of::<UserService>())
    .unwrap();

  // Assert
  let repo = container.resolve::<Repo>(Token::of::<Repo>()).unwrap();
  assert!(Arc::ptr_eq(&service.repo, &repo));
  assert!(Arc::ptr_eq(&service.logger, &logger));
  let greetings: Vec<_> = service.greeters.iter().map(|g| g.greet()).collect();
  assert_eq!(greetings, vec!["Hello!", "Hallo!"]);
}

#[test]
fn test_resolve_all_keeps_registration_order_and_resolve_takes_the_newest() {
  // Arrange
  let container = Container::new();
  container
    .register_instance("numbers", Arc::new(1_u32))
    .unwrap();
  let first_round = container.resolve_all::<u32>("numbers").unwrap();

  // Act
  container
    .register_instance("numbers", Arc::new(2_u32))
    .unwrap()
    .register_instance("numbers", Arc::new(3_u32))
    .unwrap();

  // Assert
  let all: Vec<u32> = container
    .resolve_all::<u32>("numbers")
    .unwrap()
    .iter()
    .map(|n| **n)
    .collect();
  assert_eq!(all, vec![1, 2, 3]);
  assert_eq!(*first_round[0], 1);
  assert_eq!(*container.resolve::<u32>("numbers").unwrap(), 3);
}

#[test]
fn test_unregistered_tokens_fail_for_resolve_and_resolve_all() {
  let container = Container::new();
  let symbol = Symbol::new("missing");

  assert!(matches!(
    container.resolve_instance("missing"),
    Err(InjectError::Unregistered(Token::Name(_)))
  ));
  assert!(matches!(
    container.resolve_all_instances(&symbol),
    Err(InjectError::Unregistered(Token::Symbol(_)))
  ));
  assert!(matches!(
    container.resolve_instance(Token::key::<dyn Greeter>()),
    Err(InjectError::Unregistered(_))
  ));
  assert_eq!(
    container.resolve_instance("missing").unwrap_err().to_string(),
    "Attempted to resolve unregistered dependency token: \"missing\""
  );
}

#[test]
fn test_factory_receives_the_resolving_container() {
  // Arrange
  let (container, _) = logger_container();
  container
    .register_factory("banner", |c: &Container| {
      let logger = c.resolve::<Logger>("Logger")?;
      Ok(Arc::new(format!("{} ready", logger.prefix)).into())
    })
    .unwrap();

  // Act
  let b1 = container.resolve::<String>("banner").unwrap();
  let b2 = container.resolve::<String>("banner").unwrap();

  // Assert
  assert_eq!(*b1, "[app] ready");
  assert!(!Arc::ptr_eq(&b1, &b2));
}

#[test]
fn test_token_redirects_resolve_their_target() {
  let (container, logger) = logger_container();
  let alias = Symbol::new("log");
  container.register_type(&alias, "Logger").unwrap();

  let resolved = container.resolve::<Logger>(&alias).unwrap();

  assert!(Arc::ptr_eq(&resolved, &logger));
}

#[test]
fn test_trait_objects_resolve_by_interface_key() {
  let container = Container::new();
  container
    .register_type(Token::key::<dyn Greeter>(), "greeter")
    .unwrap()
    .register_instance("greeter", Arc::new(GermanGreeter) as Arc<dyn Greeter>)
    .unwrap();

  let greeter = container
    .resolve::<dyn Greeter>(Token::key::<dyn Greeter>())
    .unwrap();

  assert_eq!(greeter.greet(), "Hallo!");
}

#[test]
fn test_is_registered_checks_ancestors_only_when_recursive() {
  let (parent, _) = logger_container();
  let child = parent.create_child_container();

  assert!(parent.is_registered("Logger", false));
  assert!(!child.is_registered("Logger", false));
  assert!(child.is_registered("Logger", true));
  assert!(!child.is_registered("Nothing", true));
}

#[test]
fn test_type_mismatch_is_reported() {
  let (container, _) = logger_container();

  let err = container.resolve::<String>("Logger").unwrap_err();

  assert!(matches!(err, InjectError::TypeMismatch { .. }));
}

// --- Registration Validation ---

#[test]
fn test_value_and_factory_providers_reject_caching_lifecycles() {
  let container = Container::new();

  let value = container.register(
    "config",
    Provider::value(1_u8),
    RegistrationOptions::new(Lifecycle::Singleton),
  );
  let factory = container.register(
    "clock",
    Provider::factory(|_| Ok(fibre_inject::Instance::new(0_u64))),
    Lifecycle::ContainerScoped.into(),
  );

  assert!(matches!(
    value,
    Err(InjectError::IncompatibleLifecycle {
      lifecycle: Lifecycle::Singleton,
      ..
    })
  ));
  assert!(matches!(
    factory,
    Err(InjectError::IncompatibleLifecycle { .. })
  ));
  assert!(!container.is_registered("config", false));
}

#[test]
fn test_token_redirect_cycles_are_rejected() {
  let container = Container::new();
  container.register_type("a", "b").unwrap();
  container.register_type("b", "c").unwrap();

  let err = container.register_type("c", "a").unwrap_err();

  assert_eq!(
    err.to_string(),
    "Token registration cycle detected! c -> a -> b -> c"
  );
}

#[test]
fn test_singleton_names_need_a_target() {
  let container = Container::new();

  let err = container.register_singleton("orphan", None).unwrap_err();
  assert!(matches!(err, InjectError::InvalidProvider(_)));

  let err = container
    .register_singleton(Token::key::<dyn Greeter>(), None)
    .unwrap_err();
  assert!(matches!(err, InjectError::InvalidProvider(_)));

  let err = container
    .register(
      "interface",
      Provider::Class(Class::key::<dyn Greeter>()),
      RegistrationOptions::default(),
    )
    .unwrap_err();
  assert!(matches!(err, InjectError::InvalidProvider(_)));
}

#[test]
fn test_interface_keys_redirect_to_other_interface_keys() {
  trait Salutation: Send + Sync {}

  // Arrange
  let container = Container::new();
  container
    .register_type(Token::key::<dyn Greeter>(), Token::key::<dyn Salutation>())
    .unwrap()
    .register_instance(
      Token::key::<dyn Salutation>(),
      Arc::new(EnglishGreeter) as Arc<dyn Greeter>,
    )
    .unwrap();

  // Act
  let greeter = container
    .resolve::<dyn Greeter>(Token::key::<dyn Greeter>())
    .unwrap();

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
}

// --- Failure Reporting ---

#[test]
fn test_nested_injection_failures_name_each_constructor() {
  // Arrange
  declare_injectable::<Mailer>();
  declare_injectable::<Newsletter>();
  let container = Container::new();

  // Act
  let err = container
    .resolve_instance(Token::of::<Newsletter>())
    .unwrap_err();

  // Assert
  let expected = [
    "Cannot inject the dependency at position #0 of \"Newsletter\" constructor. Reason:",
    "    Cannot inject the dependency \"host\" at position #0 of \"Mailer\" constructor. Reason:",
    "        Attempted to resolve unregistered dependency token: \"smtp_host\"",
  ]
  .join("\n");
  assert_eq!(err.to_string(), expected);
}

#[test]
fn test_direct_cycles_are_detected() {
  struct Left;
  struct Right;

  impl Injectable for Left {
    fn metadata() -> Vec<Param> {
      vec![Param::named("right", Token::of::<Right>())]
    }
    fn construct(_: &mut Args) -> fibre_inject::Result<Self> {
      Ok(Left)
    }
  }

  impl Injectable for Right {
    fn metadata() -> Vec<Param> {
      vec![Param::named("left", Token::of::<Left>())]
    }
    fn construct(_: &mut Args) -> fibre_inject::Result<Self> {
      Ok(Right)
    }
  }

  declare_injectable::<Left>();
  declare_injectable::<Right>();
  let container = Container::new();

  let err = container.resolve_instance(Token::of::<Left>()).unwrap_err();

  // Left -> Right -> Left: the innermost failure is the cycle itself.
  let mut source = &err;
  while let InjectError::ConstructorInjection { source: inner, .. } = source {
    source = inner;
  }
  assert!(matches!(source, InjectError::CyclicDependency(Token::Class(_))));
}
