use fibre_inject::{
  declare_injectable, Args, Container, Disposable, Disposal, InjectError, Injectable, Instance,
  Lifecycle, Param, Token,
};
use futures_executor::block_on;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

// --- Test Fixtures ---

type Journal = Arc<Mutex<Vec<&'static str>>>;

fn journal_container() -> (Container, Journal) {
  let container = Container::new();
  let journal: Journal = Arc::new(Mutex::new(Vec::new()));
  container
    .register_instance("journal", journal.clone())
    .unwrap();
  (container, journal)
}

struct Pool {
  journal: Journal,
}

impl Injectable for Pool {
  fn metadata() -> Vec<Param> {
    vec![Param::named("journal", "journal")]
  }

  fn construct(args: &mut Args) -> fibre_inject::Result<Self> {
    let journal: Journal = args.next()?;
    Ok(Pool { journal })
  }

  fn into_instance(self) -> Instance {
    Instance::disposable(self)
  }
}

impl Disposable for Pool {
  fn dispose(&self) -> Disposal {
    self.journal.lock().push("pool");
    Disposal::done()
  }
}

struct Cache {
  journal: Journal,
}

impl Injectable for Cache {
  fn metadata() -> Vec<Param> {
    vec![Param::named("journal", "journal")]
  }

  fn construct(args: &mut Args) -> fibre_inject::Result<Self> {
    let journal: Journal = args.next()?;
    Ok(Cache { journal })
  }

  fn into_instance(self) -> Instance {
    Instance::disposable(self)
  }
}

impl Disposable for Cache {
  fn dispose(&self) -> Disposal {
    let journal = self.journal.clone();
    Disposal::pending(async move {
      journal.lock().push("cache");
      Ok(())
    })
  }
}

struct Socket;

impl Injectable for Socket {
  fn construct(_: &mut Args) -> fibre_inject::Result<Self> {
    Ok(Socket)
  }

  fn into_instance(self) -> Instance {
    Instance::disposable(self)
  }
}

impl Disposable for Socket {
  fn dispose(&self) -> Disposal {
    Disposal::Ready(Err(InjectError::custom("socket busy")))
  }
}

fn declare_fixtures() {
  declare_injectable::<Pool>();
  declare_injectable::<Cache>();
}

// --- Disposal Tests ---

#[test]
fn test_sync_disposers_run_in_creation_order() {
  // Arrange
  declare_fixtures();
  let (container, journal) = journal_container();
  container
    .register_class::<Pool>(Lifecycle::Transient.into())
    .unwrap();
  container.resolve_instance(Token::of::<Pool>()).unwrap();
  container.resolve_instance(Token::of::<Pool>()).unwrap();

  // Act
  let disposal = container.dispose();

  // Assert
  assert!(!disposal.is_pending());
  assert!(block_on(disposal.settle()).is_ok());
  assert_eq!(*journal.lock(), vec!["pool", "pool"]);
  assert!(container.is_disposed());
}

#[test]
fn test_async_disposers_make_disposal_pending() {
  // Arrange
  declare_fixtures();
  let (container, journal) = journal_container();
  container
    .register_class::<Pool>(Lifecycle::Singleton.into())
    .unwrap()
    .register_class::<Cache>(Lifecycle::Singleton.into())
    .unwrap();
  container.resolve_instance(Token::of::<Cache>()).unwrap();
  container.resolve_instance(Token::of::<Pool>()).unwrap();

  // Act
  let disposal = container.dispose();

  // Assert
  assert!(disposal.is_pending());
  assert_eq!(*journal.lock(), vec!["pool"]);
  block_on(disposal.settle()).unwrap();
  assert_eq!(*journal.lock(), vec!["pool", "cache"]);
}

#[test]
fn test_disposing_twice_is_a_no_op() {
  declare_fixtures();
  let (container, journal) = journal_container();
  container.resolve_instance(Token::of::<Pool>()).unwrap();

  block_on(container.dispose().settle()).unwrap();
  let second = container.dispose();

  assert!(!second.is_pending());
  assert!(block_on(second.settle()).is_ok());
  assert_eq!(journal.lock().len(), 1);
}

#[test]
fn test_disposer_failures_are_aggregated() {
  // Arrange
  declare_fixtures();
  let (container, journal) = journal_container();
  container.resolve_instance(Token::of::<Socket>()).unwrap();
  container.resolve_instance(Token::of::<Pool>()).unwrap();
  container.resolve_instance(Token::of::<Socket>()).unwrap();

  // Act
  let result = block_on(container.dispose().settle());

  // Assert
  let err = result.unwrap_err();
  assert_eq!(
    err.to_string(),
    "2 disposer(s) failed: socket busy; socket busy"
  );
  assert_eq!(*journal.lock(), vec!["pool"]);
}

#[test]
fn test_values_and_factories_are_not_tracked() {
  let container = Container::new();
  container
    .register_instance("socket", Instance::disposable(Socket))
    .unwrap()
    .register_factory("fresh_socket", |_| Ok(Instance::disposable(Socket)))
    .unwrap();
  container.resolve_instance("socket").unwrap();
  container.resolve_instance("fresh_socket").unwrap();

  assert!(block_on(container.dispose().settle()).is_ok());
}

#[test]
fn test_disposed_container_rejects_every_interaction() {
  let (container, _) = journal_container();
  block_on(container.dispose().settle()).unwrap();

  assert!(matches!(
    container.resolve_instance("journal"),
    Err(InjectError::Disposed)
  ));
  assert!(matches!(
    container.resolve_all_instances("journal"),
    Err(InjectError::Disposed)
  ));
  assert!(matches!(
    container.register_instance("late", Arc::new(1_u8)),
    Err(InjectError::Disposed)
  ));
}

#[test]
fn test_child_disposal_leaves_the_parent_usable() {
  declare_fixtures();
  let (parent, journal) = journal_container();
  let child = parent.create_child_container();
  child.resolve_instance(Token::of::<Pool>()).unwrap();

  block_on(child.dispose().settle()).unwrap();

  assert_eq!(*journal.lock(), vec!["pool"]);
  assert!(parent.resolve_instance("journal").is_ok());
  assert!(!parent.is_disposed());
}
