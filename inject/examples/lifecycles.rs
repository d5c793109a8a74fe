use fibre_inject::{global, resolve, Args, Injectable, Lifecycle, Token};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

impl Injectable for RequestTracker {
  fn construct(_: &mut Args) -> fibre_inject::Result<Self> {
    println!("Creating RequestTracker...");
    Ok(RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    })
  }
}

fn main() -> fibre_inject::Result<()> {
  // --- Singleton Registration ---
  // The class is only constructed ONCE.
  global().register_singleton("singleton_tracker", Some(Token::of::<RequestTracker>()))?;

  // --- Transient Registration ---
  // A redirect to the unregistered class builds a fresh instance EVERY time.
  global().register_type("transient_tracker", Token::of::<RequestTracker>())?;

  println!("--- Resolving Singletons ---");
  let s1 = resolve!(RequestTracker, "singleton_tracker");
  let s2 = resolve!(RequestTracker, "singleton_tracker");
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert!(
    Arc::ptr_eq(&s1, &s2),
    "Singleton instances should be identical"
  );

  println!("--- Resolving Transients ---");
  let t1 = resolve!(RequestTracker, "transient_tracker");
  let t2 = resolve!(RequestTracker, "transient_tracker");
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert!(
    !Arc::ptr_eq(&t1, &t2),
    "Transient instances should be different"
  );

  // --- Container Scoped ---
  // Each child container builds its own instance.
  let root = global().create_child_container();
  root.register_class::<RequestTracker>(Lifecycle::ContainerScoped.into())?;
  let a = root.create_child_container();
  let b = root.create_child_container();
  let from_a = a.resolve::<RequestTracker>(Token::of::<RequestTracker>())?;
  let from_b = b.resolve::<RequestTracker>(Token::of::<RequestTracker>())?;
  println!("Child A ID: {}, Child B ID: {}", from_a.id, from_b.id);
  assert_ne!(from_a.id, from_b.id);

  Ok(())
}
