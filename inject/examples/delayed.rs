use fibre_inject::{declare_injectable, delay, Args, Container, Delayed, Injectable, Param, Token};
use std::sync::Arc;

// `Library` and `Catalog` need each other. `Library` takes a lazy handle so the
// cycle is broken at construction time.
struct Library {
  catalog: Delayed<Catalog>,
}

impl Injectable for Library {
  fn metadata() -> Vec<Param> {
    vec![Param::named("catalog", Token::from(delay::<Catalog>()))]
  }

  fn construct(args: &mut Args) -> fibre_inject::Result<Self> {
    Ok(Library {
      catalog: args.next_delayed()?,
    })
  }
}

struct Catalog {
  library: Arc<Library>,
}

impl Injectable for Catalog {
  fn metadata() -> Vec<Param> {
    vec![Param::named("library", Token::of::<Library>())]
  }

  fn construct(args: &mut Args) -> fibre_inject::Result<Self> {
    Ok(Catalog {
      library: args.next()?,
    })
  }
}

impl Catalog {
  fn size(&self) -> usize {
    42
  }
}

fn main() -> fibre_inject::Result<()> {
  declare_injectable::<Library>();
  declare_injectable::<Catalog>();

  let container = Container::new();
  let library = container.resolve::<Library>(Token::of::<Library>())?;
  println!("Catalog created yet? {}", library.catalog.is_created());

  // The first access builds the catalog.
  println!("Catalog size: {}", library.catalog.size());
  println!("Catalog created yet? {}", library.catalog.is_created());
  assert!(!library.catalog.library.catalog.is_created());
  Ok(())
}
