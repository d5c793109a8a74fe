use fibre_inject::{global, Container, InterceptorOptions, ResolutionType, Token};
use std::sync::Arc;

// A function that configures dependencies and runs some logic.
// By accepting a `&Container`, it can be tested with a controlled environment.
fn process_data(container: &Container) -> fibre_inject::Result<String> {
  // Register a data source ONLY within the scope of this container.
  container.register_instance("data", Arc::new("test data".to_string()))?;

  let data = container.resolve::<String>("data")?;
  Ok(format!("Processed: {}", data.to_uppercase()))
}

fn main() -> fibre_inject::Result<()> {
  println!("--- Running with a child of the default container ---");
  let request_scope = global().create_child_container();
  request_scope.before_resolution(
    "data",
    |token: &Token, _: ResolutionType| {
      println!("Resolving {} for the first time", token);
      Ok(())
    },
    InterceptorOptions::once(),
  );

  let result = process_data(&request_scope)?;
  println!("Result: {}", result);
  assert_eq!(result, "Processed: TEST DATA");

  // The binding registered in the child must NOT exist in the default container.
  assert!(
    global().resolve::<String>("data").is_err(),
    "Dependency should not have leaked into the default container!"
  );
  assert!(!global().is_registered("data", true));

  println!("\nVerified that the child container is isolated from its parent.");
  Ok(())
}
