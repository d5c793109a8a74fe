//! Public macros for ergonomic resolution from the default container.

/// Resolves a service from the default container.
///
/// Without a token, the type itself is the token (`Token::key::<T>()`).
///
/// # Panics
///
/// This macro will panic if the service cannot be resolved. For a non-panicking
/// version, use [`maybe_resolve!`] or `global().resolve(...)` directly.
///
/// # Examples
///
/// ```
/// use fibre_inject::{global, resolve, Token};
/// use std::sync::Arc;
///
/// // Register a simple type under its own type and under a name.
/// global().register_instance(Token::key::<u64>(), Arc::new(7_u64)).unwrap();
/// global().register_instance("answer", Arc::new(42_u64)).unwrap();
///
/// assert_eq!(*resolve!(u64), 7);
/// assert_eq!(*resolve!(u64, "answer"), 42);
/// ```
///
/// ```
/// use fibre_inject::{global, resolve, Token};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// // Register a trait implementation
/// global()
///   .register_instance(Token::key::<dyn Greeter>(), Arc::new(EnglishGreeter) as Arc<dyn Greeter>)
///   .unwrap();
///
/// // Resolve the trait object
/// let greeter = resolve!(trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a trait object: resolve!(trait MyTrait)
    // `:ident` captures the trait's name so `dyn` can be prepended.
    (trait $trait_ident:ident) => {
        $crate::global()
            .resolve::<dyn $trait_ident>($crate::Token::key::<dyn $trait_ident>())
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required trait service: {}: {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    e
                )
            })
    };

    // Arm for resolving a trait object under a token: resolve!(trait MyTrait, "name")
    (trait $trait_ident:ident, $token:expr) => {
        $crate::global()
            .resolve::<dyn $trait_ident>($token)
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required trait service: {}: {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    e
                )
            })
    };

    // Arm for resolving a type keyed by itself: resolve!(MyService)
    ($type:ty) => {
        $crate::global()
            .resolve::<$type>($crate::Token::key::<$type>())
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required service: {}: {}",
                    std::any::type_name::<$type>(),
                    e
                )
            })
    };

    // Arm for resolving a type under a token: resolve!(MyService, "name")
    ($type:ty, $token:expr) => {
        $crate::global()
            .resolve::<$type>($token)
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required service: {}: {}",
                    std::any::type_name::<$type>(),
                    e
                )
            })
    };
}

/// Like [`resolve!`], but returns `None` instead of panicking.
#[macro_export]
macro_rules! maybe_resolve {
    (trait $trait_ident:ident) => {
        $crate::global()
            .resolve::<dyn $trait_ident>($crate::Token::key::<dyn $trait_ident>())
            .ok()
    };

    (trait $trait_ident:ident, $token:expr) => {
        $crate::global().resolve::<dyn $trait_ident>($token).ok()
    };

    ($type:ty) => {
        $crate::global()
            .resolve::<$type>($crate::Token::key::<$type>())
            .ok()
    };

    ($type:ty, $token:expr) => {
        $crate::global().resolve::<$type>($token).ok()
    };
}
