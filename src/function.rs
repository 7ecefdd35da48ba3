//! The external function capability.
//!
//! A document may contain deferred calls like `x: foo(1, 2)`. The core
//! never knows how to evaluate them; the host injects a [`FunctionResolver`]
//! and the serializer consults it in invoke mode. Results are produced fresh
//! on every read; callers that want caching wrap their resolver.

use indexmap::IndexMap;

use crate::error::FunctionError;
use crate::value::Value;

/// Resolves a qualified function name into the values it produces.
pub trait FunctionResolver {
    /// Evaluate `name` over already-converted argument values. A call may
    /// produce several values; the serializer renders them in order.
    fn resolve(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, FunctionError>;

    /// Whether the argument text of `name` should be captured verbatim by
    /// the parser instead of being parsed as structured values.
    fn is_content_simple(&self, _name: &str) -> bool {
        false
    }
}

type Callable = Box<dyn Fn(&[Value]) -> Result<Vec<Value>, FunctionError>>;

/// A name-to-callable table implementing [`FunctionResolver`].
#[derive(Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Callable>,
    content_simple: Vec<String>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, FunctionError> + 'static,
    {
        self.functions.insert(name.into(), Box::new(f));
    }

    /// Register a function whose argument text is captured verbatim; it
    /// receives that text as a single `Value::String` argument.
    pub fn register_content_simple<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, FunctionError> + 'static,
    {
        let name = name.into();
        self.content_simple.push(name.clone());
        self.functions.insert(name, Box::new(f));
    }
}

impl FunctionResolver for FunctionRegistry {
    fn resolve(&self, name: &str, args: &[Value]) -> Result<Vec<Value>, FunctionError> {
        match self.functions.get(name) {
            Some(f) => f(args),
            None => Err(FunctionError::Unresolved { name: name.into() }),
        }
    }

    fn is_content_simple(&self, name: &str) -> bool {
        self.content_simple.iter().any(|n| n == name)
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("content_simple", &self.content_simple)
            .finish()
    }
}
