//! The processor library (C6, §4.6): pure, total, side-effect-free
//! functions from the current snapshot of a virtual control's physical
//! inputs to its output value. The engine only knows processors by name
//! (the design names them as strings, e.g. `"passthrough"`,
//! `"not_any"`); a [`ProcessorRegistry`] maps those names to
//! implementations, mirroring the "vtable-style registration API used by
//! the parser" called for in §9.

use ::njoy_wire::Value;

use crate::error::{EngineError, Result};

/// A pure function over the ordered list of an virtual control's input
/// values, in design-declaration order. Processors never see identities
/// or devices, only values, and must not panic on well-typed input: the
/// arity/type checks happen once, at registration time against the
/// design, not on every invocation.
pub trait Processor: Send + Sync {
    fn apply(&self, inputs: &[Value]) -> Result<Value>;

    /// A human name for diagnostics; not used for dispatch.
    fn name(&self) -> &str;
}

fn as_bool(name: &str, value: &Value) -> Result<bool> {
    value.as_button().ok_or_else(|| EngineError::ArityMismatch {
        processor: name.to_string(),
        expected: "boolean inputs",
        got: 0,
    })
}

/// `passthrough(x) = x`, unary, any kind.
struct Passthrough;
impl Processor for Passthrough {
    fn apply(&self, inputs: &[Value]) -> Result<Value> {
        match inputs {
            [v] => Ok(*v),
            _ => Err(EngineError::ArityMismatch {
                processor: self.name().into(),
                expected: "exactly 1 input",
                got: inputs.len(),
            }),
        }
    }
    fn name(&self) -> &str {
        "passthrough"
    }
}

/// `not_(x) = ¬x`, unary, boolean.
struct Not;
impl Processor for Not {
    fn apply(&self, inputs: &[Value]) -> Result<Value> {
        match inputs {
            [v] => Ok(Value::Button(!as_bool(self.name(), v)?)),
            _ => Err(EngineError::ArityMismatch {
                processor: self.name().into(),
                expected: "exactly 1 input",
                got: inputs.len(),
            }),
        }
    }
    fn name(&self) -> &str {
        "not_"
    }
}

/// `any(xs) = OR over xs`, n-ary, boolean.
struct Any;
impl Processor for Any {
    fn apply(&self, inputs: &[Value]) -> Result<Value> {
        let mut result = false;
        for v in inputs {
            result |= as_bool(self.name(), v)?;
        }
        Ok(Value::Button(result))
    }
    fn name(&self) -> &str {
        "any"
    }
}

/// `not_any(xs) = ¬any(xs)`, n-ary, boolean. This is the engine's model
/// of the "neither buttons" pseudo-button (§9's first Open Question):
/// a combinator over ordinary buttons, no distinct control kind.
struct NotAny;
impl Processor for NotAny {
    fn apply(&self, inputs: &[Value]) -> Result<Value> {
        let mut result = false;
        for v in inputs {
            result |= as_bool(self.name(), v)?;
        }
        Ok(Value::Button(!result))
    }
    fn name(&self) -> &str {
        "not_any"
    }
}

/// Maps processor names (as named by a design) to implementations.
/// Richer combinators may be registered by a caller before the design is
/// resolved; the engine has no knowledge of their bodies (§4.6). Entries
/// are `Arc`'d so `get` can hand a caller (the Engine, assembling
/// Actuators on separate threads) an owned, `'static` handle instead of
/// a borrow tied to the registry.
pub struct ProcessorRegistry {
    processors: ::std::collections::HashMap<String, ::std::sync::Arc<dyn Processor>>,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        let mut registry = ProcessorRegistry {
            processors: ::std::collections::HashMap::new(),
        };
        registry.register(::std::sync::Arc::new(Passthrough));
        registry.register(::std::sync::Arc::new(Not));
        registry.register(::std::sync::Arc::new(Any));
        registry.register(::std::sync::Arc::new(NotAny));
        registry
    }
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, processor: ::std::sync::Arc<dyn Processor>) {
        self.processors.insert(processor.name().to_string(), processor);
    }

    pub fn get(&self, name: &str) -> Result<::std::sync::Arc<dyn Processor>> {
        self.processors
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownProcessor(name.to_string()))
    }
}
