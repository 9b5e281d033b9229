//! The nJoy core: the object-model-aware runtime that sits between the
//! wire codec (`njoy-wire`) and a design (`njoy-design`) on one side and
//! the process bootstrap (the launcher binary) on the other.
//!
//! Module map:
//! - [`mux`]: the Input and Output Multiplexers (C3, C4)
//! - [`buffer`]: the per-virtual-control Input Buffer (C5)
//! - [`processor`]: the processor library and registry (C6)
//! - [`actuator`]: the per-virtual-control Actuator (C7)
//! - [`engine`]: the handshake and orchestration of all of the above (C8)
//! - [`protocol`]: the handshake's `bincode` payload shapes
//! - [`queue`]: the bounded overwrite queue the Input Buffer uses

pub mod actuator;
pub mod buffer;
pub mod engine;
pub mod error;
pub mod mux;
pub mod processor;
pub mod protocol;
pub mod queue;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use processor::{Processor, ProcessorRegistry};
