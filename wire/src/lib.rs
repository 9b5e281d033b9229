//! Typed wire codec for nJoy control events and request/reply messages.
//!
//! This crate owns only the byte-level encoding described by the identity
//! frame, value frame and request/reply frame layouts; it knows nothing
//! about nodes, devices or the object model (that's `njoy-model`) and
//! nothing about sockets beyond the `zmq::Message` frames it produces and
//! consumes.

pub mod error;
pub mod hat;
pub mod identity;
pub mod message;
pub mod value;

pub use error::{Result, WireError};
pub use hat::HatDirection;
pub use identity::{ControlKind, Identity, NodeKind};
pub use message::{Command, ControlEvent};
pub use value::{normalize_axis, Value};
