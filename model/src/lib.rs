//! Object model: nodes, devices and controls (§3), with their
//! construction-time uniqueness invariants and fixed per-container
//! capacities (§4.2). Everything here is a plain Rust value owned by
//! `Arc`s; the registries (`NodeRegistry`, `DeviceRegistry`) are the only
//! place mutation happens, and only during design-parse and handshake —
//! once the core orchestrator starts its worker threads, the whole graph
//! is read-only.

pub mod control;
pub mod device;
pub mod error;
pub mod node;

pub use control::{Axis, Button, Control, ControlRole, Hat};
pub use device::{Device, DeviceKind, DeviceLookup, DeviceRegistry};
pub use error::{ModelError, Result};
pub use node::{Node, NodeRegistry, MAX_DEVICES_PER_NODE, MAX_NODES_PER_KIND};

pub use ::njoy_wire::{ControlKind, HatDirection, Identity, NodeKind};
