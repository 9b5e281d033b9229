//! The design document's data model (§3) plus small text readers for the
//! `nJoyDesign` and `nJoyDeviceMap` grammars sketched in §6.
//!
//! `njoy_core::Engine` only ever consumes a [`Design`] value; the text
//! format is a convenience layered on top, mirroring the original's
//! `parse_design()` stub that a real deployment was expected to replace.

mod device_map;
mod error;
mod model;
mod parser;

pub use crate::device_map::{parse_device_map, DeviceMap, DeviceMapEntry, DeviceMapRegistry};
pub use crate::error::{DesignError, Result};
pub use crate::model::{Design, InputRef, PhysicalDeviceDescriptor, VirtualControlSpec};
pub use crate::parser::parse_design;
