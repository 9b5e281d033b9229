//! Serialisable payloads carried as argument frames of the handshake's
//! request/reply `Command`s (§4.1 "Request/reply messages", §4.8,
//! §6). `njoy-wire` knows these frames only as opaque bytes; this module
//! is where `njoy-core` gives them a shape and a `bincode` encoding.

use ::serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One device announced by an input node in a `register` request: its
/// stable OS-level guid (if any) and human name (if any), matched
/// against the design's `PhysicalDeviceDescriptor`s by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncedDevice {
    pub guid: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub available_devices: Vec<AnnouncedDevice>,
}

/// One physical device bound to the new input node, keyed by the
/// `device_id` the core assigned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundDevice {
    pub device_id: u8,
    pub alias: String,
    pub guid: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredReply {
    pub node_id: u8,
    pub devices: Vec<BoundDevice>,
}

/// One output device's announced capacity, in the order the output node
/// wants its virtual devices created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub max_nb_axes: u8,
    pub max_nb_buttons: u8,
    pub max_nb_hats: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesRequest {
    pub devices: Vec<DeviceCapabilities>,
}

/// The virtual controls assigned to one virtual device, by id within
/// their kind's table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualDeviceAssignment {
    pub device_id: u8,
    pub axes: Vec<u8>,
    pub buttons: Vec<u8>,
    pub hats: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentsReply {
    pub node_id: u8,
    pub devices: Vec<VirtualDeviceAssignment>,
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(::bincode::serialize(value).map_err(::njoy_wire::WireError::from)?)
}

pub fn decode<T: for<'de> Deserialize<'de>>(command: &str, frames: &[Vec<u8>]) -> Result<T> {
    let frame = frames
        .first()
        .ok_or_else(|| EngineError::MissingPayload(command.to_string()))?;
    Ok(::bincode::deserialize(frame).map_err(::njoy_wire::WireError::from)?)
}
