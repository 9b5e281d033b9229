use ::serde::{Deserialize, Serialize};

use crate::error::{Result, WireError};

pub const MAX_NODE_ID: u8 = 15;
pub const MAX_DEVICE_ID: u8 = 15;
pub const MAX_AXIS_ID: u8 = 7;
pub const MAX_BUTTON_ID: u8 = 127;
pub const MAX_HAT_ID: u8 = 3;

/// Which endpoint kind a node is: input nodes source control events,
/// output nodes sink them. Independently capped at 16 each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Input,
    Output,
}

/// The three control kinds, each with its own per-device capacity and its
/// own reserved bit pattern in the identity frame's low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    Axis,
    Button,
    Hat,
}

impl ControlKind {
    pub fn max_control_id(self) -> u8 {
        match self {
            ControlKind::Axis => MAX_AXIS_ID,
            ControlKind::Button => MAX_BUTTON_ID,
            ControlKind::Hat => MAX_HAT_ID,
        }
    }

    pub fn capacity(self) -> usize {
        self.max_control_id() as usize + 1
    }
}

/// The 2-byte identity uniquely naming an assigned control on the wire.
///
/// Layout (big-endian `u16`):
/// ```text
/// bits 15..12  node.id       (4 bits)
/// bits 11..8   device.id     (4 bits)
/// bits 7..0    kind + control.id
///   axis:   1 0 0 0 0 c c c    (3-bit control id, range 0..7)
///   button: 0 b b b b b b b    (7-bit control id, range 0..127)
///   hat:    1 1 0 0 0 0 c c    (2-bit control id, range 0..3)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub node_id: u8,
    pub device_id: u8,
    pub kind: ControlKind,
    pub control_id: u8,
}

impl Identity {
    pub fn new(node_id: u8, device_id: u8, kind: ControlKind, control_id: u8) -> Result<Self> {
        if node_id > MAX_NODE_ID {
            return Err(WireError::BadIdentity(format!(
                "node id {} exceeds {}",
                node_id, MAX_NODE_ID
            )));
        }
        if device_id > MAX_DEVICE_ID {
            return Err(WireError::BadIdentity(format!(
                "device id {} exceeds {}",
                device_id, MAX_DEVICE_ID
            )));
        }
        if control_id > kind.max_control_id() {
            return Err(WireError::BadIdentity(format!(
                "{:?} control id {} exceeds {}",
                kind,
                control_id,
                kind.max_control_id()
            )));
        }
        Ok(Self {
            node_id,
            device_id,
            kind,
            control_id,
        })
    }

    pub fn encode(&self) -> [u8; 2] {
        let mut word: u16 = (self.node_id as u16 & 0x0F) << 12 | (self.device_id as u16 & 0x0F) << 8;
        word |= match self.kind {
            ControlKind::Axis => 0x80 | (self.control_id as u16 & 0x07),
            ControlKind::Button => self.control_id as u16 & 0x7F,
            ControlKind::Hat => 0xC0 | (self.control_id as u16 & 0x03),
        };
        word.to_be_bytes()
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != 2 {
            return Err(WireError::BadIdentity(format!(
                "identity frame must be 2 bytes, got {}",
                buf.len()
            )));
        }
        let word = u16::from_be_bytes([buf[0], buf[1]]);
        let node_id = ((word & 0xF000) >> 12) as u8;
        let device_id = ((word & 0x0F00) >> 8) as u8;
        let low = (word & 0x00FF) as u8;
        let (kind, control_id) = if low & 0xC0 == 0x80 {
            (ControlKind::Axis, low & 0x07)
        } else if low & 0xC0 == 0xC0 {
            (ControlKind::Hat, low & 0x03)
        } else {
            (ControlKind::Button, low & 0x7F)
        };
        Ok(Self {
            node_id,
            device_id,
            kind,
            control_id,
        })
    }
}
