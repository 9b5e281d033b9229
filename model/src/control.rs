use ::std::sync::{Arc, Weak};

use ::njoy_wire::{ControlKind, Identity};

use crate::device::Device;
use crate::error::Result;

/// A control's role: a physical control's value comes from incoming wire
/// events, a virtual control's value is produced by a named processor
/// over a list of input controls (forming the design's DAG).
#[derive(Clone)]
pub enum ControlRole {
    Physical,
    Virtual {
        processor: String,
        inputs: Vec<Arc<Control>>,
    },
}

/// An axis, button or hat on a device. Identity is fully determined by
/// `(device, kind, id)` plus whatever node the device is eventually bound
/// to; `identity()` is `None` until that binding happens.
pub struct Control {
    device: Weak<Device>,
    pub kind: ControlKind,
    pub id: u8,
    role: ControlRole,
}

impl Control {
    pub(crate) fn new(device: Weak<Device>, kind: ControlKind, id: u8, role: ControlRole) -> Arc<Self> {
        Arc::new(Control { device, kind, id, role })
    }

    pub fn device(&self) -> Option<Arc<Device>> {
        self.device.upgrade()
    }

    pub fn role(&self) -> &ControlRole {
        &self.role
    }

    pub fn is_physical(&self) -> bool {
        matches!(self.role, ControlRole::Physical)
    }

    pub fn inputs(&self) -> &[Arc<Control>] {
        match &self.role {
            ControlRole::Virtual { inputs, .. } => inputs,
            ControlRole::Physical => &[],
        }
    }

    pub fn processor_name(&self) -> Option<&str> {
        match &self.role {
            ControlRole::Virtual { processor, .. } => Some(processor.as_str()),
            ControlRole::Physical => None,
        }
    }

    /// The wire identity of this control, once its device has been bound
    /// to a node. `None` before that (e.g. an unassigned physical
    /// device's control, pre-handshake).
    pub fn identity(&self) -> Option<Identity> {
        let device = self.device.upgrade()?;
        let binding = device.binding()?;
        Identity::new(binding.node_id, binding.device_id, self.kind, self.id).ok()
    }
}

/// Namespacing helpers exposing `Axis.new`/`Button.new`/`Hat.new`
/// constructor names; each just forwards to `Device::register_control`
/// with the kind baked in.
pub struct Axis;
impl Axis {
    pub fn new(device: &Arc<Device>, id: Option<u8>, role: ControlRole) -> Result<Arc<Control>> {
        Device::register_control(device, ControlKind::Axis, id, role)
    }
}

pub struct Button;
impl Button {
    pub fn new(device: &Arc<Device>, id: Option<u8>, role: ControlRole) -> Result<Arc<Control>> {
        Device::register_control(device, ControlKind::Button, id, role)
    }
}

pub struct Hat;
impl Hat {
    pub fn new(device: &Arc<Device>, id: Option<u8>, role: ControlRole) -> Result<Arc<Control>> {
        Device::register_control(device, ControlKind::Hat, id, role)
    }
}
