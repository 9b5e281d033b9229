use ::std::collections::HashMap;
use ::std::sync::{Arc, Mutex, OnceLock};

use ::njoy_wire::{ControlKind, NodeKind};

use crate::control::{Control, ControlRole};
use crate::error::{ModelError, Result};
use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Physical,
    Virtual,
}

/// Where a device sits once assigned: which node, of which kind, at
/// which `device_id`. Set exactly once (`OnceLock`), read freely
/// afterwards from any thread.
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub node_kind: NodeKind,
    pub node_id: u8,
    pub device_id: u8,
}

/// A logical joystick: three fixed-capacity control tables (axes,
/// buttons, hats) plus, for physical devices, the design-time
/// identifiers used to match it against a real HID device during the
/// handshake.
pub struct Device {
    pub kind: DeviceKind,
    pub alias: Option<String>,
    guid: Mutex<Option<String>>,
    name: Mutex<Option<String>>,
    binding: OnceLock<Binding>,
    axes: Mutex<Vec<Option<Arc<Control>>>>,
    buttons: Mutex<Vec<Option<Arc<Control>>>>,
    hats: Mutex<Vec<Option<Arc<Control>>>>,
}

impl Device {
    fn new(kind: DeviceKind, alias: Option<String>, guid: Option<String>, name: Option<String>) -> Arc<Self> {
        Arc::new(Device {
            kind,
            alias,
            guid: Mutex::new(guid),
            name: Mutex::new(name),
            binding: OnceLock::new(),
            axes: Mutex::new(vec![None; ControlKind::Axis.capacity()]),
            buttons: Mutex::new(vec![None; ControlKind::Button.capacity()]),
            hats: Mutex::new(vec![None; ControlKind::Hat.capacity()]),
        })
    }

    pub fn guid(&self) -> Option<String> {
        self.guid.lock().unwrap().clone()
    }

    pub fn name(&self) -> Option<String> {
        self.name.lock().unwrap().clone()
    }

    pub fn binding(&self) -> Option<Binding> {
        self.binding.get().copied()
    }

    pub fn is_assigned(&self) -> bool {
        self.binding.get().is_some()
    }

    pub(crate) fn bind(&self, node_kind: NodeKind, node_id: u8, device_id: u8) -> Result<()> {
        self.binding
            .set(Binding {
                node_kind,
                node_id,
                device_id,
            })
            .map_err(|_| ModelError::InvalidParams("device already bound to a node".into()))
    }

    fn table(&self, kind: ControlKind) -> &Mutex<Vec<Option<Arc<Control>>>> {
        match kind {
            ControlKind::Axis => &self.axes,
            ControlKind::Button => &self.buttons,
            ControlKind::Hat => &self.hats,
        }
    }

    /// Registers a control into this device's table for `kind`. If `id`
    /// is `None`, the next free slot is used. A collision on an occupied
    /// slot is only tolerated when the existing occupant is a physical
    /// control (idempotent re-registration by id); anything else is
    /// `DeviceRegisterControl`.
    pub fn register_control(
        device: &Arc<Device>,
        kind: ControlKind,
        id: Option<u8>,
        role: ControlRole,
    ) -> Result<Arc<Control>> {
        let mut table = device.table(kind).lock().unwrap();
        let slot = match id {
            Some(id) => {
                if id > kind.max_control_id() {
                    return Err(ModelError::ControlOverflow {
                        kind,
                        capacity: kind.capacity(),
                    });
                }
                id as usize
            }
            None => table
                .iter()
                .position(|c| c.is_none())
                .ok_or(ModelError::ControlOverflow {
                    kind,
                    capacity: kind.capacity(),
                })?,
        };

        if let Some(existing) = &table[slot] {
            return if matches!(existing.role(), ControlRole::Physical) {
                Ok(existing.clone())
            } else {
                Err(ModelError::DeviceRegisterControl)
            };
        }

        let control = Control::new(Arc::downgrade(device), kind, slot as u8, role);
        table[slot] = Some(control.clone());
        Ok(control)
    }

    pub fn control(&self, kind: ControlKind, id: u8) -> Option<Arc<Control>> {
        self.table(kind).lock().unwrap().get(id as usize).and_then(|c| c.clone())
    }

    pub fn controls(&self, kind: ControlKind) -> Vec<Arc<Control>> {
        self.table(kind).lock().unwrap().iter().flatten().cloned().collect()
    }
}

/// Process-wide indexes over physical devices: by alias, by guid, by
/// name (a device name may be shared, disambiguated by guid).
#[derive(Default)]
pub struct DeviceRegistry {
    by_alias: HashMap<String, Arc<Device>>,
    by_guid: HashMap<String, Arc<Device>>,
    by_name: HashMap<String, Vec<Arc<Device>>>,
}

pub enum DeviceLookup<'a> {
    Alias(&'a str),
    Guid(&'a str),
    Name { name: &'a str, guid: Option<&'a str> },
    Location { node: &'a Arc<Node>, device_id: u8 },
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs an unassigned physical device. Requires `alias` and at
    /// least one of `guid`/`name`.
    pub fn new_physical_device(
        &mut self,
        alias: impl Into<String>,
        guid: Option<String>,
        name: Option<String>,
    ) -> Result<Arc<Device>> {
        let alias = alias.into();
        if guid.is_none() && name.is_none() {
            return Err(ModelError::InvalidParams(
                "a physical device needs at least one of guid or name".into(),
            ));
        }
        if self.by_alias.contains_key(&alias) {
            return Err(ModelError::DuplicateAlias(alias));
        }
        if let Some(g) = &guid {
            if self.by_guid.contains_key(g) {
                return Err(ModelError::DuplicateGuid(g.clone()));
            }
        }
        if let Some(n) = &name {
            self.check_name_ambiguity(n, guid.as_deref())?;
        }

        let device = Device::new(DeviceKind::Physical, Some(alias.clone()), guid.clone(), name.clone());
        self.by_alias.insert(alias, device.clone());
        if let Some(g) = guid {
            self.by_guid.insert(g, device.clone());
        }
        if let Some(n) = name {
            self.by_name.entry(n).or_default().push(device.clone());
        }
        Ok(device)
    }

    /// Registers a virtual device on `node`, assigning it a `device_id`
    /// immediately (virtual devices are always assigned). Fails
    /// `InvalidNode` unless `node` is an `OutputNode`.
    pub fn new_virtual_device(&mut self, node: &Arc<Node>) -> Result<Arc<Device>> {
        if node.kind != ::njoy_wire::NodeKind::Output {
            return Err(ModelError::InvalidNode);
        }
        let device = Device::new(DeviceKind::Virtual, None, None, None);
        Node::append(node, &device)?;
        Ok(device)
    }

    fn check_name_ambiguity(&self, name: &str, guid: Option<&str>) -> Result<()> {
        if self.by_name.contains_key(name) && guid.is_none() {
            return Err(ModelError::AmbiguousName(name.to_string()));
        }
        Ok(())
    }

    /// Records a guid observed after construction (e.g. during design
    /// parsing, the alias is seen before the guid). Cannot overwrite an
    /// already-set guid.
    pub fn set_guid(&mut self, device: &Arc<Device>, guid: impl Into<String>) -> Result<()> {
        let guid = guid.into();
        if self.by_guid.contains_key(&guid) {
            return Err(ModelError::DuplicateGuid(guid));
        }
        {
            let mut slot = device.guid.lock().unwrap();
            if slot.is_some() {
                return Err(ModelError::DuplicateGuid(guid));
            }
            *slot = Some(guid.clone());
        }
        self.by_guid.insert(guid, device.clone());
        Ok(())
    }

    /// Records a name observed after construction. Cannot overwrite an
    /// already-set name; subject to the same ambiguity check as
    /// construction-time names.
    pub fn set_name(&mut self, device: &Arc<Device>, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        {
            let existing = device.name.lock().unwrap();
            if existing.is_some() {
                return Err(ModelError::InvalidParams("name already set".into()));
            }
        }
        self.check_name_ambiguity(&name, device.guid().as_deref())?;
        *device.name.lock().unwrap() = Some(name.clone());
        self.by_name.entry(name).or_default().push(device.clone());
        Ok(())
    }

    pub fn find_by_alias(&self, alias: &str) -> Result<Arc<Device>> {
        if alias.is_empty() {
            return Err(ModelError::InvalidLookup("alias must not be empty".into()));
        }
        self.by_alias
            .get(alias)
            .cloned()
            .ok_or_else(|| ModelError::DeviceNotFound(format!("alias={}", alias)))
    }

    pub fn find_by_guid(&self, guid: &str) -> Result<Arc<Device>> {
        if guid.is_empty() {
            return Err(ModelError::InvalidLookup("guid must not be empty".into()));
        }
        self.by_guid
            .get(guid)
            .cloned()
            .ok_or_else(|| ModelError::DeviceNotFound(format!("guid={}", guid)))
    }

    pub fn find_by_name(&self, name: &str, guid: Option<&str>) -> Result<Arc<Device>> {
        if name.is_empty() {
            return Err(ModelError::InvalidLookup("name must not be empty".into()));
        }
        let candidates = self.by_name.get(name).cloned().unwrap_or_default();
        match candidates.len() {
            0 => Err(ModelError::DeviceNotFound(format!("name={}", name))),
            1 => Ok(candidates[0].clone()),
            _ => {
                let guid = guid.ok_or_else(|| ModelError::AmbiguousName(name.to_string()))?;
                candidates
                    .into_iter()
                    .find(|d| d.guid().as_deref() == Some(guid))
                    .ok_or_else(|| ModelError::DeviceNotFound(format!("name={} guid={}", name, guid)))
            }
        }
    }

    pub fn find_by_location(&self, node: &Arc<Node>, device_id: u8) -> Result<Arc<Device>> {
        node.device(device_id)
            .ok_or_else(|| ModelError::DeviceNotFound(format!("node={} device={}", node.id, device_id)))
    }

    pub fn find(&self, lookup: DeviceLookup) -> Result<Arc<Device>> {
        match lookup {
            DeviceLookup::Alias(alias) => self.find_by_alias(alias),
            DeviceLookup::Guid(guid) => self.find_by_guid(guid),
            DeviceLookup::Name { name, guid } => self.find_by_name(name, guid),
            DeviceLookup::Location { node, device_id } => self.find_by_location(node, device_id),
        }
    }
}
