use ::std::sync::{Arc, Mutex};

use ::njoy_wire::NodeKind;

use crate::device::Device;
use crate::error::{ModelError, Result};

pub const MAX_NODES_PER_KIND: usize = 16;
pub const MAX_DEVICES_PER_NODE: usize = 16;

/// A runtime endpoint hosting up to 16 devices, indexed by a 4-bit
/// `device_id`. Input nodes source control events, output nodes sink
/// them; each kind is independently capped at 16 nodes process-wide.
pub struct Node {
    pub kind: NodeKind,
    pub id: u8,
    devices: Mutex<Vec<Option<Arc<Device>>>>,
}

impl Node {
    fn new(kind: NodeKind, id: u8) -> Arc<Self> {
        Arc::new(Node {
            kind,
            id,
            devices: Mutex::new(vec![None; MAX_DEVICES_PER_NODE]),
        })
    }

    /// Attaches `device` to `node`, assigning its `device_id` to the
    /// next free slot. Fails with `NodeDeviceOverflow` past the 16th
    /// device. The device's node binding, once set, is immutable for the
    /// process lifetime.
    pub fn append(node: &Arc<Node>, device: &Arc<Device>) -> Result<u8> {
        let mut devices = node.devices.lock().unwrap();
        let slot = devices
            .iter()
            .position(|d| d.is_none())
            .ok_or(ModelError::NodeDeviceOverflow { node_id: node.id })?;
        device.bind(node.kind, node.id, slot as u8)?;
        devices[slot] = Some(device.clone());
        ::log::debug!(
            "device {:?} bound to {:?} node {} as device {}",
            device.alias,
            node.kind,
            node.id,
            slot
        );
        Ok(slot as u8)
    }

    pub fn device(&self, device_id: u8) -> Option<Arc<Device>> {
        self.devices
            .lock()
            .unwrap()
            .get(device_id as usize)
            .and_then(|d| d.clone())
    }

    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.lock().unwrap().iter().flatten().cloned().collect()
    }
}

/// Process-wide node allocator: at most 16 input nodes and 16 output
/// nodes, ids assigned in registration order and never reused.
#[derive(Default)]
pub struct NodeRegistry {
    input_nodes: Vec<Arc<Node>>,
    output_nodes: Vec<Arc<Node>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_input_node(&mut self) -> Result<Arc<Node>> {
        if self.input_nodes.len() >= MAX_NODES_PER_KIND {
            return Err(ModelError::NodeOverflow(NodeKind::Input));
        }
        let node = Node::new(NodeKind::Input, self.input_nodes.len() as u8);
        ::log::debug!("allocated input node {}", node.id);
        self.input_nodes.push(node.clone());
        Ok(node)
    }

    pub fn new_output_node(&mut self) -> Result<Arc<Node>> {
        if self.output_nodes.len() >= MAX_NODES_PER_KIND {
            return Err(ModelError::NodeOverflow(NodeKind::Output));
        }
        let node = Node::new(NodeKind::Output, self.output_nodes.len() as u8);
        ::log::debug!("allocated output node {}", node.id);
        self.output_nodes.push(node.clone());
        Ok(node)
    }

    pub fn lookup(&self, kind: NodeKind, id: u8) -> Result<Arc<Node>> {
        let table = match kind {
            NodeKind::Input => &self.input_nodes,
            NodeKind::Output => &self.output_nodes,
        };
        table
            .get(id as usize)
            .cloned()
            .ok_or(ModelError::NodeNotFound(kind, id))
    }

    pub fn input_nodes(&self) -> &[Arc<Node>] {
        &self.input_nodes
    }

    pub fn output_nodes(&self) -> &[Arc<Node>] {
        &self.output_nodes
    }
}
