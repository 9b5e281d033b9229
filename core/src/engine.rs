//! The Core Orchestrator (C8, §4.8): parses the design into the object
//! model, runs the bounded handshake with input/output nodes, then
//! instantiates one {Input Buffer, Actuator} pair per virtual control
//! and runs the whole graph until cancelled.

use ::std::collections::{HashMap, HashSet, VecDeque};
use ::std::sync::{Arc, Mutex};

use ::njoy_design::{Design, InputRef};
use ::njoy_model::{Axis, Button, Control, ControlRole, DeviceLookup, DeviceRegistry, Hat, Node, NodeRegistry};
use ::njoy_wire::message::{CommandName, CommandNameOrOpaque};
use ::njoy_wire::{Command, ControlKind};

use crate::actuator::Actuator;
use crate::buffer::InputBuffer;
use crate::error::{EngineError, Result};
use crate::mux::{InputMultiplexer, OutputMultiplexer};
use crate::processor::{Processor, ProcessorRegistry};
use crate::protocol::{self, AnnouncedDevice, AssignmentsReply, BoundDevice, CapabilitiesRequest, RegisterRequest, RegisteredReply, VirtualDeviceAssignment};

const INTERNAL_MUX_IN: &str = "inproc://njoy-core/mux-in";
const INTERNAL_MUX_OUT: &str = "inproc://njoy-core/mux-out";

/// One input of a [`PendingVirtualControl`]: either an already-resolved
/// physical control, or the label of another virtual control that must be
/// assigned (and therefore materialised) before this one can be.
enum PendingInput {
    Physical(Arc<Control>),
    Virtual(String),
}

/// A virtual control the design has declared but that has not yet been
/// assigned to a `VirtualDevice` (and therefore has no model `Control`
/// object yet — see `DESIGN.md` for why materialisation is deferred to
/// assignment time rather than design-parse time).
struct PendingVirtualControl {
    processor: Arc<dyn Processor>,
    processor_name: String,
    name: Option<String>,
    inputs: Vec<PendingInput>,
}

/// A virtual control that has been assigned a model `Control` (and
/// therefore, once its output node registers, a wire identity): ready to
/// get its own Input Buffer and Actuator once the handshake completes.
struct AssignedVirtualControl {
    control: Arc<Control>,
    processor: Arc<dyn Processor>,
}

pub struct Engine {
    ctx: ::zmq::Context,
    requests_endpoint: String,
    input_events_endpoint: String,
    output_events_endpoint: String,
    thread_name_prefix: String,
    node_registry: Mutex<NodeRegistry>,
    device_registry: Mutex<DeviceRegistry>,
    devices_remaining: Mutex<HashSet<String>>,
    axes_pending: Mutex<VecDeque<PendingVirtualControl>>,
    buttons_pending: Mutex<VecDeque<PendingVirtualControl>>,
    hats_pending: Mutex<VecDeque<PendingVirtualControl>>,
    assigned: Mutex<Vec<AssignedVirtualControl>>,
    /// Virtual controls materialised so far, keyed by their design-time
    /// label, so a later virtual control's `virt=<label>` input can be
    /// resolved to a concrete `Arc<Control>` once its dependency has been
    /// assigned to a device.
    resolved_virtual: Mutex<HashMap<String, Arc<Control>>>,
}

impl Engine {
    /// Builds the object model from `design`: unassigned physical
    /// devices and their physical controls, plus the set of declared
    /// virtual controls (not yet attached to any device). Fails if the
    /// design references an unregistered processor or the physical
    /// control tables overflow their per-kind capacity.
    pub fn new(
        config: &::njoy_config::EngineConfig,
        design: Design,
        processors: ProcessorRegistry,
    ) -> Result<Self> {
        let ctx = ::zmq::Context::new();
        let node_registry = NodeRegistry::new();
        let mut device_registry = DeviceRegistry::new();

        let mut devices_remaining = HashSet::new();
        for descriptor in &design.devices {
            device_registry.new_physical_device(
                descriptor.alias.clone(),
                descriptor.guid.clone(),
                descriptor.name.clone(),
            )?;
            devices_remaining.insert(descriptor.alias.clone());
        }

        let mut axes_pending = VecDeque::new();
        let mut buttons_pending = VecDeque::new();
        let mut hats_pending = VecDeque::new();

        for spec in &design.controls {
            let processor = processors.get(&spec.processor)?;
            let mut inputs = Vec::with_capacity(spec.inputs.len());
            for input_ref in &spec.inputs {
                let input = match input_ref {
                    InputRef::Physical { alias, kind, id } => {
                        let device = device_registry.find(DeviceLookup::Alias(alias))?;
                        let control = match kind {
                            ControlKind::Axis => Axis::new(&device, Some(*id), ControlRole::Physical)?,
                            ControlKind::Button => Button::new(&device, Some(*id), ControlRole::Physical)?,
                            ControlKind::Hat => Hat::new(&device, Some(*id), ControlRole::Physical)?,
                        };
                        PendingInput::Physical(control)
                    }
                    InputRef::Virtual { name } => PendingInput::Virtual(name.clone()),
                };
                inputs.push(input);
            }
            let pending = PendingVirtualControl {
                processor,
                processor_name: spec.processor.clone(),
                name: spec.name.clone(),
                inputs,
            };
            match spec.kind {
                ControlKind::Axis => axes_pending.push_back(pending),
                ControlKind::Button => buttons_pending.push_back(pending),
                ControlKind::Hat => hats_pending.push_back(pending),
            }
        }
        Ok(Engine {
            ctx,
            requests_endpoint: config.requests.clone(),
            input_events_endpoint: config.input_events.clone(),
            output_events_endpoint: config.output_events.clone(),
            thread_name_prefix: config.thread_name_prefix.clone(),
            node_registry: Mutex::new(node_registry),
            device_registry: Mutex::new(device_registry),
            devices_remaining: Mutex::new(devices_remaining),
            axes_pending: Mutex::new(axes_pending),
            buttons_pending: Mutex::new(buttons_pending),
            hats_pending: Mutex::new(hats_pending),
            assigned: Mutex::new(Vec::new()),
            resolved_virtual: Mutex::new(HashMap::new()),
        })
    }

    fn handshake_done(&self) -> bool {
        self.devices_remaining.lock().unwrap().is_empty()
            && self.axes_pending.lock().unwrap().is_empty()
            && self.buttons_pending.lock().unwrap().is_empty()
            && self.hats_pending.lock().unwrap().is_empty()
    }

    /// `register`: allocates an `InputNode`, matches each announced
    /// device against the design by guid first then name, attaches
    /// matches. Unmatched announcements are silently dropped (§4.8).
    fn handle_register(&self, req: RegisterRequest) -> Result<RegisteredReply> {
        let node = self.node_registry.lock().unwrap().new_input_node()?;
        let mut device_registry = self.device_registry.lock().unwrap();
        let mut devices_remaining = self.devices_remaining.lock().unwrap();
        let mut bound = Vec::new();
        for announced in req.available_devices {
            let found = announced
                .guid
                .as_deref()
                .and_then(|g| device_registry.find_by_guid(g).ok())
                .or_else(|| {
                    announced
                        .name
                        .as_deref()
                        .and_then(|n| device_registry.find_by_name(n, announced.guid.as_deref()).ok())
                });
            let Some(device) = found else {
                ::log::debug!("node {} announced an unmatched device {:?}", node.id, announced.name);
                continue;
            };
            if device.is_assigned() {
                continue;
            }
            Node::append(&node, &device)?;
            if let Some(alias) = &device.alias {
                devices_remaining.remove(alias);
            }
            bound.push(BoundDevice {
                device_id: device.binding().unwrap().device_id,
                alias: device.alias.clone().unwrap_or_default(),
                guid: device.guid(),
                name: device.name(),
            });
        }
        Ok(RegisteredReply { node_id: node.id, devices: bound })
    }

    /// `capabilities`: allocates an `OutputNode`, greedily attaches as
    /// many unassigned virtual controls as each announced device can
    /// hold, in declaration order, by kind (§4.8).
    fn handle_capabilities(&self, req: CapabilitiesRequest) -> Result<AssignmentsReply> {
        let node = self.node_registry.lock().unwrap().new_output_node()?;
        let mut device_registry = self.device_registry.lock().unwrap();
        let mut axes_pending = self.axes_pending.lock().unwrap();
        let mut buttons_pending = self.buttons_pending.lock().unwrap();
        let mut hats_pending = self.hats_pending.lock().unwrap();
        let mut assigned = self.assigned.lock().unwrap();
        let mut resolved_virtual = self.resolved_virtual.lock().unwrap();

        let mut devices = Vec::new();
        for capability in req.devices {
            let device = device_registry.new_virtual_device(&node)?;
            let device_id = device.binding().expect("virtual device is assigned at construction").device_id;

            // Axes, then buttons, then hats: a control declared in one
            // kind can depend on a `virt=` label assigned earlier in this
            // very call, as long as it was declared in a kind processed
            // first (§3's DAG, resolved incrementally rather than all at
            // once — see `DESIGN.md`).
            let axes = Self::assign_kind(&device, &mut axes_pending, capability.max_nb_axes, &mut assigned, &mut resolved_virtual, |d, id, role| {
                Axis::new(d, id, role)
            })?;
            let buttons = Self::assign_kind(&device, &mut buttons_pending, capability.max_nb_buttons, &mut assigned, &mut resolved_virtual, |d, id, role| {
                Button::new(d, id, role)
            })?;
            let hats = Self::assign_kind(&device, &mut hats_pending, capability.max_nb_hats, &mut assigned, &mut resolved_virtual, |d, id, role| {
                Hat::new(d, id, role)
            })?;

            ::log::debug!(
                "output node {} device {}: assigned {} axes, {} buttons, {} hats",
                node.id,
                device_id,
                axes.len(),
                buttons.len(),
                hats.len()
            );
            devices.push(VirtualDeviceAssignment { device_id, axes, buttons, hats });
        }
        Ok(AssignmentsReply { node_id: node.id, devices })
    }

    /// Pops up to `max` controls off the front of `pending` and
    /// materialises each as a model `Control`. A control whose `virt=`
    /// input isn't resolved yet (its dependency hasn't been assigned to a
    /// device) is skipped rather than blocking the rest of the queue, and
    /// requeued at the front for the next `capabilities` call to retry.
    fn assign_kind(
        device: &Arc<::njoy_model::Device>,
        pending: &mut VecDeque<PendingVirtualControl>,
        max: u8,
        assigned: &mut Vec<AssignedVirtualControl>,
        resolved_virtual: &mut HashMap<String, Arc<Control>>,
        ctor: impl Fn(&Arc<::njoy_model::Device>, Option<u8>, ControlRole) -> ::njoy_model::Result<Arc<Control>>,
    ) -> Result<Vec<u8>> {
        let mut ids = Vec::new();
        let mut deferred = VecDeque::new();
        while (ids.len() as u8) < max {
            let Some(p) = pending.pop_front() else { break };

            let mut concrete = Vec::with_capacity(p.inputs.len());
            let mut unresolved = false;
            for input in &p.inputs {
                match input {
                    PendingInput::Physical(control) => concrete.push(control.clone()),
                    PendingInput::Virtual(name) => match resolved_virtual.get(name) {
                        Some(control) => concrete.push(control.clone()),
                        None => {
                            unresolved = true;
                            break;
                        }
                    },
                }
            }
            if unresolved {
                deferred.push_back(p);
                continue;
            }

            let role = ControlRole::Virtual {
                processor: p.processor_name,
                inputs: concrete,
            };
            let control = ctor(device, None, role)?;
            ids.push(control.id);
            if let Some(name) = &p.name {
                resolved_virtual.insert(name.clone(), control.clone());
            }
            assigned.push(AssignedVirtualControl { control, processor: p.processor });
        }
        while let Some(p) = deferred.pop_back() {
            pending.push_front(p);
        }
        Ok(ids)
    }

    /// Runs the bounded handshake loop (§4.8 step 3) to completion, then
    /// spawns one {Input Buffer, Actuator} pair per assigned virtual
    /// control and the two multiplexers, joining everything. Blocks
    /// until a thread errors or the process is torn down.
    pub fn run(self: Arc<Self>) -> Result<()> {
        let input_mux = InputMultiplexer::bind(&self.ctx, &self.input_events_endpoint, INTERNAL_MUX_IN)?;
        let output_mux = OutputMultiplexer::bind(&self.ctx, &self.output_events_endpoint, INTERNAL_MUX_OUT)?;

        let requests = self.ctx.socket(::zmq::REP)?;
        requests.bind(&self.requests_endpoint)?;

        ::log::info!("handshake: waiting for input and output nodes");
        while !self.handshake_done() {
            let command = Command::recv(&requests, 0)?;
            let reply = match &command.name {
                CommandNameOrOpaque::Known(CommandName::Register) => {
                    let req: RegisterRequest = protocol::decode("register", &command.args)?;
                    let reply = self.handle_register(req)?;
                    Command::registered(vec![protocol::encode(&reply)?])
                }
                CommandNameOrOpaque::Known(CommandName::Capabilities) => {
                    let req: CapabilitiesRequest = protocol::decode("capabilities", &command.args)?;
                    let reply = self.handle_capabilities(req)?;
                    Command::assignments(vec![protocol::encode(&reply)?])
                }
                _ => return Err(EngineError::UnexpectedCommand(command.name_str().to_string())),
            };
            reply.send(&requests, 0)?;
        }
        ::log::info!("handshake complete, starting data plane");

        let mut handles = Vec::new();

        handles.push(::std::thread::Builder::new()
            .name(format!("{}-input-mux", self.thread_name_prefix))
            .spawn(move || input_mux.run())
            .expect("failed to spawn input multiplexer thread"));

        handles.push(::std::thread::Builder::new()
            .name(format!("{}-output-mux", self.thread_name_prefix))
            .spawn(move || output_mux.run())
            .expect("failed to spawn output multiplexer thread"));

        let assigned = self.assigned.lock().unwrap();
        for entry in assigned.iter() {
            let identity = entry
                .control
                .identity()
                .expect("virtual control is assigned to a node by the time the handshake completes");
            // An input here is either a physical control (bound during
            // `register`) or another virtual control (bound during an
            // earlier `capabilities` call, per §3's DAG) — either way it
            // already has an identity by the time the handshake completes.
            let input_identities: Vec<::njoy_wire::Identity> = entry
                .control
                .inputs()
                .iter()
                .map(|input| {
                    input
                        .identity()
                        .expect("a virtual control's inputs are bound before the handshake completes")
                })
                .collect();

            let buffer = Arc::new(InputBuffer::connect(&self.ctx, INTERNAL_MUX_IN, input_identities)?);
            let actuator = Actuator::connect(
                &self.ctx,
                INTERNAL_MUX_OUT,
                &self.input_events_endpoint,
                identity,
                entry.processor.clone(),
                buffer.clone(),
            )?;

            let buffer_name = format!("{}-buffer-{:?}", self.thread_name_prefix, identity);
            handles.push(::std::thread::Builder::new()
                .name(buffer_name)
                .spawn(move || buffer.run())
                .expect("failed to spawn input buffer thread"));

            let actuator_name = format!("{}-actuator-{:?}", self.thread_name_prefix, identity);
            handles.push(::std::thread::Builder::new()
                .name(actuator_name)
                .spawn(move || actuator.run())
                .expect("failed to spawn actuator thread"));
        }
        drop(assigned);

        for handle in handles {
            handle.join().expect("a data-plane thread panicked")?;
        }
        Ok(())
    }
}
