//! End-to-end scenarios driving a real `Engine` over real sockets: a
//! simulated input node pushes raw physical events, a simulated output
//! node drives the ready/value cadence, and a simulated REQ client
//! performs the handshake. Each test binds to its own set of ports so
//! the suite can run with the default parallel test harness.

use ::std::sync::Arc;
use ::std::thread;
use ::std::time::Duration;

use ::njoy_core::protocol::{
    self, AnnouncedDevice, AssignmentsReply, CapabilitiesRequest, DeviceCapabilities,
    RegisterRequest, RegisteredReply,
};
use ::njoy_core::{Engine, ProcessorRegistry};
use ::njoy_design::{Design, InputRef, PhysicalDeviceDescriptor, VirtualControlSpec};
use ::njoy_wire::{normalize_axis, Command, ControlEvent, ControlKind, HatDirection, Identity, Value};

const SETTLE: Duration = Duration::from_millis(150);
const SHORT: Duration = Duration::from_millis(20);

fn config(requests: &str, input_events: &str, output_events: &str) -> ::njoy_config::EngineConfig {
    ::njoy_config::EngineConfig {
        requests: requests.to_string(),
        input_events: input_events.to_string(),
        output_events: output_events.to_string(),
        thread_name_prefix: "njoy-test".to_string(),
    }
}

fn req_socket(ctx: &::zmq::Context, endpoint: &str) -> ::zmq::Socket {
    let socket = ctx.socket(::zmq::REQ).unwrap();
    socket.connect(endpoint).unwrap();
    socket
}

fn register(ctx: &::zmq::Context, endpoint: &str, devices: Vec<AnnouncedDevice>) -> RegisteredReply {
    let client = req_socket(ctx, endpoint);
    Command::register(vec![protocol::encode(&RegisterRequest { available_devices: devices }).unwrap()])
        .send(&client, 0)
        .unwrap();
    let reply = Command::recv(&client, 0).unwrap();
    protocol::decode("registered", &reply.args).unwrap()
}

fn capabilities(ctx: &::zmq::Context, endpoint: &str, devices: Vec<DeviceCapabilities>) -> AssignmentsReply {
    let client = req_socket(ctx, endpoint);
    Command::capabilities(vec![protocol::encode(&CapabilitiesRequest { devices }).unwrap()])
        .send(&client, 0)
        .unwrap();
    let reply = Command::recv(&client, 0).unwrap();
    protocol::decode("assignments", &reply.args).unwrap()
}

/// Scenario 1 (spec §8): single virtual axis, `passthrough` over one
/// physical axis. Four raw HID readings normalised to four exact doubles.
#[test]
fn single_axis_passthrough() {
    let requests = "tcp://127.0.0.1:18101";
    let input_events = "tcp://127.0.0.1:18102";
    let output_events = "tcp://127.0.0.1:18103";

    let design = Design::new(
        "single-axis",
        vec![PhysicalDeviceDescriptor::new("joy", Some("G1".into()), None)],
        vec![VirtualControlSpec {
            name: None,
            kind: ControlKind::Axis,
            processor: "passthrough".into(),
            inputs: vec![InputRef::Physical { alias: "joy".into(), kind: ControlKind::Axis, id: 0 }],
        }],
    )
    .unwrap();

    let engine = Arc::new(Engine::new(&config(requests, input_events, output_events), design, ProcessorRegistry::new()).unwrap());
    let run_handle = thread::spawn(move || engine.run());
    thread::sleep(SETTLE);

    let ctx = ::zmq::Context::new();
    let registered = register(&ctx, requests, vec![AnnouncedDevice { guid: Some("G1".into()), name: None }]);
    assert_eq!(registered.devices.len(), 1);
    assert_eq!(registered.devices[0].alias, "joy");

    let assigned = capabilities(&ctx, requests, vec![DeviceCapabilities { max_nb_axes: 1, max_nb_buttons: 0, max_nb_hats: 0 }]);
    assert_eq!(assigned.devices[0].axes, vec![0]);

    thread::sleep(SETTLE);

    let input_identity = Identity::new(0, 0, ControlKind::Axis, 0).unwrap();
    let output_identity = Identity::new(0, 0, ControlKind::Axis, 0).unwrap();

    let push = ctx.socket(::zmq::PUSH).unwrap();
    push.connect(input_events).unwrap();
    let node = ctx.socket(::zmq::DEALER).unwrap();
    node.set_identity(&output_identity.encode()).unwrap();
    node.connect(output_events).unwrap();
    thread::sleep(SHORT);

    for raw in [-32768i32, 0, 16383, 32767] {
        let expected = normalize_axis(raw as i16);
        ControlEvent::Addressed(input_identity, Value::Axis(expected)).send(&push, 0).unwrap();
        ControlEvent::ready(output_identity).send(&node, 0).unwrap();
        let got = ControlEvent::recv(&node, 0).unwrap();
        assert_eq!(got.value(), Value::Axis(expected));
    }

    // the engine's threads run forever; dropping the handle here is deliberate.
    drop(run_handle);
}

/// Scenario 2: button passthrough, duplicate values must not re-publish.
#[test]
fn button_passthrough_change_detection() {
    let requests = "tcp://127.0.0.1:18111";
    let input_events = "tcp://127.0.0.1:18112";
    let output_events = "tcp://127.0.0.1:18113";

    let design = Design::new(
        "button",
        vec![PhysicalDeviceDescriptor::new("thr", Some("G1".into()), None)],
        vec![VirtualControlSpec {
            name: None,
            kind: ControlKind::Button,
            processor: "passthrough".into(),
            inputs: vec![InputRef::Physical { alias: "thr".into(), kind: ControlKind::Button, id: 0 }],
        }],
    )
    .unwrap();

    let engine = Arc::new(Engine::new(&config(requests, input_events, output_events), design, ProcessorRegistry::new()).unwrap());
    let _run_handle = thread::spawn(move || engine.run());
    thread::sleep(SETTLE);

    let ctx = ::zmq::Context::new();
    register(&ctx, requests, vec![AnnouncedDevice { guid: Some("G1".into()), name: None }]);
    let assigned = capabilities(&ctx, requests, vec![DeviceCapabilities { max_nb_axes: 0, max_nb_buttons: 1, max_nb_hats: 0 }]);
    assert_eq!(assigned.devices[0].buttons, vec![0]);
    thread::sleep(SETTLE);

    let input_identity = Identity::new(0, 0, ControlKind::Button, 0).unwrap();
    let output_identity = Identity::new(0, 0, ControlKind::Button, 0).unwrap();

    let push = ctx.socket(::zmq::PUSH).unwrap();
    push.connect(input_events).unwrap();
    let node = ctx.socket(::zmq::DEALER).unwrap();
    node.set_identity(&output_identity.encode()).unwrap();
    node.connect(output_events).unwrap();
    thread::sleep(SHORT);

    let feed = [true, true, false, false, true];
    let expect_publish = [true, false, true, false, true];
    let expected_outputs = [true, false, true];
    let mut seen = Vec::new();

    for (value, publishes) in feed.iter().zip(expect_publish.iter()) {
        ControlEvent::Addressed(input_identity, Value::Button(*value)).send(&push, 0).unwrap();
        if *publishes {
            ControlEvent::ready(output_identity).send(&node, 0).unwrap();
            let got = ControlEvent::recv(&node, 0).unwrap();
            seen.push(got.value().as_button().unwrap());
        } else {
            thread::sleep(SHORT);
        }
    }

    assert_eq!(seen, expected_outputs);
}

/// Scenario 3: `not_any` over two physical buttons.
#[test]
fn not_any_pseudo_button() {
    let requests = "tcp://127.0.0.1:18121";
    let input_events = "tcp://127.0.0.1:18122";
    let output_events = "tcp://127.0.0.1:18123";

    let design = Design::new(
        "not-any",
        vec![
            PhysicalDeviceDescriptor::new("a", Some("GA".into()), None),
            PhysicalDeviceDescriptor::new("b", Some("GB".into()), None),
        ],
        vec![VirtualControlSpec {
            name: None,
            kind: ControlKind::Button,
            processor: "not_any".into(),
            inputs: vec![
                InputRef::Physical { alias: "a".into(), kind: ControlKind::Button, id: 0 },
                InputRef::Physical { alias: "b".into(), kind: ControlKind::Button, id: 0 },
            ],
        }],
    )
    .unwrap();

    let engine = Arc::new(Engine::new(&config(requests, input_events, output_events), design, ProcessorRegistry::new()).unwrap());
    let _run_handle = thread::spawn(move || engine.run());
    thread::sleep(SETTLE);

    let ctx = ::zmq::Context::new();
    register(
        &ctx,
        requests,
        vec![
            AnnouncedDevice { guid: Some("GA".into()), name: None },
            AnnouncedDevice { guid: Some("GB".into()), name: None },
        ],
    );
    let assigned = capabilities(&ctx, requests, vec![DeviceCapabilities { max_nb_axes: 0, max_nb_buttons: 1, max_nb_hats: 0 }]);
    assert_eq!(assigned.devices[0].buttons, vec![0]);
    thread::sleep(SETTLE);

    // button a is device_id 0 (registered first), button b is device_id 1.
    let id_a = Identity::new(0, 0, ControlKind::Button, 0).unwrap();
    let id_b = Identity::new(0, 1, ControlKind::Button, 0).unwrap();
    let output_identity = Identity::new(0, 0, ControlKind::Button, 0).unwrap();

    let push = ctx.socket(::zmq::PUSH).unwrap();
    push.connect(input_events).unwrap();
    let node = ctx.socket(::zmq::DEALER).unwrap();
    node.set_identity(&output_identity.encode()).unwrap();
    node.connect(output_events).unwrap();
    thread::sleep(SHORT);

    let pairs = [(false, false), (true, false), (false, false), (false, true), (false, false)];
    let expected = [true, false, true, false, true];

    for ((a, b), expect) in pairs.iter().zip(expected.iter()) {
        ControlEvent::Addressed(id_a, Value::Button(*a)).send(&push, 0).unwrap();
        ControlEvent::Addressed(id_b, Value::Button(*b)).send(&push, 0).unwrap();
        ControlEvent::ready(output_identity).send(&node, 0).unwrap();
        let got = ControlEvent::recv(&node, 0).unwrap();
        assert_eq!(got.value(), Value::Button(*expect));
    }
}

/// Scenario 4: a hat direction passed through unchanged.
#[test]
fn hat_direction_passthrough() {
    let requests = "tcp://127.0.0.1:18131";
    let input_events = "tcp://127.0.0.1:18132";
    let output_events = "tcp://127.0.0.1:18133";

    let design = Design::new(
        "hat",
        vec![PhysicalDeviceDescriptor::new("joy", Some("G1".into()), None)],
        vec![VirtualControlSpec {
            name: None,
            kind: ControlKind::Hat,
            processor: "passthrough".into(),
            inputs: vec![InputRef::Physical { alias: "joy".into(), kind: ControlKind::Hat, id: 0 }],
        }],
    )
    .unwrap();

    let engine = Arc::new(Engine::new(&config(requests, input_events, output_events), design, ProcessorRegistry::new()).unwrap());
    let _run_handle = thread::spawn(move || engine.run());
    thread::sleep(SETTLE);

    let ctx = ::zmq::Context::new();
    register(&ctx, requests, vec![AnnouncedDevice { guid: Some("G1".into()), name: None }]);
    let assigned = capabilities(&ctx, requests, vec![DeviceCapabilities { max_nb_axes: 0, max_nb_buttons: 0, max_nb_hats: 1 }]);
    assert_eq!(assigned.devices[0].hats, vec![0]);
    thread::sleep(SETTLE);

    let input_identity = Identity::new(0, 0, ControlKind::Hat, 0).unwrap();
    let output_identity = Identity::new(0, 0, ControlKind::Hat, 0).unwrap();

    let push = ctx.socket(::zmq::PUSH).unwrap();
    push.connect(input_events).unwrap();
    let node = ctx.socket(::zmq::DEALER).unwrap();
    node.set_identity(&output_identity.encode()).unwrap();
    node.connect(output_events).unwrap();
    thread::sleep(SHORT);

    ControlEvent::Addressed(input_identity, Value::Hat(HatDirection::UpRight)).send(&push, 0).unwrap();
    ControlEvent::ready(output_identity).send(&node, 0).unwrap();
    let got = ControlEvent::recv(&node, 0).unwrap();
    assert_eq!(got.value().as_hat().unwrap().bits(), 3);
}

/// Scenario 5: a design with two physical devices, one `register` request
/// carrying both, matched by guid and then by name.
#[test]
fn handshake_completion_matches_by_guid_then_name() {
    let requests = "tcp://127.0.0.1:18141";

    let design = Design::new(
        "two-devices",
        vec![
            PhysicalDeviceDescriptor::new("joy", Some("G1".into()), None),
            PhysicalDeviceDescriptor::new("pdl", None, Some("Pedals".into())),
        ],
        vec![],
    )
    .unwrap();

    let cfg = config(requests, "tcp://127.0.0.1:18142", "tcp://127.0.0.1:18143");
    let engine = Arc::new(Engine::new(&cfg, design, ProcessorRegistry::new()).unwrap());
    let _run_handle = thread::spawn(move || engine.run());
    thread::sleep(SETTLE);

    let ctx = ::zmq::Context::new();
    let reply = register(
        &ctx,
        requests,
        vec![
            AnnouncedDevice { guid: Some("G1".into()), name: Some("Joystick".into()) },
            AnnouncedDevice { guid: Some("G2".into()), name: Some("Pedals".into()) },
        ],
    );

    assert_eq!(reply.node_id, 0);
    assert_eq!(reply.devices.len(), 2);
    assert_eq!(reply.devices[0].alias, "joy");
    assert_eq!(reply.devices[0].device_id, 0);
    assert_eq!(reply.devices[1].alias, "pdl");
    assert_eq!(reply.devices[1].device_id, 1);
}

/// Scenario 6: 12 declared virtual axes spill across two 8-axis devices.
#[test]
fn capacity_spills_across_output_devices() {
    let requests = "tcp://127.0.0.1:18151";

    let controls = (0..12)
        .map(|_| VirtualControlSpec {
            name: None,
            kind: ControlKind::Axis,
            processor: "passthrough".into(),
            inputs: vec![InputRef::Physical { alias: "joy".into(), kind: ControlKind::Axis, id: 0 }],
        })
        .collect();

    let design = Design::new(
        "spill",
        vec![PhysicalDeviceDescriptor::new("joy", Some("G1".into()), None)],
        controls,
    )
    .unwrap();

    let cfg = config(requests, "tcp://127.0.0.1:18152", "tcp://127.0.0.1:18153");
    let engine = Arc::new(Engine::new(&cfg, design, ProcessorRegistry::new()).unwrap());
    let _run_handle = thread::spawn(move || engine.run());
    thread::sleep(SETTLE);

    let ctx = ::zmq::Context::new();
    let assigned = capabilities(
        &ctx,
        requests,
        vec![
            DeviceCapabilities { max_nb_axes: 8, max_nb_buttons: 0, max_nb_hats: 0 },
            DeviceCapabilities { max_nb_axes: 8, max_nb_buttons: 0, max_nb_hats: 0 },
        ],
    );

    assert_eq!(assigned.devices[0].axes, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(assigned.devices[1].axes, vec![0, 1, 2, 3]);
}

/// Scenario 7: a virtual control (`not_`) takes another virtual control
/// (a `passthrough` button, named `base`) as its input rather than a
/// physical control directly, exercising §3's DAG over physical-or-virtual
/// inputs and the actuator's feedback republish into the input fabric.
#[test]
fn virtual_control_chained_from_another_virtual_control() {
    let requests = "tcp://127.0.0.1:18171";
    let input_events = "tcp://127.0.0.1:18172";
    let output_events = "tcp://127.0.0.1:18173";

    let design = Design::new(
        "chained",
        vec![PhysicalDeviceDescriptor::new("thr", Some("G1".into()), None)],
        vec![
            VirtualControlSpec {
                name: Some("base".into()),
                kind: ControlKind::Button,
                processor: "passthrough".into(),
                inputs: vec![InputRef::Physical { alias: "thr".into(), kind: ControlKind::Button, id: 0 }],
            },
            VirtualControlSpec {
                name: None,
                kind: ControlKind::Button,
                processor: "not_".into(),
                inputs: vec![InputRef::Virtual { name: "base".into() }],
            },
        ],
    )
    .unwrap();

    let engine = Arc::new(Engine::new(&config(requests, input_events, output_events), design, ProcessorRegistry::new()).unwrap());
    let _run_handle = thread::spawn(move || engine.run());
    thread::sleep(SETTLE);

    let ctx = ::zmq::Context::new();
    register(&ctx, requests, vec![AnnouncedDevice { guid: Some("G1".into()), name: None }]);
    // One capabilities call with room for a single button: `base` is
    // assigned first (device_id 0), then `not_` can resolve its `virt=base`
    // input immediately since both share the axes->buttons->hats ordering
    // within this same call but `base` is dequeued before `not_`.
    let first = capabilities(&ctx, requests, vec![DeviceCapabilities { max_nb_axes: 0, max_nb_buttons: 1, max_nb_hats: 0 }]);
    assert_eq!(first.devices[0].buttons, vec![0]);
    // `not_` was deferred (its dependency wasn't resolved within the first
    // device's single slot), so a second device in the same handshake
    // exchange picks it up once `base` is already resolved.
    let second = capabilities(&ctx, requests, vec![DeviceCapabilities { max_nb_axes: 0, max_nb_buttons: 1, max_nb_hats: 0 }]);
    assert_eq!(second.devices[0].buttons, vec![0]);
    thread::sleep(SETTLE);

    let base_identity = Identity::new(0, 0, ControlKind::Button, 0).unwrap();
    let not_identity = Identity::new(0, 1, ControlKind::Button, 0).unwrap();
    let physical_identity = Identity::new(0, 0, ControlKind::Button, 0).unwrap();

    let push = ctx.socket(::zmq::PUSH).unwrap();
    push.connect(input_events).unwrap();
    let base_node = ctx.socket(::zmq::DEALER).unwrap();
    base_node.set_identity(&base_identity.encode()).unwrap();
    base_node.connect(output_events).unwrap();
    let not_node = ctx.socket(::zmq::DEALER).unwrap();
    not_node.set_identity(&not_identity.encode()).unwrap();
    not_node.connect(output_events).unwrap();
    thread::sleep(SHORT);

    ControlEvent::Addressed(physical_identity, Value::Button(true)).send(&push, 0).unwrap();
    ControlEvent::ready(base_identity).send(&base_node, 0).unwrap();
    let got_base = ControlEvent::recv(&base_node, 0).unwrap();
    assert_eq!(got_base.value(), Value::Button(true));

    ControlEvent::ready(not_identity).send(&not_node, 0).unwrap();
    let got_not = ControlEvent::recv(&not_node, 0).unwrap();
    assert_eq!(got_not.value(), Value::Button(false));
}

/// An unrecognised command name during the handshake aborts the engine
/// run loop instead of skipping it silently.
#[test]
fn unexpected_command_during_handshake_aborts() {
    let requests = "tcp://127.0.0.1:18161";

    let design = Design::new(
        "abort",
        vec![PhysicalDeviceDescriptor::new("joy", Some("G1".into()), None)],
        vec![],
    )
    .unwrap();

    let cfg = config(requests, "tcp://127.0.0.1:18162", "tcp://127.0.0.1:18163");
    let engine = Arc::new(Engine::new(&cfg, design, ProcessorRegistry::new()).unwrap());

    let client_requests = requests.to_string();
    thread::spawn(move || {
        thread::sleep(SETTLE);
        let ctx = ::zmq::Context::new();
        let client = req_socket(&ctx, &client_requests);
        // An opaque, unrecognised command name rather than a well-known one.
        let frames: Vec<Vec<u8>> = vec![b"reticulate_splines".to_vec()];
        client.send_multipart(frames, 0).unwrap();
        let _ = client.recv_multipart(0);
    });

    let result = engine.run();
    assert!(matches!(result, Err(::njoy_core::EngineError::UnexpectedCommand(name)) if name == "reticulate_splines"));
}
