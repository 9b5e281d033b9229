//! The multiplexing fabric (C3, C4; §4.3, §4.4): the Input Multiplexer
//! fans raw physical events out to subscribed in-process consumers, and
//! the Output Multiplexer runs the one-in-flight-per-control REQ/REP
//! rendezvous between actuators and output nodes.
//!
//! Both are built directly on ZeroMQ socket patterns, matching the
//! original (`njoy_core/core/multiplexers.py`, itself built on `pyzmq`):
//! PULL/PUB for the input side (a bare `zmq::proxy`), ROUTER/ROUTER for
//! the output side (a hand-rolled poll loop, since the rendezvous logic
//! has no off-the-shelf proxy).

use ::std::collections::HashMap;

use ::njoy_wire::{ControlEvent, Identity, Value};

use crate::error::{EngineError, Result};

/// Ingress: PULL, bound to `frontend`. Egress: PUB, bound to `backend`.
/// Relaying the two is exactly `zmq::proxy`: frame-for-frame, preserving
/// per-source order, no acknowledgement, no backpressure at this layer
/// (§4.3) — a slow subscriber's high-water mark silently drops its
/// messages, which the Input Buffer (§4.5) is built to tolerate.
pub struct InputMultiplexer {
    frontend: ::zmq::Socket,
    backend: ::zmq::Socket,
}

impl InputMultiplexer {
    pub fn bind(ctx: &::zmq::Context, frontend_endpoint: &str, backend_endpoint: &str) -> Result<Self> {
        let frontend = ctx.socket(::zmq::PULL)?;
        frontend.bind(frontend_endpoint)?;
        let backend = ctx.socket(::zmq::PUB)?;
        backend.bind(backend_endpoint)?;
        Ok(InputMultiplexer { frontend, backend })
    }

    /// Runs the proxy loop. Blocks until the context is terminated; meant
    /// to be the body of its own dedicated thread (§5).
    pub fn run(&self) -> Result<()> {
        ::zmq::proxy(&self.frontend, &self.backend)?;
        Ok(())
    }
}

/// Strips the ROUTER-level envelope (the peer's own zmq identity, plus
/// a REQ socket's automatic empty delimiter frame if the peer is a REQ
/// rather than a raw DEALER) and parses the remainder as a
/// [`ControlEvent`]. This is the standard ROUTER/REQ bridging idiom: a
/// REQ peer's every message is prefixed with one empty frame, which a
/// DEALER peer does not add, so we tell them apart by the emptiness of
/// the frame right after the peer id (an identity frame is never empty,
/// it is always exactly 2 bytes).
fn recv_addressed_event(socket: &::zmq::Socket) -> Result<(Vec<u8>, Identity, Value)> {
    let mut frames = socket.recv_multipart(0).map_err(::njoy_wire::WireError::from)?;
    if frames.is_empty() {
        return Err(EngineError::Wire(::njoy_wire::WireError::BadControlEvent(
            "router frame carried no peer envelope".into(),
        )));
    }
    let peer_id = frames.remove(0);
    if frames.first().map(|f| f.is_empty()).unwrap_or(false) {
        frames.remove(0);
    }
    let event = ControlEvent::from_frames(&frames)?;
    let identity = event.identity().ok_or_else(|| {
        EngineError::Wire(::njoy_wire::WireError::BadControlEvent(
            "output multiplexer only handles addressed control events".into(),
        ))
    })?;
    Ok((peer_id, identity, event.value()))
}

/// Sends `event` to the peer identified by `peer_id`, re-adding the empty
/// delimiter a REQ-style peer expects to have stripped for it.
fn send_addressed_event(socket: &::zmq::Socket, peer_id: Vec<u8>, event: ControlEvent) -> Result<()> {
    socket.send(peer_id, ::zmq::SNDMORE).map_err(::njoy_wire::WireError::from)?;
    socket.send(Vec::new(), ::zmq::SNDMORE).map_err(::njoy_wire::WireError::from)?;
    event.send(socket, 0)?;
    Ok(())
}

/// One control's pending half of the rendezvous: either a value the
/// actuator posted while waiting for the output node, or a ready token
/// the output node posted while waiting for the actuator.
enum Pending {
    ValueFromActuator { peer_id: Vec<u8>, value: Value },
    ReadyFromNode { peer_id: Vec<u8> },
}

/// Frontend: ROUTER facing output nodes (one REQ-style peer per virtual
/// control, mirroring the actuator side). Backend: ROUTER facing
/// actuators. At most one [`Pending`] entry per control (§4.4); memory is
/// bounded by the number of virtual controls.
pub struct OutputMultiplexer {
    frontend: ::zmq::Socket,
    backend: ::zmq::Socket,
}

impl OutputMultiplexer {
    pub fn bind(ctx: &::zmq::Context, frontend_endpoint: &str, backend_endpoint: &str) -> Result<Self> {
        let frontend = ctx.socket(::zmq::ROUTER)?;
        frontend.bind(frontend_endpoint)?;
        let backend = ctx.socket(::zmq::ROUTER)?;
        backend.bind(backend_endpoint)?;
        Ok(OutputMultiplexer { frontend, backend })
    }

    /// Runs the poll loop. Blocks until the context is terminated; meant
    /// to be the body of its own dedicated thread (§5).
    pub fn run(&self) -> Result<()> {
        let mut pending: HashMap<Identity, Pending> = HashMap::new();
        loop {
            self.poll_once(&mut pending)?;
        }
    }

    /// One iteration of the fair poll over both sockets, exposed
    /// separately so tests can drive it deterministically.
    pub fn poll_once(&self, pending: &mut HashMap<Identity, Pending>) -> Result<()> {
        let mut items = [
            self.backend.as_poll_item(::zmq::POLLIN),
            self.frontend.as_poll_item(::zmq::POLLIN),
        ];
        ::zmq::poll(&mut items, -1).map_err(::njoy_wire::WireError::from)?;

        if items[0].is_readable() {
            let (peer_id, identity, value) = recv_addressed_event(&self.backend)?;
            match pending.remove(&identity) {
                Some(Pending::ReadyFromNode { peer_id: node_peer }) => {
                    ::log::trace!("output mux: {:?} = {:?} paired with a waiting node", identity, value);
                    send_addressed_event(&self.frontend, node_peer, ControlEvent::Addressed(identity, value))?;
                    send_addressed_event(&self.backend, peer_id, ControlEvent::ready(identity))?;
                }
                _ => {
                    pending.insert(identity, Pending::ValueFromActuator { peer_id, value });
                }
            }
        }

        if items[1].is_readable() {
            let (peer_id, identity, _ready_value) = recv_addressed_event(&self.frontend)?;
            match pending.remove(&identity) {
                Some(Pending::ValueFromActuator { peer_id: actuator_peer, value }) => {
                    send_addressed_event(&self.frontend, peer_id, ControlEvent::Addressed(identity, value))?;
                    send_addressed_event(&self.backend, actuator_peer, ControlEvent::ready(identity))?;
                }
                _ => {
                    pending.insert(identity, Pending::ReadyFromNode { peer_id });
                }
            }
        }

        Ok(())
    }
}
