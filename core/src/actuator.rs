//! The Actuator (C7, §4.7): per virtual control, drives its processor
//! over the latest snapshot from its Input Buffer and pushes the result
//! to the Output Multiplexer under a strict one-exchange-at-a-time
//! cadence, using a REQ socket whose identity is the control's own wire
//! identity.
//!
//! A virtual control can itself be the input of another virtual control
//! (§3's DAG over physical-or-virtual inputs), so every posted value is
//! also re-published onto the Input Multiplexer's ingress under the
//! control's own identity — the same ingress physical input nodes push
//! raw events onto. This is what lets a downstream Input Buffer subscribe
//! to a virtual control exactly as it would a physical one.

use ::std::sync::Arc;

use ::njoy_wire::{ControlEvent, Identity};

use crate::buffer::InputBuffer;
use crate::error::Result;
use crate::processor::Processor;

pub struct Actuator {
    identity: Identity,
    socket: ::zmq::Socket,
    feedback: ::zmq::Socket,
    processor: Arc<dyn Processor>,
    input_buffer: Arc<InputBuffer>,
}

impl Actuator {
    /// Connects a REQ socket to `output_endpoint` (the Output
    /// Multiplexer's backend) with its zmq identity set to `identity`'s
    /// encoding, so the multiplexer's ROUTER can address replies back to
    /// exactly this actuator. Also connects a PUSH socket to
    /// `input_endpoint` (the Input Multiplexer's ingress) so this
    /// control's posted values reach any Input Buffer that names it as
    /// an input.
    pub fn connect(
        ctx: &::zmq::Context,
        output_endpoint: &str,
        input_endpoint: &str,
        identity: Identity,
        processor: Arc<dyn Processor>,
        input_buffer: Arc<InputBuffer>,
    ) -> Result<Self> {
        let socket = ctx.socket(::zmq::REQ)?;
        socket.set_identity(&identity.encode())?;
        socket.connect(output_endpoint)?;
        let feedback = ctx.socket(::zmq::PUSH)?;
        feedback.connect(input_endpoint)?;
        Ok(Actuator {
            identity,
            socket,
            feedback,
            processor,
            input_buffer,
        })
    }

    /// One request/reply exchange: pop a snapshot (blocking), apply the
    /// processor, post the value, wait for the matching ready token. Even
    /// when the processor's output is unchanged from last time, the
    /// exchange still happens in full (§4.7: "the output node decides
    /// whether to re-drive the virtual device"). The same value is then
    /// fed back into the input fabric so a dependent virtual control's
    /// Input Buffer sees it.
    pub fn step(&self) -> Result<()> {
        let snapshot = self.input_buffer.state();
        let inputs = snapshot.values();
        let value = self.processor.apply(&inputs)?;
        ::log::trace!("actuator {:?}: posting {:?} via {:?}", self.identity, value, self.processor.name());
        ControlEvent::Addressed(self.identity, value).send(&self.socket, 0)?;
        let reply = ControlEvent::recv(&self.socket, 0)?;
        debug_assert!(reply.is_ready(), "output multiplexer must reply with a ready token");
        ControlEvent::Addressed(self.identity, value).send(&self.feedback, 0)?;
        Ok(())
    }

    pub fn run(&self) -> Result<()> {
        loop {
            self.step()?;
        }
    }
}
