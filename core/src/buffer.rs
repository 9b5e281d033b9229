//! The Input Buffer (C5, §4.5): per virtual control, subscribes to the
//! identities of its physical inputs on the Input Multiplexer's egress
//! and maintains the latest value for each, publishing a snapshot to a
//! 2-slot internal queue whenever something changes.

use ::std::collections::HashMap;
use ::std::sync::Mutex;
use ::std::time::Duration;

use ::njoy_wire::{ControlEvent, Identity, Value};

use crate::error::Result;
use crate::queue::SlotQueue;

/// How long the actuator (and, internally, anything polling a queue
/// rather than blocking on a socket) sleeps between poll attempts (§5
/// "Suspension points").
pub const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// A snapshot of one virtual control's physical inputs, in the design's
/// declared order.
#[derive(Debug, Clone)]
pub struct Snapshot {
    ordered: Vec<Identity>,
    values: HashMap<Identity, Value>,
}

impl Snapshot {
    pub fn values(&self) -> Vec<Value> {
        self.ordered.iter().map(|id| self.values[id]).collect()
    }
}

pub struct InputBuffer {
    sub: ::zmq::Socket,
    inputs: Vec<Identity>,
    latest: Mutex<HashMap<Identity, Option<Value>>>,
    queue: SlotQueue<Snapshot>,
}

impl InputBuffer {
    /// Connects a SUB socket to `input_endpoint` (the Input Multiplexer's
    /// egress) and subscribes to each of `inputs`' 2-byte identity
    /// prefixes. `inputs` order is preserved into every snapshot, since
    /// that's the order a processor's positional arguments are applied
    /// in (§4.6).
    pub fn connect(ctx: &::zmq::Context, input_endpoint: &str, inputs: Vec<Identity>) -> Result<Self> {
        let sub = ctx.socket(::zmq::SUB)?;
        sub.connect(input_endpoint)?;
        for id in &inputs {
            sub.set_subscribe(&id.encode())?;
        }
        let latest = inputs.iter().map(|id| (*id, None)).collect();
        Ok(InputBuffer {
            sub,
            inputs,
            latest: Mutex::new(latest),
            queue: SlotQueue::new(2),
        })
    }

    fn publish_snapshot(&self, latest: &HashMap<Identity, Option<Value>>) {
        let values = latest
            .iter()
            .map(|(id, v)| (*id, v.expect("snapshot published only once every input is known")))
            .collect();
        self.queue.push(Snapshot {
            ordered: self.inputs.clone(),
            values,
        });
    }

    /// Consumes one physical control event and updates `latest`,
    /// publishing a snapshot if this completed the initial fill or
    /// changed a previously known value. Malformed events are a fatal
    /// `WireError`, propagated to the caller.
    fn handle_event(&self, event: ControlEvent) -> Result<()> {
        let identity = match event.identity() {
            Some(id) => id,
            None => return Ok(()), // not addressed to a specific control; ignore
        };
        let value = event.value();
        ::log::trace!("input buffer for {:?}: received {:?} = {:?}", self.inputs, identity, value);
        let mut latest = self.latest.lock().unwrap();
        let was_priming = latest.values().any(|v| v.is_none());
        let changed = latest.get(&identity).map(|v| *v != Some(value)).unwrap_or(false);
        if let Some(slot) = latest.get_mut(&identity) {
            *slot = Some(value);
        }
        if was_priming {
            if latest.values().all(|v| v.is_some()) {
                ::log::debug!("input buffer for {:?}: primed", self.inputs);
                self.publish_snapshot(&latest);
            }
        } else if changed {
            self.publish_snapshot(&latest);
        }
        Ok(())
    }

    /// Blocks on the SUB socket for the next event and processes it. The
    /// body of the Input Buffer's dedicated thread (§5).
    pub fn recv_and_update(&self) -> Result<()> {
        let event = ControlEvent::recv(&self.sub, 0)?;
        self.handle_event(event)
    }

    pub fn run(&self) -> Result<()> {
        loop {
            self.recv_and_update()?;
        }
    }

    /// Non-blocking read of the latest published snapshot. Returns `None`
    /// ("no update") until every declared input has produced at least
    /// one value.
    pub fn try_state(&self) -> Option<Snapshot> {
        self.queue.try_pop()
    }

    /// Blocks (polling at [`POLL_INTERVAL`]) until a snapshot is
    /// available, then returns it. Used by the Actuator (§4.7 step 1).
    pub fn state(&self) -> Snapshot {
        loop {
            if let Some(snapshot) = self.try_state() {
                return snapshot;
            }
            ::std::thread::sleep(POLL_INTERVAL);
        }
    }
}
