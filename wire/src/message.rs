//! Multi-frame message shapes carried over the transport: the control
//! event (§4.1) and the request/reply command frame (§4.1, "Request/reply
//! messages").

use crate::error::{Result, WireError};
use crate::identity::Identity;
use crate::value::Value;

/// A control event, either anonymous (bare value frame, used when the
/// identity is already implied by the socket's routing, e.g. a PUSH
/// socket dedicated to one control) or addressed (identity + empty +
/// value, used whenever the far end is a routed socket).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    Anonymous(Value),
    Addressed(Identity, Value),
}

impl ControlEvent {
    /// A "ready" token is an addressed event with an empty value frame.
    pub fn ready(identity: Identity) -> Self {
        ControlEvent::Addressed(identity, Value::Ready)
    }

    pub fn identity(&self) -> Option<Identity> {
        match self {
            ControlEvent::Addressed(identity, _) => Some(*identity),
            ControlEvent::Anonymous(_) => None,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            ControlEvent::Anonymous(v) | ControlEvent::Addressed(_, v) => *v,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.value(), Value::Ready)
    }

    pub fn into_frames(self) -> Vec<Vec<u8>> {
        match self {
            ControlEvent::Anonymous(value) => vec![value.encode()],
            ControlEvent::Addressed(identity, value) => {
                vec![identity.encode().to_vec(), Vec::new(), value.encode()]
            }
        }
    }

    pub fn from_frames(frames: &[Vec<u8>]) -> Result<Self> {
        match frames.len() {
            1 => Ok(ControlEvent::Anonymous(Value::decode(&frames[0])?)),
            3 => {
                if !frames[1].is_empty() {
                    return Err(WireError::BadControlEvent(
                        "the empty frame between identity and value must be empty".into(),
                    ));
                }
                let identity = Identity::decode(&frames[0])?;
                let value = Value::decode(&frames[2])?;
                Ok(ControlEvent::Addressed(identity, value))
            }
            n => Err(WireError::BadControlEvent(format!(
                "a control event has 1 (anonymous) or 3 (addressed) frames, got {}",
                n
            ))),
        }
    }

    /// Sends this event's frames on `socket`, using `SNDMORE` between all
    /// but the last frame. Any additional routing-identity frames (e.g. a
    /// ROUTER socket's peer id) must already have been sent by the caller.
    pub fn send(self, socket: &::zmq::Socket, flags: i32) -> Result<()> {
        let frames = self.into_frames();
        let last = frames.len() - 1;
        for (i, frame) in frames.into_iter().enumerate() {
            let more = if i == last { 0 } else { ::zmq::SNDMORE };
            socket.send(frame, flags | more)?;
        }
        Ok(())
    }

    /// Receives one control event's worth of frames from `socket`.
    pub fn recv(socket: &::zmq::Socket, flags: i32) -> Result<Self> {
        let frames = socket.recv_multipart(flags)?;
        Self::from_frames(&frames)
    }
}

/// The well-known request/reply command names recognised by the
/// handshake (§4.8); any other command name round-trips as `Unknown` so
/// forward-compatible peers are not rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Register,
    Registered,
    Capabilities,
    Assignments,
}

impl CommandName {
    fn as_str(self) -> &'static str {
        match self {
            CommandName::Register => "register",
            CommandName::Registered => "registered",
            CommandName::Capabilities => "capabilities",
            CommandName::Assignments => "assignments",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "register" => Some(CommandName::Register),
            "registered" => Some(CommandName::Registered),
            "capabilities" => Some(CommandName::Capabilities),
            "assignments" => Some(CommandName::Assignments),
            _ => None,
        }
    }
}

/// A transport-agnostic request/reply message: `[command_bytes, arg1,
/// arg2, ...]`. Argument frames are opaque payloads; this crate does not
/// know what serialised object-model fragment they carry, that's the
/// caller's business (`njoy-core` uses `bincode` over `njoy-model`
/// types).
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: CommandNameOrOpaque,
    pub args: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandNameOrOpaque {
    Known(CommandName),
    Opaque(String),
}

impl Command {
    pub fn new(name: CommandName, args: Vec<Vec<u8>>) -> Self {
        Command {
            name: CommandNameOrOpaque::Known(name),
            args,
        }
    }

    pub fn register(args: Vec<Vec<u8>>) -> Self {
        Self::new(CommandName::Register, args)
    }

    pub fn registered(args: Vec<Vec<u8>>) -> Self {
        Self::new(CommandName::Registered, args)
    }

    pub fn capabilities(args: Vec<Vec<u8>>) -> Self {
        Self::new(CommandName::Capabilities, args)
    }

    pub fn assignments(args: Vec<Vec<u8>>) -> Self {
        Self::new(CommandName::Assignments, args)
    }

    pub fn name_str(&self) -> &str {
        match &self.name {
            CommandNameOrOpaque::Known(n) => n.as_str(),
            CommandNameOrOpaque::Opaque(s) => s.as_str(),
        }
    }

    pub fn into_frames(self) -> Vec<Vec<u8>> {
        let mut frames = Vec::with_capacity(self.args.len() + 1);
        frames.push(self.name_str().as_bytes().to_vec());
        frames.extend(self.args);
        frames
    }

    pub fn from_frames(mut frames: Vec<Vec<u8>>) -> Result<Self> {
        if frames.is_empty() {
            return Err(WireError::MissingArgument {
                command: String::new(),
                expected: 1,
                got: 0,
            });
        }
        let command_bytes = frames.remove(0);
        let command = String::from_utf8(command_bytes).map_err(|_| WireError::BadCommand)?;
        let name = match CommandName::parse(&command) {
            Some(known) => CommandNameOrOpaque::Known(known),
            None => CommandNameOrOpaque::Opaque(command),
        };
        Ok(Command { name, args: frames })
    }

    pub fn send(self, socket: &::zmq::Socket, flags: i32) -> Result<()> {
        let frames = self.into_frames();
        let last = frames.len() - 1;
        for (i, frame) in frames.into_iter().enumerate() {
            let more = if i == last { 0 } else { ::zmq::SNDMORE };
            socket.send(frame, flags | more)?;
        }
        Ok(())
    }

    pub fn recv(socket: &::zmq::Socket, flags: i32) -> Result<Self> {
        let frames = socket.recv_multipart(flags)?;
        Self::from_frames(frames)
    }
}
