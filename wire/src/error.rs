use ::thiserror::Error;

/// Errors raised while encoding or decoding frames on the wire.
///
/// Every variant here is fatal to the task that raised it (see the error
/// handling policy): callers are expected to abort, not retry.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed identity frame: {0}")]
    BadIdentity(String),

    #[error("malformed value frame: {0}")]
    BadValue(String),

    #[error("malformed control event: {0}")]
    BadControlEvent(String),

    #[error("command frame is not valid utf-8")]
    BadCommand,

    #[error("missing argument frame for command {command:?} (expected at least {expected}, got {got})")]
    MissingArgument {
        command: String,
        expected: usize,
        got: usize,
    },

    #[error("zmq error: {0}")]
    Zmq(#[from] ::zmq::Error),

    #[error("payload serialization error: {0}")]
    Bincode(#[from] ::bincode::Error),
}

pub type Result<T> = ::std::result::Result<T, WireError>;
