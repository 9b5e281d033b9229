use ::thiserror::Error;

/// Errors raised by the runtime data plane (§7): the multiplexing fabric,
/// the handshake, and the per-control processing chain. Every variant is
/// fatal to the task that raised it; nothing here is retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Wire(#[from] ::njoy_wire::WireError),

    #[error(transparent)]
    Model(#[from] ::njoy_model::ModelError),

    #[error(transparent)]
    Design(#[from] ::njoy_design::DesignError),

    #[error("zmq error: {0}")]
    Zmq(#[from] ::zmq::Error),

    #[error("unexpected command {0:?} received during handshake")]
    UnexpectedCommand(String),

    #[error("design references an unknown processor {0:?}")]
    UnknownProcessor(String),

    #[error("design's virtual control has the wrong number of inputs for processor {processor:?}: expected {expected}, got {got}")]
    ArityMismatch {
        processor: String,
        expected: &'static str,
        got: usize,
    },

    #[error("handshake reply carried no payload for command {0:?}")]
    MissingPayload(String),
}

pub type Result<T> = ::std::result::Result<T, EngineError>;
