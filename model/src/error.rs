use ::thiserror::Error;

/// Errors raised by the object model (§7). Every variant is fatal to the
/// caller: construction-time failures indicate a design or deployment
/// error, lookup failures indicate a corrupt message or a programming
/// bug. Nothing here is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{0:?} node capacity (16) exceeded")]
    NodeOverflow(::njoy_wire::NodeKind),

    #[error("node {node_id} device capacity (16) exceeded")]
    NodeDeviceOverflow { node_id: u8 },

    #[error("{0:?} node {1} not found")]
    NodeNotFound(::njoy_wire::NodeKind, u8),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("{kind:?} control capacity ({capacity}) exceeded on device")]
    ControlOverflow {
        kind: ::njoy_wire::ControlKind,
        capacity: usize,
    },

    #[error("expected an output node, got an input node")]
    InvalidNode,

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("invalid lookup: {0}")]
    InvalidLookup(String),

    #[error("duplicate alias: {0}")]
    DuplicateAlias(String),

    #[error("duplicate guid: {0}")]
    DuplicateGuid(String),

    #[error("ambiguous device name {0:?}, a guid is required to disambiguate")]
    AmbiguousName(String),

    #[error("cannot register a virtual control at an id already occupied by a non-physical control")]
    DeviceRegisterControl,
}

pub type Result<T> = ::std::result::Result<T, ModelError>;
