use ::thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DesignError {
    #[error("duplicate device alias: {0}")]
    DuplicateAlias(String),

    #[error("unknown device alias referenced: {0}")]
    UnknownAlias(String),

    #[error("virtual control input references an unknown or not-yet-declared virtual control: {0}")]
    UnknownVirtualControl(String),

    #[error("duplicate virtual control name: {0}")]
    DuplicateVirtualControlName(String),

    #[error("duplicate device map for device name {0:?}")]
    DuplicateDeviceMap(String),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = ::std::result::Result<T, DesignError>;
