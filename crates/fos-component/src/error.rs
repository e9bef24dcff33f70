//! Component errors

use fos_dom::DomError;

/// Result alias used throughout the crate
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Attribute store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttrError {
    #[error("Attribute `{0}` is not declared")]
    Undeclared(String),

    #[error("Invalid value for attribute `{0}`")]
    Validation(String),

    #[error("Attribute `{0}` can only be written once")]
    WriteOnce(String),
}

/// Component lifecycle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    #[error("Component `{0}` was already rendered")]
    AlreadyRendered(String),

    #[error("Component `{0}` was already decorated")]
    AlreadyDecorated(String),

    #[error("Attribute name `{0}` is reserved")]
    ReservedAttributeName(String),

    #[error("A live component with id `{0}` already exists")]
    DuplicateId(String),

    /// Never returned to callers; logged when an `events` entry is skipped.
    #[error("Unresolved handler `{handler}` for event `{event}`: {reason}")]
    UnresolvedEventHandler {
        event: String,
        handler: String,
        reason: String,
    },

    #[error("No component type registered as `{0}`")]
    UnknownComponentType(String),

    #[error("Component `{0}` has not been rendered yet")]
    NotRendered(String),

    #[error("Component `{0}` is disposed")]
    Disposed(String),

    #[error("Component `{0}` was rendered, its id can no longer change")]
    ImmutableId(String),

    #[error("Component `{0}` has no element")]
    MissingElement(String),

    #[error(transparent)]
    Attr(#[from] AttrError),

    #[error(transparent)]
    Dom(#[from] DomError),
}
