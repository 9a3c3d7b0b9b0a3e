//! Error types for the hookbridge runtime.

use crate::policy::ForbiddenReason;
use thiserror::Error;

/// Errors raised while loading method metadata or hook manifests.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Metadata entry is malformed.
    #[error("Invalid metadata: {0}")]
    Invalid(String),

    /// Hook manifest is malformed.
    #[error("Invalid hook manifest: {0}")]
    InvalidManifest(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

/// An error raised by the script engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ScriptError {
    message: String,
}

impl ScriptError {
    /// Create a script error with the engine's message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The engine's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The interception installer could not redirect a method.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InstallError(pub String);

/// No method matched a resolution query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The declaring type is not present in the metadata.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// The type exists but none of its methods match.
    #[error("No method matching {0}")]
    NoMatch(String),
}

/// Errors surfaced synchronously from hook registration.
///
/// A failed registration never leaves a dispatch handler installed or a
/// hook table entry written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A registration field is missing or has the wrong shape.
    #[error("Invalid hook field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// The script engine failed while a registration field was read.
    #[error("Could not read hook field '{field}': {source}")]
    Script {
        field: &'static str,
        source: ScriptError,
    },

    /// No method matched the request.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The security policy rejected the method.
    #[error("Cannot hook {method}: {reason}")]
    Forbidden {
        method: String,
        reason: ForbiddenReason,
    },

    /// The interception installer refused the method.
    #[error("Failed to install dispatch handler for {method}: {source}")]
    Install { method: String, source: InstallError },
}

impl RegistrationError {
    /// Shorthand for [`RegistrationError::InvalidField`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RegistrationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for hook registration.
pub type RegistrationResult<T> = std::result::Result<T, RegistrationError>;

/// Errors raised while dispatching an intercepted call to its hook.
///
/// Every value marshaled for the call has been released by the time one of
/// these reaches the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A native argument could not be converted to a script value.
    #[error("Failed to marshal argument {index} of {method}: {source}")]
    Marshal {
        method: String,
        index: usize,
        source: ScriptError,
    },

    /// The hook raised an error.
    #[error("Hook for {method} raised an error: {source}")]
    Invocation { method: String, source: ScriptError },

    /// The hook's override value could not be converted to the return type.
    #[error("Hook for {method} returned a value not convertible to {expected}: {source}")]
    Coercion {
        method: String,
        expected: String,
        source: ScriptError,
    },
}

/// Any error the bridge surfaces to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl From<ResolutionError> for HookError {
    fn from(err: ResolutionError) -> Self {
        HookError::Registration(err.into())
    }
}
