//! Error types for the host capabilities and the agent itself.

/// The page (or the document it belongs to) could not be read.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("page detached: {0}")]
    Detached(String),
    #[error("host panicked: {0}")]
    Panicked(String),
    #[error("navigation source unavailable: {0}")]
    NavigationUnavailable(String),
}

/// Extension-local storage failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The extension was reloaded or removed underneath the page.
    #[error("extension context invalidated")]
    ContextInvalidated,
    #[error("io: {0}")]
    Io(String),
    #[error("encode: {0}")]
    Encode(String),
}

/// Messaging transport failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport unavailable")]
    Unavailable,
    #[error("no listener responded")]
    NoResponse,
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

/// Errors raised while building an agent.  Nothing the agent does at runtime
/// is surfaced to the host.
#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error("config: {0}")]
    Config(String),
}
