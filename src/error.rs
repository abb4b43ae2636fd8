use thiserror::Error;

/// meetscribe's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// meetscribe's crate-wide error type.
///
/// Intentionally decoupled from `anyhow` so downstream consumers of the pluggable
/// capability traits aren't forced to adopt `anyhow` in their own public APIs.
///
/// `Transport` and `Fatal` can end a session; `Capability` and `StateViolation` are
/// always contained by the caller and never propagate past a single chunk or segment.
#[derive(Debug, Error)]
pub enum Error {
    /// Peer disconnect or malformed transport framing. The session ends; no event is sent.
    #[error("transport error: {0}")]
    Transport(String),

    /// A VAD/ASR/SV capability call failed. Always recovered by the caller: the current
    /// step or segment is skipped and the session continues.
    #[error("capability error in {stage}: {source}")]
    Capability {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// An internal invariant failed (e.g. a negative resolved ring index). Logged, the
    /// current segment is discarded, the session continues.
    #[error("state violation: {0}")]
    StateViolation(String),

    /// An uncaught condition in the session task. A single error event is sent and the
    /// connection is closed.
    #[error("fatal session error: {0}")]
    Fatal(String),
}

impl Error {
    pub fn capability(stage: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Capability {
            stage,
            source: source.into(),
        }
    }

    /// Numeric error code carried in the outbound wire event (`0` means ok; this is only
    /// read when an event is about to report a failure).
    pub fn wire_code(&self) -> i32 {
        match self {
            Error::Transport(_) => 1,
            Error::Capability { .. } => 2,
            Error::StateViolation(_) => 3,
            Error::Fatal(_) => 4,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Fatal(err.to_string())
    }
}
