// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("transport: {0}")]
    Transport(String),
    #[error("deadline exceeded")]
    Timeout,
    #[error("decode: {0}")]
    Decode(String),
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// Timeouts are transport failures too; callers that only care about
    /// "the remote call failed" can check this one.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Advisory time-to-live handed to a backend on write. Zero means
/// "use the backend default".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TtlSeconds(pub u64);

impl TtlSeconds {
    pub fn as_duration(&self) -> Option<std::time::Duration> {
        (self.0 > 0).then(|| std::time::Duration::from_secs(self.0))
    }
}

pub mod config;
pub mod context;

pub use context::Context;
