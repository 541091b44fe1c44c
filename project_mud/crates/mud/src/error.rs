use persistence::PersistenceError;
use player_db::PlayerDbError;
use thiserror::Error;

pub const PARSE_FAIL: &str = "I don't know what '{}' means.";
pub const SPEAK_UP: &str = "You'll have to speak up!";

/// Failure inside a command handler.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Wrong or missing arguments; the registry answers with the usage text.
    #[error("bad usage")]
    Usage,

    /// The session's writer is gone.
    #[error("outbound channel closed")]
    Disconnected,

    #[error("account storage: {0}")]
    Gateway(#[from] PlayerDbError),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Why `CommandRegistry::dispatch` did not run a command to completion.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("empty input")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Command(CommandError),
}

impl DispatchError {
    /// Text the client should see, if any. Handler failures are not
    /// surfaced; the worker logs them.
    pub fn reply(&self) -> Option<String> {
        match self {
            Self::Empty => Some(SPEAK_UP.to_string()),
            Self::Unknown(kw) => Some(PARSE_FAIL.replace("{}", kw)),
            Self::Usage(usage) => Some(usage.clone()),
            Self::Command(_) => None,
        }
    }
}

/// Failures of the server as a whole.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("persistence: {0}")]
    Persistence(#[from] PersistenceError),
}
