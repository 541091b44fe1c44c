use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client closed the connection or logged out.
    Closed,
    /// Server-wide shutdown.
    Shutdown,
    /// Authentication failure or other deliberate disconnect.
    Kicked,
    /// Read or write failure on the socket.
    IoError,
}

/// Per-connection counters, logged once when the session worker exits.
#[derive(Debug, Clone)]
pub struct ConnectionMetrics {
    pub session_id: u64,
    pub commands: usize,
    pub duration_ms: u128,
    pub account: Option<String>,
    pub end: SessionEnd,
}

impl ConnectionMetrics {
    pub fn new(session_id: u64) -> Self {
        Self {
            session_id,
            commands: 0,
            duration_ms: 0,
            account: None,
            end: SessionEnd::Closed,
        }
    }

    pub fn log(&self) {
        if self.end == SessionEnd::IoError {
            tracing::warn!(
                session = self.session_id,
                commands = self.commands,
                duration_ms = self.duration_ms,
                account = self.account.as_deref().unwrap_or("-"),
                "session ended by I/O error"
            );
        } else {
            tracing::info!(
                session = self.session_id,
                commands = self.commands,
                duration_ms = self.duration_ms,
                account = self.account.as_deref().unwrap_or("-"),
                end = ?self.end,
                "session ended"
            );
        }
    }
}
