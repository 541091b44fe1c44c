use std::collections::BTreeMap;
use std::sync::Arc;

use net::{Outbound, OutboundTx, Packet};
use thiserror::Error;
use tokio::sync::RwLock;

pub mod broadcast;
pub mod shutdown;

pub use broadcast::BroadcastRouter;
pub use shutdown::{shutdown_channel, ShutdownRx, ShutdownTx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn,
    Playing,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown session: {0:?}")]
    UnknownSession(SessionId),

    #[error("account already logged in: {0}")]
    AccountInUse(String),

    #[error("character already in the world: {0}")]
    CharacterInUse(String),
}

/// The registry's view of one live connection.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub session_id: SessionId,
    pub state: SessionState,
    pub account: Option<String>,
    pub character: Option<String>,
    outbound: OutboundTx,
    shutdown: ShutdownTx,
}

impl PlayerSession {
    pub fn new(session_id: SessionId, outbound: OutboundTx, shutdown: ShutdownTx) -> Self {
        Self {
            session_id,
            state: SessionState::LoggedOut,
            account: None,
            character: None,
            outbound,
            shutdown,
        }
    }

    /// Queue a packet for this session. Returns false if its writer is gone.
    pub fn send(&self, packet: Packet) -> bool {
        self.outbound.send(Outbound::new(packet)).is_ok()
    }

    /// Ask this session's worker to stop.
    pub fn signal_shutdown(&self) {
        self.shutdown.trigger();
    }
}

/// Live-session registry shared by the acceptor and every worker.
pub type SharedSessions = Arc<RwLock<SessionManager>>;

/// Tracks every connected session plus the account and character names
/// currently held. All claim checks happen under one `&mut self` so a
/// check-then-set cannot interleave with another session's.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: BTreeMap<SessionId, PlayerSession>,
    accounts: BTreeMap<String, SessionId>,
    characters: BTreeMap<String, SessionId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSessions {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Add a freshly accepted connection.
    pub fn register(&mut self, session_id: SessionId, outbound: OutboundTx, shutdown: ShutdownTx) {
        self.sessions
            .insert(session_id, PlayerSession::new(session_id, outbound, shutdown));
    }

    /// Remove a session and release any account or character it held.
    pub fn deregister(&mut self, session_id: SessionId) -> Option<PlayerSession> {
        let session = self.sessions.remove(&session_id)?;
        self.accounts.retain(|_, holder| *holder != session_id);
        self.characters.retain(|_, holder| *holder != session_id);
        Some(session)
    }

    pub fn get(&self, session_id: SessionId) -> Option<&PlayerSession> {
        self.sessions.get(&session_id)
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Bind an account to a session if no other live session holds it.
    /// Account names compare case-insensitively.
    pub fn claim_account(
        &mut self,
        session_id: SessionId,
        account: &str,
    ) -> Result<(), SessionError> {
        if !self.sessions.contains_key(&session_id) {
            return Err(SessionError::UnknownSession(session_id));
        }
        let key = account.to_lowercase();
        match self.accounts.get(&key) {
            Some(holder) if *holder != session_id => {
                Err(SessionError::AccountInUse(account.to_string()))
            }
            _ => {
                self.accounts.insert(key, session_id);
                if let Some(session) = self.sessions.get_mut(&session_id) {
                    session.account = Some(account.to_string());
                    session.state = SessionState::LoggedIn;
                }
                Ok(())
            }
        }
    }

    /// Which session holds an account, if any.
    pub fn account_holder(&self, account: &str) -> Option<SessionId> {
        self.accounts.get(&account.to_lowercase()).copied()
    }

    /// Bind a character to a session and mark it Playing.
    pub fn claim_character(
        &mut self,
        session_id: SessionId,
        character: &str,
    ) -> Result<(), SessionError> {
        if !self.sessions.contains_key(&session_id) {
            return Err(SessionError::UnknownSession(session_id));
        }
        let key = character.to_lowercase();
        match self.characters.get(&key) {
            Some(holder) if *holder != session_id => {
                Err(SessionError::CharacterInUse(character.to_string()))
            }
            _ => {
                self.characters.insert(key, session_id);
                if let Some(session) = self.sessions.get_mut(&session_id) {
                    session.character = Some(character.to_string());
                    session.state = SessionState::Playing;
                }
                Ok(())
            }
        }
    }

    /// Drop the session's character binding and return it to LoggedIn.
    pub fn release_character(&mut self, session_id: SessionId) -> Option<String> {
        let session = self.sessions.get_mut(&session_id)?;
        let name = session.character.take()?;
        session.state = SessionState::LoggedIn;
        self.characters.remove(&name.to_lowercase());
        Some(name)
    }

    /// All sessions in Playing state (sorted by session ID).
    pub fn playing_sessions(&self) -> Vec<&PlayerSession> {
        self.sessions
            .values()
            .filter(|s| s.state == SessionState::Playing)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Trigger the shutdown signal of every live session.
    pub fn signal_shutdown_all(&self) {
        for session in self.sessions.values() {
            session.signal_shutdown();
        }
    }
}
