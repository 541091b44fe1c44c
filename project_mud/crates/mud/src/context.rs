use std::sync::Arc;

use net::{Outbound, OutboundTx, Packet};
use player_db::{Account, AccountGateway, PlayerCharacter, PlayerDbError};
use session::{BroadcastRouter, SessionId, SessionManager, SessionState, SharedSessions};
use space::World;
use tokio::sync::RwLock;

use crate::commands;
use crate::error::CommandError;
use crate::prompt::CreateCharacterPrompt;
use crate::registry::CommandRegistry;

/// The single world graph every session reads and mutates.
pub type SharedWorld = Arc<RwLock<World>>;

/// State shared by the acceptor and all session workers.
///
/// Lock order is always world, then sessions. A handler that needs both
/// takes the world lock first and may broadcast while holding it.
#[derive(Clone)]
pub struct GameContext {
    pub world: SharedWorld,
    pub sessions: SharedSessions,
    pub router: BroadcastRouter,
    pub gateway: Arc<dyn AccountGateway>,
}

impl GameContext {
    pub fn new(world: World, gateway: Arc<dyn AccountGateway>) -> Self {
        Self::with_shared(Arc::new(RwLock::new(world)), gateway)
    }

    pub fn with_shared(world: SharedWorld, gateway: Arc<dyn AccountGateway>) -> Self {
        let sessions = SessionManager::shared();
        Self {
            world,
            router: BroadcastRouter::new(sessions.clone()),
            sessions,
            gateway,
        }
    }
}

/// Per-connection state owned by one worker. Command handlers get
/// `&mut Session`.
pub struct Session {
    pub id: SessionId,
    pub state: SessionState,
    pub account: Option<Account>,
    /// Name of the character being played.
    pub character: Option<String>,
    /// Active character-creation prompt; while set, input bypasses the
    /// command registry.
    pub prompt: Option<CreateCharacterPrompt>,
    /// Set once the final packet has been queued.
    pub closing: bool,
    pub game: GameContext,
    registry: Arc<CommandRegistry<Session>>,
    out: OutboundTx,
}

impl Session {
    pub fn new(id: SessionId, out: OutboundTx, game: GameContext) -> Self {
        Self {
            id,
            state: SessionState::LoggedOut,
            account: None,
            character: None,
            prompt: None,
            closing: false,
            game,
            registry: Arc::new(commands::registry_for(SessionState::LoggedOut)),
            out,
        }
    }

    pub fn registry(&self) -> Arc<CommandRegistry<Session>> {
        self.registry.clone()
    }

    /// Switch state and rebuild the command table for it.
    pub fn enter(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!(session_id = ?self.id, from = ?self.state, to = ?state, "State change");
        }
        self.state = state;
        self.registry = Arc::new(commands::registry_for(state));
    }

    pub fn send(&self, packet: Packet) -> Result<(), CommandError> {
        self.out
            .send(Outbound::new(packet))
            .map_err(|_| CommandError::Disconnected)
    }

    pub fn send_text(&self, message: impl Into<String>) -> Result<(), CommandError> {
        self.send(Packet::text(message))
    }

    /// Queue the last packet of the connection. The writer flushes it and
    /// shuts the socket; the worker stops reading.
    pub fn close_with(&mut self, packet: Packet) -> Result<(), CommandError> {
        self.closing = true;
        self.out
            .send(Outbound::with_close(packet))
            .map_err(|_| CommandError::Disconnected)
    }

    /// The character this session is playing, as stored on its account.
    pub fn playing_character(&self) -> Option<&PlayerCharacter> {
        let name = self.character.as_deref()?;
        self.account.as_ref()?.character(name)
    }

    /// Run a gateway call on the blocking pool.
    pub async fn gateway<T, F>(&self, f: F) -> Result<T, CommandError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn AccountGateway) -> Result<T, PlayerDbError> + Send + 'static,
    {
        let gateway = self.game.gateway.clone();
        Ok(tokio::task::spawn_blocking(move || f(gateway.as_ref())).await??)
    }

    /// Take the played character out of its room, tell the room, record the
    /// room on the character and drop back to LoggedIn.
    pub async fn leave_world(&mut self) {
        let Some(name) = self.character.take() else {
            return;
        };

        let room_name = {
            let mut world = self.game.world.write().await;
            match world.remove_character(&name) {
                Some((key, _)) => {
                    let room = world.get_room(&key);
                    let occupants = room.map(|r| r.occupant_sessions()).unwrap_or_default();
                    let room_name = room.map(|r| r.name.clone());
                    self.game
                        .router
                        .broadcast_room(
                            occupants,
                            self.id,
                            Packet::text(format!("{name} has left.")),
                        )
                        .await;
                    room_name
                }
                None => None,
            }
        };

        self.game.sessions.write().await.release_character(self.id);
        if let Some(pc) = self.account.as_mut().and_then(|a| a.character_mut(&name)) {
            if room_name.is_some() {
                pc.last_room = room_name;
            }
        }
        if self.state == SessionState::Playing {
            self.enter(SessionState::LoggedIn);
        }
    }

    /// Record the played character's room and save the account. A failed
    /// save is logged and play goes on.
    pub async fn record_room(&mut self, room_name: &str) {
        let Some(name) = self.character.clone() else {
            return;
        };
        let Some(account) = self.account.as_mut() else {
            return;
        };
        if let Some(pc) = account.character_mut(&name) {
            pc.last_room = Some(room_name.to_string());
        }
        let snapshot = account.clone();
        if let Err(e) = self.gateway(move |gw| gw.save(&snapshot)).await {
            tracing::warn!(
                session_id = ?self.id,
                character = %name,
                error = %e,
                "Progress save failed"
            );
        }
    }

    /// Leave the world and persist the account. Safe to call twice; the
    /// second call finds nothing to do.
    pub async fn finish(&mut self) {
        self.leave_world().await;
        let Some(account) = self.account.take() else {
            return;
        };
        let name = account.name.clone();
        match self.gateway(move |gw| gw.save(&account)).await {
            Ok(()) => tracing::info!(session_id = ?self.id, account = %name, "Account saved"),
            Err(e) => tracing::error!(
                session_id = ?self.id,
                account = %name,
                error = %e,
                "Account save failed"
            ),
        }
    }
}
