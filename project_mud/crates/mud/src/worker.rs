use std::time::Instant;

use net::{outbound_channel, spawn_writer, FrameBuffer, OutboundRx, Packet, DEFAULT_MAX_LINE_LEN};
use observability::{ConnectionMetrics, SessionEnd};
use session::{shutdown_channel, SessionId, SessionState, ShutdownRx};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::commands::logged_in::continue_creation;
use crate::context::{GameContext, Session};
use crate::error::{CommandError, DispatchError};

pub const SHUTDOWN_NOTICE: &str = "The server has been shut down.";

/// One connection's worker: reads framed input, runs it through the
/// session's current command table, and cleans up when the connection ends.
pub struct SessionWorker {
    session: Session,
    outbound: OutboundRx,
    shutdown: ShutdownRx,
    max_line_len: usize,
}

impl SessionWorker {
    /// Create the session and add it to the live registry. Registration
    /// happens before the worker is spawned so a shutdown signalled right
    /// after accept still reaches it.
    pub async fn register(session_id: SessionId, game: GameContext) -> Self {
        let (tx, outbound) = outbound_channel();
        let (shutdown_tx, shutdown) = shutdown_channel();
        game.sessions
            .write()
            .await
            .register(session_id, tx.clone(), shutdown_tx);
        Self {
            session: Session::new(session_id, tx, game),
            outbound,
            shutdown,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    pub fn session_id(&self) -> SessionId {
        self.session.id
    }

    /// Serve the connection until it closes, the session logs out or is
    /// kicked, or shutdown is signalled.
    pub async fn run<S>(self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let Self {
            mut session,
            outbound,
            mut shutdown,
            max_line_len,
        } = self;
        let session_id = session.id;
        let started = Instant::now();
        let mut metrics = ConnectionMetrics::new(session_id.0);

        let (mut reader, write_half) = tokio::io::split(stream);
        let writer = spawn_writer(write_half, outbound);

        let mut frames = FrameBuffer::with_max_len(max_line_len);
        let mut buf = vec![0u8; 4096];

        metrics.end = 'session: loop {
            let n = tokio::select! {
                _ = shutdown.wait() => {
                    let _ = session.close_with(Packet::disconnect(SHUTDOWN_NOTICE));
                    break 'session SessionEnd::Shutdown;
                }
                read = reader.read(&mut buf) => match read {
                    Ok(0) => break 'session SessionEnd::Closed,
                    Ok(n) => n,
                    Err(e) => {
                        tracing::debug!(?session_id, error = %e, "Read failed");
                        break 'session SessionEnd::IoError;
                    }
                },
            };

            for packet in frames.feed(&buf[..n]) {
                metrics.commands += 1;
                match handle_line(&mut session, &packet.message).await {
                    Ok(()) => {}
                    Err(CommandError::Disconnected) => break 'session SessionEnd::IoError,
                    Err(e) => tracing::warn!(?session_id, error = %e, "Command failed"),
                }
                if session.closing {
                    break 'session if session.state == SessionState::LoggedOut {
                        SessionEnd::Kicked
                    } else {
                        SessionEnd::Closed
                    };
                }
            }
        };

        metrics.account = session
            .game
            .sessions
            .read()
            .await
            .get(session_id)
            .and_then(|s| s.account.clone());

        // Account save and room exit come before deregistration so the
        // account stays claimed until it is on disk.
        session.prompt = None;
        session.finish().await;
        let game = session.game.clone();
        game.sessions.write().await.deregister(session_id);
        drop(session);

        if writer.await.is_err() {
            tracing::debug!(?session_id, "Writer task panicked");
        }

        metrics.duration_ms = started.elapsed().as_millis();
        metrics.log();
    }
}

/// Route one input line to the active prompt or the command table.
pub async fn handle_line(session: &mut Session, line: &str) -> Result<(), CommandError> {
    if session.prompt.is_some() {
        return continue_creation(session, line).await;
    }

    let registry = session.registry();
    match registry.dispatch(session, line).await {
        Ok(()) => Ok(()),
        Err(DispatchError::Command(e)) => Err(e),
        Err(other) => match other.reply() {
            Some(text) => session.send_text(text),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use net::{decode_line, Directive};
    use player_db::SqliteGateway;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    use super::*;
    use crate::content::sample_world;

    fn game() -> GameContext {
        let gateway = Arc::new(SqliteGateway::open_memory().unwrap());
        GameContext::new(sample_world("sample").unwrap(), gateway)
    }

    async fn connect(
        game: &GameContext,
        id: u64,
    ) -> (BufReader<DuplexStream>, tokio::task::JoinHandle<()>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let worker = SessionWorker::register(SessionId(id), game.clone()).await;
        let handle = tokio::spawn(worker.run(server));
        (BufReader::new(client), handle)
    }

    async fn send(client: &mut BufReader<DuplexStream>, line: &str) {
        client.get_mut().write_all(format!("{line}\n").as_bytes()).await.unwrap();
    }

    async fn recv(client: &mut BufReader<DuplexStream>) -> Packet {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), client.read_line(&mut line))
            .await
            .expect("timed out")
            .unwrap();
        decode_line(line.trim_end())
    }

    #[tokio::test]
    async fn unknown_and_empty_input() {
        let game = game();
        let (mut client, _h) = connect(&game, 1).await;

        send(&mut client, "dance").await;
        assert_eq!(recv(&mut client).await.message, "I don't know what 'dance' means.");

        send(&mut client, "").await;
        assert_eq!(recv(&mut client).await.message, "You'll have to speak up!");
    }

    #[tokio::test]
    async fn json_and_plain_lines_both_dispatch() {
        let game = game();
        let (mut client, _h) = connect(&game, 1).await;

        send(&mut client, r#"{"message":"login","directive":"MESSAGE"}"#).await;
        assert_eq!(
            recv(&mut client).await.message,
            "Proper usage is 'login [account name] [password]'."
        );
    }

    #[tokio::test]
    async fn clear_resends_welcome_with_clear_log() {
        let game = game();
        let (mut client, _h) = connect(&game, 1).await;
        send(&mut client, "create_account ann pw").await;
        assert_eq!(recv(&mut client).await.directive, Directive::ServCreateAccount);
        recv(&mut client).await;

        send(&mut client, "clear").await;
        let packet = recv(&mut client).await;
        assert_eq!(packet.directive, Directive::ClearLog);
        assert!(packet.message.starts_with("Welcome to the account lobby!"));
    }

    #[tokio::test]
    async fn create_prompt_then_play() {
        let game = game();
        let (mut client, _h) = connect(&game, 1).await;
        send(&mut client, "create_account ann pw").await;
        recv(&mut client).await;
        recv(&mut client).await;

        send(&mut client, "characters").await;
        assert_eq!(recv(&mut client).await.message, "You have no characters.");

        send(&mut client, "create").await;
        assert_eq!(recv(&mut client).await.directive, Directive::Prompt);
        recv(&mut client).await;
        for line in ["Aria", "Elf", "female", "Wizard", "tall and wise"] {
            send(&mut client, line).await;
            assert_eq!(recv(&mut client).await.directive, Directive::Prompt);
        }
        send(&mut client, "yes").await;
        assert_eq!(recv(&mut client).await.message, "Aria was created successfully.");

        send(&mut client, "characters").await;
        assert_eq!(
            recv(&mut client).await.message,
            "Your characters are: \n    Aria is a level 1 Elf Wizard. She looks tall and wise."
        );

        send(&mut client, "play aria").await;
        assert_eq!(recv(&mut client).await.message, crate::commands::playing::WELCOME);
        assert_eq!(recv(&mut client).await.message, "You have entered The Abyss.");
        assert!(recv(&mut client)
            .await
            .message
            .starts_with("You seem to be floating"));

        let world = game.world.read().await;
        assert_eq!(world.character_room("Aria"), Some("the abyss"));
    }

    #[tokio::test]
    async fn disconnect_removes_character_and_session() {
        let game = game();
        let (mut client, handle) = connect(&game, 1).await;
        send(&mut client, "create_account ann pw").await;
        recv(&mut client).await;
        recv(&mut client).await;
        send(&mut client, "create").await;
        for line in ["Aria", "Elf", "female", "Wizard", "tall", "yes"] {
            send(&mut client, line).await;
        }
        send(&mut client, "play Aria").await;
        send(&mut client, "go a door").await;
        send(&mut client, "look").await;

        // Wait until the last command has been answered.
        loop {
            let packet = recv(&mut client).await;
            if packet.message.starts_with("A class room in shambles") {
                break;
            }
        }

        drop(client);
        handle.await.unwrap();

        assert!(game.sessions.read().await.is_empty());
        let world = game.world.read().await;
        assert_eq!(world.character_room("Aria"), None);
        assert!(!world.get_room("Siemens Hall 120").unwrap().has_character("Aria"));

        let saved = game.gateway.load("ann").unwrap();
        assert_eq!(
            saved.character("aria").unwrap().last_room.as_deref(),
            Some("Siemens Hall 120")
        );
    }

    #[tokio::test]
    async fn moving_saves_last_room_while_playing() {
        let game = game();
        let (mut client, _handle) = connect(&game, 1).await;
        send(&mut client, "create_account ann pw").await;
        send(&mut client, "create").await;
        for line in ["Aria", "Elf", "female", "Wizard", "tall", "yes"] {
            send(&mut client, line).await;
        }
        send(&mut client, "play Aria").await;
        send(&mut client, "go a door").await;
        // Commands run in order, so once this answer arrives the move has been saved.
        send(&mut client, "...").await;
        loop {
            let packet = recv(&mut client).await;
            if packet.message.starts_with("You're looking pretty tough") {
                break;
            }
        }

        assert!(game.sessions.read().await.account_holder("ann").is_some());
        let saved = game.gateway.load("ann").unwrap();
        assert_eq!(
            saved.character("aria").unwrap().last_room.as_deref(),
            Some("Siemens Hall 120")
        );
    }

    #[tokio::test]
    async fn shutdown_signal_sends_notice() {
        let game = game();
        let (mut client, handle) = connect(&game, 1).await;

        game.sessions.read().await.signal_shutdown_all();
        let packet = recv(&mut client).await;
        assert_eq!(packet, Packet::disconnect(SHUTDOWN_NOTICE));
        handle.await.unwrap();
        assert!(game.sessions.read().await.is_empty());
    }
}
