use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use net::DEFAULT_MAX_LINE_LEN;
use persistence::WorldStore;
use session::{SessionId, ShutdownRx};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::context::GameContext;
use crate::error::ServerError;
use crate::worker::SessionWorker;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Accepts connections and owns the join handles of their workers.
pub struct Acceptor {
    listener: TcpListener,
    game: GameContext,
    store: Option<WorldStore>,
    max_line_len: usize,
}

impl Acceptor {
    pub async fn bind(addr: &str, game: GameContext) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "Listening");
        Ok(Self {
            listener,
            game,
            store: None,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        })
    }

    /// Save the world here once every session has stopped.
    pub fn with_world_store(mut self, store: WorldStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    pub fn game(&self) -> &GameContext {
        &self.game
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept until `shutdown` fires or accept fails, then stop every
    /// session, save the world and release the socket.
    pub async fn run(self, mut shutdown: ShutdownRx) -> Result<(), ServerError> {
        let mut workers: Vec<(SessionId, JoinHandle<()>)> = Vec::new();

        let outcome = loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    tracing::info!("Acceptor stopping");
                    break Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        let session_id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
                        tracing::info!(?session_id, %peer_addr, "New connection");

                        let worker = SessionWorker::register(session_id, self.game.clone())
                            .await
                            .with_max_line_len(self.max_line_len);
                        workers.retain(|(_, handle)| !handle.is_finished());
                        workers.push((session_id, tokio::spawn(worker.run(stream))));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Accept failed");
                        break Err(ServerError::from(e));
                    }
                },
            }
        };

        self.stop_sessions(workers).await;
        self.save_world().await;
        drop(self.listener);
        outcome
    }

    async fn stop_sessions(&self, workers: Vec<(SessionId, JoinHandle<()>)>) {
        self.game.sessions.read().await.signal_shutdown_all();
        let count = workers.len();
        for (session_id, handle) in workers {
            if let Err(e) = handle.await {
                tracing::warn!(?session_id, error = %e, "Session worker failed");
            }
            self.game.sessions.write().await.deregister(session_id);
        }
        tracing::info!(sessions = count, "All sessions stopped");
    }

    async fn save_world(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let world = self.game.world.read().await;
        match store.save(&world) {
            Ok(path) => tracing::info!(path = %path.display(), "World saved"),
            Err(e) => tracing::error!(world = %world.name, error = %e, "World save failed"),
        }
    }
}
