use std::net::SocketAddr;
use std::sync::Arc;

use mud::{sample_world, Acceptor, GameContext, ServerError};
use persistence::WorldStore;
use player_db::AccountGateway;
use session::ShutdownTx;
use space::World;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;

const HELP: [(&str, &str); 5] = [
    ("create", "Create a new game world file. Proper usage is 'create [worldname]'."),
    ("exit", "Save the server state and shutdown."),
    ("help", "Display a list of server commands."),
    ("list", "List all game world files."),
    ("load", "Load an existing game world file. Proper usage is 'load [filename]'."),
];

/// What the console loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Continue(Vec<String>),
    Exit,
}

struct RunningServer {
    addr: SocketAddr,
    handle: JoinHandle<Result<(), ServerError>>,
}

/// Operator console. Brings a world online and starts the acceptor; the
/// server only listens once a world is loaded.
pub struct Console {
    config: ServerConfig,
    store: WorldStore,
    gateway: Arc<dyn AccountGateway>,
    shutdown: ShutdownTx,
    server: Option<RunningServer>,
}

impl Console {
    pub fn new(
        config: ServerConfig,
        gateway: Arc<dyn AccountGateway>,
        shutdown: ShutdownTx,
    ) -> Self {
        Self {
            store: WorldStore::new(&config.world.worlds_dir),
            config,
            gateway,
            shutdown,
            server: None,
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(|s| s.addr)
    }

    /// Load the configured default world, creating it from the sample
    /// content first if no save exists yet.
    pub async fn autoload(&mut self) -> Vec<String> {
        let name = self.config.world.default_world.clone();
        let mut lines = Vec::new();
        if !self.store.exists(&name) {
            lines.extend(self.create(&name));
        }
        lines.extend(self.load(&name).await);
        lines
    }

    pub async fn execute(&mut self, line: &str) -> ConsoleOutcome {
        let line = line.trim();
        let (command, params) = match line.split_once(' ') {
            Some((c, p)) => (c.to_lowercase(), p.trim()),
            None => (line.to_lowercase(), ""),
        };

        let lines = match command.as_str() {
            "" => Vec::new(),
            "help" => HELP
                .iter()
                .map(|(kw, desc)| format!("    {kw} => {desc}"))
                .collect(),
            "load" if params.is_empty() => vec!["Please specify a filename to load.".to_string()],
            "load" => self.load(params).await,
            "create" if params.is_empty() => {
                vec!["Please specify the name of the world to create.".to_string()]
            }
            "create" => self.create(params),
            "list" => self.list(),
            "exit" => return ConsoleOutcome::Exit,
            _ => vec!["Command not recognized.".to_string()],
        };
        ConsoleOutcome::Continue(lines)
    }

    fn list(&self) -> Vec<String> {
        match self.store.list() {
            Ok(files) if files.is_empty() => vec![
                "No world files found, you can create a new world with the 'create [world name]' command."
                    .to_string(),
            ],
            Ok(files) => {
                let mut lines = vec!["Listing world files:".to_string()];
                lines.extend(files.into_iter().map(|f| format!("    {f}")));
                lines
            }
            Err(e) => {
                tracing::warn!(error = %e, "Listing worlds failed");
                vec![format!("Could not list world files: {e}")]
            }
        }
    }

    fn create(&self, name: &str) -> Vec<String> {
        if self.store.exists(name) {
            return vec!["A world with that name exists already.".to_string()];
        }
        let saved = sample_world(name)
            .map_err(|e| e.to_string())
            .and_then(|world| self.store.save(&world).map_err(|e| e.to_string()));
        match saved {
            Ok(path) => {
                let file = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(name)
                    .to_string();
                tracing::info!(world = %name, "World created");
                vec![
                    format!("Creating new world: {name}"),
                    format!("World file: {file} created."),
                    format!("Please type 'load {file}' to load the world."),
                ]
            }
            Err(e) => {
                tracing::error!(world = %name, error = %e, "World creation failed");
                vec!["World creation failed.".to_string()]
            }
        }
    }

    async fn load(&mut self, file: &str) -> Vec<String> {
        if self.server.is_some() {
            return vec!["A world is already loaded.".to_string()];
        }
        let mut lines = vec![format!("Loading world file: {file}")];
        let world = match self.store.load(file) {
            Ok(world) => world,
            Err(e) => {
                tracing::warn!(file, error = %e, "World load failed");
                lines.push(format!(
                    "Failed to load '{file}'. Please try again, or use the 'create [world name]' command to make a new world."
                ));
                return lines;
            }
        };
        match self.start(world).await {
            Ok(addr) => {
                lines.push(format!("Server now listening on {addr}."));
                lines.push("Type 'help' to see a list of server commands.".to_string());
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not start listening");
                lines.push(format!("Could not start the server: {e}"));
            }
        }
        lines
    }

    async fn start(&mut self, world: World) -> Result<SocketAddr, ServerError> {
        let game = GameContext::new(world, self.gateway.clone());
        let acceptor = Acceptor::bind(&self.config.net.bind_addr, game)
            .await?
            .with_max_line_len(self.config.net.max_line_len)
            .with_world_store(WorldStore::new(&self.config.world.worlds_dir));
        let addr = acceptor.local_addr()?;
        let handle = tokio::spawn(acceptor.run(self.shutdown.subscribe()));
        self.server = Some(RunningServer { addr, handle });
        Ok(addr)
    }

    /// Stop the acceptor and wait until every session has been saved and
    /// the world written out.
    pub async fn shutdown(self) {
        self.shutdown.trigger();
        let Some(server) = self.server else {
            return;
        };
        match server.handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Acceptor ended with an error"),
            Err(e) => tracing::error!(error = %e, "Acceptor task failed"),
        }
    }
}
