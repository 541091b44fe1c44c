#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mud::{Acceptor, GameContext, ServerError, WorldDef};
use net::{decode_line, Directive, Packet};
use player_db::SqliteGateway;
use session::{shutdown_channel, ShutdownTx};
use space::World;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// Garden with a gate to the hallway, used by the movement scenarios.
pub const GARDEN_WORLD: &str = r#"{
  "starting_room": "Garden",
  "rooms": [
    {
      "name": "Garden",
      "description": "A lush and fragrant garden....",
      "items": [{ "name": "Fountain", "description": "Drink from it." }],
      "actors": [{
        "name": "Snake",
        "description": "Smooth and slithery.",
        "default": "Wouldn't you like to eat one of these delicious apples?",
        "topics": { "apples": "They are very ripe." }
      }],
      "exits": [
        { "name": "Gate", "description": "A towering gate.", "to": "Hallway" },
        { "name": "Loop", "description": "A path in a circle.", "to": "Garden" },
        { "name": "Crack", "description": "A crack in the wall." }
      ]
    },
    {
      "name": "Hallway",
      "description": "A barren hallway.",
      "exits": [{ "name": "Gate", "description": "Back outside.", "to": "Garden" }]
    }
  ]
}"#;

pub struct TestServer {
    pub addr: SocketAddr,
    pub game: GameContext,
    pub shutdown: ShutdownTx,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

pub async fn start_server() -> TestServer {
    let world = WorldDef::from_json(GARDEN_WORLD).unwrap().build("test").unwrap();
    start_with(Acceptor::bind("127.0.0.1:0", game(world)).await.unwrap()).await
}

pub fn game(world: World) -> GameContext {
    let gateway = Arc::new(SqliteGateway::open_memory().unwrap());
    GameContext::new(world, gateway)
}

pub async fn start_with(acceptor: Acceptor) -> TestServer {
    let addr = acceptor.local_addr().unwrap();
    let (shutdown, rx) = shutdown_channel();
    let game = acceptor.game().clone();
    let handle = tokio::spawn(acceptor.run(rx));
    TestServer {
        addr,
        game,
        shutdown,
        handle,
    }
}

/// Poll until every worker has deregistered.
pub async fn wait_until_no_sessions(server: &TestServer) {
    for _ in 0..100 {
        if server.game.sessions.read().await.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("sessions were never released");
}

pub struct Client {
    stream: BufReader<TcpStream>,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self {
            stream: BufReader::new(stream),
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.stream
            .get_mut()
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
    }

    /// Next packet, or `None` once the server has closed the connection.
    pub async fn recv(&mut self) -> Option<Packet> {
        let mut line = String::new();
        let n = tokio::time::timeout(Duration::from_secs(5), self.stream.read_line(&mut line))
            .await
            .expect("timed out waiting for the server")
            .unwrap_or(0);
        if n == 0 {
            return None;
        }
        Some(decode_line(line.trim_end()))
    }

    pub async fn expect(&mut self) -> Packet {
        self.recv().await.expect("connection closed")
    }

    pub async fn expect_text(&mut self) -> String {
        self.expect().await.message
    }

    /// Read until a packet whose text starts with `prefix`.
    pub async fn skip_until(&mut self, prefix: &str) -> Packet {
        loop {
            let packet = self.expect().await;
            if packet.message.starts_with(prefix) {
                return packet;
            }
        }
    }

    pub async fn expect_closed(&mut self) {
        assert_eq!(self.recv().await, None);
    }
}

/// Create an account and log it in on a fresh connection.
pub async fn new_account(addr: SocketAddr, name: &str) -> Client {
    let mut client = Client::connect(addr).await;
    client.send(&format!("create_account {name} secret")).await;
    let ack = client.expect().await;
    assert_eq!(ack.directive, Directive::ServCreateAccount);
    client.skip_until("Welcome to the account lobby!").await;
    client
}

/// Run the creation prompt for a character and enter the world with it.
pub async fn create_and_play(client: &mut Client, character: &str) {
    client.send("create").await;
    for line in [character, "Human", "male", "Warrior", "brave"] {
        client.send(line).await;
    }
    client.send("yes").await;
    client
        .skip_until(&format!("{character} was created successfully."))
        .await;
    client.send(&format!("play {character}")).await;
    client.skip_until("You have entered").await;
    client.expect().await;
}
