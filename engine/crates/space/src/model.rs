use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use session::SessionId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("That is not an exit.")]
    ExitNotFound,

    #[error("That exit appears to be broken.")]
    ExitBroken,

    #[error("room {0} does not exist")]
    RoomNotFound(String),

    #[error("{name} is not in room {room}")]
    NotPresent { name: String, room: String },

    #[error("character {0} is not in any room")]
    CharacterNotInRoom(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("room already exists: {0}")]
    RoomExists(String),

    #[error("room {0} does not exist")]
    RoomNotFound(String),
}

/// How hard something is to notice. Only tiers above `Invisible` ever show
/// up in a room description.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Visibility {
    Invisible,
    VeryWellHidden,
    WellHidden,
    Hidden,
    SlightlyHidden,
    #[default]
    Visible,
    Obvious,
}

/// Something that can be listed in a room description.
pub trait Visible {
    fn name(&self) -> &str;
    fn visibility(&self) -> Visibility;

    fn is_visible(&self) -> bool {
        self.visibility() > Visibility::Invisible
    }
}

/// Something that answers when talked to.
pub trait Conversant {
    fn respond(&self, topic: &str) -> &str;
}

/// Topic → reply table with a `default` fallback. Topics are stored and
/// looked up lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    topics: BTreeMap<String, String>,
}

impl Conversation {
    pub const DEFAULT_TOPIC: &'static str = "default";

    /// A conversation with only the given default reply.
    pub fn with_default(reply: impl Into<String>) -> Self {
        let mut topics = BTreeMap::new();
        topics.insert(Self::DEFAULT_TOPIC.to_string(), reply.into());
        Self { topics }
    }

    pub fn set_default(&mut self, reply: impl Into<String>) {
        self.add_topic(Self::DEFAULT_TOPIC, reply);
    }

    pub fn add_topic(&mut self, topic: &str, reply: impl Into<String>) {
        self.topics.insert(topic.to_lowercase(), reply.into());
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    pub fn respond(&self, topic: &str) -> &str {
        self.topics
            .get(&topic.to_lowercase())
            .or_else(|| self.topics.get(Self::DEFAULT_TOPIC))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl Default for Conversation {
    fn default() -> Self {
        let mut convo =
            Self::with_default("Hello! Would you like some Advice? Or perhaps you'd like to hear a Joke?");
        convo.add_topic("advice", "Don't feed the Beasties!");
        convo.add_topic(
            "joke",
            "What did Steve Jobs order at the Drive-Through? A BigMac!",
        );
        convo.add_topic("beasties", "If you meet Beastie, you do like we do: you run.");
        convo
    }
}

/// A plain object lying in a room or carried in an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
}

impl Item {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            visibility: Visibility::default(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

impl Visible for Item {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

pub const INVENTORY_CAPACITY: usize = 20;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("inventory is full ({capacity} items)")]
pub struct InventoryFull {
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    capacity: usize,
    items: BTreeMap<String, Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::with_capacity(INVENTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            items: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, item: Item) -> Result<(), InventoryFull> {
        let key = item.name.to_lowercase();
        if !self.items.contains_key(&key) && self.items.len() >= self.capacity {
            return Err(InventoryFull {
                capacity: self.capacity,
            });
        }
        self.items.insert(key, item);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Item> {
        self.items.remove(&name.to_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

/// Capabilities shared by non-player actors and player characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
    pub conversation: Conversation,
    pub inventory: Inventory,
}

impl Actor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            visibility: Visibility::default(),
            conversation: Conversation::default(),
            inventory: Inventory::new(),
        }
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }
}

impl Visible for Actor {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

impl Conversant for Actor {
    fn respond(&self, topic: &str) -> &str {
        self.conversation.respond(topic)
    }
}

/// A one-way edge to another room, named by the destination's room name.
/// An exit without a destination is broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
    pub destination: Option<String>,
}

impl Exit {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            visibility: Visibility::default(),
            destination: Some(destination.into()),
        }
    }

    pub fn broken(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            visibility: Visibility::default(),
            destination: None,
        }
    }
}

impl Visible for Exit {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

/// A player character as seen by a room: enough to list it, describe it
/// to onlookers, and reach its session for broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterPresence {
    pub name: String,
    /// What `look <name>` shows other players.
    pub summary: String,
    pub visibility: Visibility,
    pub session_id: SessionId,
}

impl CharacterPresence {
    pub fn new(name: impl Into<String>, summary: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            visibility: Visibility::default(),
            session_id,
        }
    }
}

impl Visible for CharacterPresence {
    fn name(&self) -> &str {
        &self.name
    }

    fn visibility(&self) -> Visibility {
        self.visibility
    }
}
