//! World content described as JSON and built into a `World`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use space::{Actor, Conversation, Exit, Item, Room, Visibility, World, WorldError};
use thiserror::Error;

const SAMPLE_WORLD: &str = include_str!("../content/sample_world.json");

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("content parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error("exit {exit} in {room} leads to unknown room {to}")]
    DanglingExit { room: String, exit: String, to: String },

    #[error("starting room {0} is not defined")]
    MissingStart(String),
}

#[derive(Debug, Deserialize)]
pub struct WorldDef {
    pub starting_room: String,
    pub rooms: Vec<RoomDef>,
}

#[derive(Debug, Deserialize)]
pub struct RoomDef {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub actors: Vec<ActorDef>,
    #[serde(default)]
    pub exits: Vec<ExitDef>,
}

#[derive(Debug, Deserialize)]
pub struct ItemDef {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Deserialize)]
pub struct ActorDef {
    pub name: String,
    pub description: String,
    /// Reply when no known topic is asked about.
    pub default: Option<String>,
    #[serde(default)]
    pub topics: BTreeMap<String, String>,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Deserialize)]
pub struct ExitDef {
    pub name: String,
    pub description: String,
    /// Destination room name. Absent means the exit is broken.
    pub to: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl WorldDef {
    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, ContentError> {
        let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Build a world named `name`. Every exit destination and the starting
    /// room must be among the defined rooms.
    pub fn build(&self, name: &str) -> Result<World, ContentError> {
        let mut world = World::new(name);

        for def in &self.rooms {
            let mut room = Room::new(def.name.clone(), def.description.clone());
            for item in &def.items {
                room.add_item(
                    Item::new(item.name.clone(), item.description.clone())
                        .with_visibility(item.visibility),
                );
            }
            for actor in &def.actors {
                let mut conversation = Conversation::default();
                if let Some(reply) = &actor.default {
                    conversation.set_default(reply.clone());
                }
                for (topic, reply) in &actor.topics {
                    conversation.add_topic(topic, reply.clone());
                }
                let mut npc = Actor::new(actor.name.clone(), actor.description.clone())
                    .with_conversation(conversation);
                npc.visibility = actor.visibility;
                room.add_actor(npc);
            }
            for exit in &def.exits {
                let mut built = match &exit.to {
                    Some(to) => Exit::new(exit.name.clone(), exit.description.clone(), to.clone()),
                    None => Exit::broken(exit.name.clone(), exit.description.clone()),
                };
                built.visibility = exit.visibility;
                room.add_exit(built);
            }
            world.add_room(room)?;
        }

        for def in &self.rooms {
            for exit in &def.exits {
                if let Some(to) = &exit.to {
                    if !world.room_exists(to) {
                        return Err(ContentError::DanglingExit {
                            room: def.name.clone(),
                            exit: exit.name.clone(),
                            to: to.clone(),
                        });
                    }
                }
            }
        }

        let start = world
            .get_room(&self.starting_room)
            .cloned()
            .ok_or_else(|| ContentError::MissingStart(self.starting_room.clone()))?;
        world.set_starting_room(start);

        tracing::debug!(world = %name, rooms = world.room_count(), "World content built");
        Ok(world)
    }
}

/// The built-in sample world under the given name.
pub fn sample_world(name: &str) -> Result<World, ContentError> {
    WorldDef::from_json(SAMPLE_WORLD)?.build(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use session::SessionId;
    use space::{CharacterPresence, MoveOutcome};

    #[test]
    fn sample_world_has_four_rooms_and_starts_in_abyss() {
        let world = sample_world("sample").unwrap();
        assert_eq!(world.name, "sample");
        assert_eq!(world.room_count(), 4);
        assert_eq!(world.starting_room().unwrap().name, "The Abyss");
        for room in ["Garden", "hallway", "SIEMENS HALL 120", "The Abyss"] {
            assert!(world.room_exists(room), "missing {room}");
        }
    }

    #[test]
    fn sample_actors_answer_topics() {
        let world = sample_world("sample").unwrap();
        let garden = world.get_room("Garden").unwrap();
        let rat = garden.actor("nicodemus").unwrap();
        assert_eq!(
            rat.conversation.respond("rose bush"),
            "It is where I and those others who escaped NIHM have come to live."
        );
        assert_eq!(rat.conversation.respond("weather"), "Courage of the heart is very rare.");
        assert_eq!(rat.conversation.respond("advice"), "Don't feed the Beasties!");
    }

    #[test]
    fn garden_description() {
        let world = sample_world("sample").unwrap();
        assert_eq!(
            world.get_room("Garden").unwrap().describe("nobody"),
            "A lush and fragrant garden.... It contains Apple Tree, Fountain, Rose Bush. \
             Also here is Nicodemus, Snake, WhiteRabbit. Obvious exits are Gate, Rabbit Hole."
        );
    }

    #[test]
    fn vortex_loops_back() {
        let mut world = sample_world("sample").unwrap();
        world
            .enter(CharacterPresence::new("Aria", "Aria.", SessionId(1)), "The Abyss")
            .unwrap();
        assert_eq!(
            world.traverse("Aria", "a vortex").unwrap(),
            MoveOutcome::Stayed { room: "the abyss".into() }
        );
    }

    #[test]
    fn dangling_exit_rejected() {
        let def = WorldDef::from_json(
            r#"{"starting_room":"A","rooms":[{"name":"A","description":"a",
                "exits":[{"name":"Out","description":"o","to":"Nowhere"}]}]}"#,
        )
        .unwrap();
        assert!(matches!(def.build("w"), Err(ContentError::DanglingExit { .. })));
    }

    #[test]
    fn missing_start_rejected() {
        let def =
            WorldDef::from_json(r#"{"starting_room":"B","rooms":[{"name":"A","description":"a"}]}"#)
                .unwrap();
        assert!(matches!(def.build("w"), Err(ContentError::MissingStart(_))));
    }
}
