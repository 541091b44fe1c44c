use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{CharacterPresence, MoveError, WorldError};
use crate::room::Room;

/// Result of walking a character through an exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The character left `from` and is now in `to` (room keys).
    Moved { from: String, to: String },
    /// The exit loops back; membership is unchanged.
    Stayed { room: String },
}

/// Registry of rooms keyed by lower-cased name, plus the room new
/// characters start in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub name: String,
    rooms: BTreeMap<String, Room>,
    starting_room: Option<String>,
    /// Character key → room key. Rebuilt from nothing after a load since
    /// characters are never persisted.
    #[serde(skip)]
    character_rooms: BTreeMap<String, String>,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn get_room(&self, name: &str) -> Option<&Room> {
        self.rooms.get(&name.to_lowercase())
    }

    pub fn room_exists(&self, name: &str) -> bool {
        self.rooms.contains_key(&name.to_lowercase())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Add a room. Fails without touching the world if the name is taken.
    pub fn add_room(&mut self, room: Room) -> Result<(), WorldError> {
        let key = room.key();
        if self.rooms.contains_key(&key) {
            return Err(WorldError::RoomExists(room.name));
        }
        self.rooms.insert(key, room);
        Ok(())
    }

    /// Remove a room. Characters standing in it lose their placement.
    pub fn remove_room(&mut self, name: &str) -> Option<Room> {
        let key = name.to_lowercase();
        let room = self.rooms.remove(&key)?;
        self.character_rooms.retain(|_, r| *r != key);
        if self.starting_room.as_deref() == Some(key.as_str()) {
            self.starting_room = None;
        }
        Some(room)
    }

    /// Designate the starting room, inserting it if it is new.
    pub fn set_starting_room(&mut self, room: Room) {
        let key = room.key();
        self.rooms.entry(key.clone()).or_insert(room);
        self.starting_room = Some(key);
    }

    pub fn starting_room(&self) -> Option<&Room> {
        self.starting_room
            .as_deref()
            .and_then(|key| self.rooms.get(key))
    }

    /// Room key of the room a character currently occupies.
    pub fn character_room(&self, character: &str) -> Option<&str> {
        self.character_rooms
            .get(&character.to_lowercase())
            .map(String::as_str)
    }

    /// Move an item between rooms.
    pub fn move_item(&mut self, name: &str, from: &str, to: &str) -> Result<(), MoveError> {
        self.ensure_room(to)?;
        let item = self
            .room_mut_or_err(from)?
            .remove_item(name)
            .ok_or_else(|| not_present(name, from))?;
        self.room_mut_or_err(to)?.add_item(item);
        Ok(())
    }

    /// Move a non-player actor between rooms.
    pub fn move_actor(&mut self, name: &str, from: &str, to: &str) -> Result<(), MoveError> {
        self.ensure_room(to)?;
        let actor = self
            .room_mut_or_err(from)?
            .remove_actor(name)
            .ok_or_else(|| not_present(name, from))?;
        self.room_mut_or_err(to)?.add_actor(actor);
        Ok(())
    }

    /// Re-home an exit onto another room.
    pub fn move_exit(&mut self, name: &str, from: &str, to: &str) -> Result<(), MoveError> {
        self.ensure_room(to)?;
        let exit = self
            .room_mut_or_err(from)?
            .remove_exit(name)
            .ok_or_else(|| not_present(name, from))?;
        self.room_mut_or_err(to)?.add_exit(exit);
        Ok(())
    }

    /// Move a character between two named rooms.
    pub fn move_character(&mut self, name: &str, from: &str, to: &str) -> Result<(), MoveError> {
        self.ensure_room(to)?;
        let presence = self
            .room_mut_or_err(from)?
            .remove_character(name)
            .ok_or_else(|| not_present(name, from))?;
        self.place(presence, to)
    }

    /// Put a character into a room with no source, as on first entry.
    /// A character already placed elsewhere is taken out of that room
    /// first so it is never in two rooms at once.
    pub fn enter(&mut self, presence: CharacterPresence, to: &str) -> Result<(), MoveError> {
        self.ensure_room(to)?;
        self.remove_character(&presence.name);
        self.place(presence, to)
    }

    /// Take a character out of whatever room holds it. Returns the room key
    /// and the presence that was removed.
    pub fn remove_character(&mut self, name: &str) -> Option<(String, CharacterPresence)> {
        let room_key = self.character_rooms.remove(&name.to_lowercase())?;
        let presence = self.rooms.get_mut(&room_key)?.remove_character(name)?;
        Some((room_key, presence))
    }

    /// Walk a character through an exit of its current room.
    ///
    /// Unknown or broken exits leave everything untouched. A looping exit
    /// leaves membership unchanged.
    pub fn traverse(&mut self, character: &str, exit_name: &str) -> Result<MoveOutcome, MoveError> {
        let from = self
            .character_room(character)
            .ok_or_else(|| MoveError::CharacterNotInRoom(character.to_string()))?
            .to_string();
        let room = self
            .rooms
            .get(&from)
            .ok_or_else(|| MoveError::RoomNotFound(from.clone()))?;
        let exit = room.exit(exit_name).ok_or(MoveError::ExitNotFound)?;
        let to = match &exit.destination {
            Some(dest) if self.rooms.contains_key(&dest.to_lowercase()) => dest.to_lowercase(),
            _ => return Err(MoveError::ExitBroken),
        };

        if to == from {
            return Ok(MoveOutcome::Stayed { room: from });
        }

        self.move_character(character, &from, &to)?;
        tracing::debug!(character, from = %from, to = %to, "Character moved");
        Ok(MoveOutcome::Moved { from, to })
    }

    fn place(&mut self, presence: CharacterPresence, to: &str) -> Result<(), MoveError> {
        let key = to.to_lowercase();
        let character_key = presence.name.to_lowercase();
        self.room_mut_or_err(&key)?.add_character(presence);
        self.character_rooms.insert(character_key, key);
        Ok(())
    }

    fn ensure_room(&self, name: &str) -> Result<(), MoveError> {
        if self.room_exists(name) {
            Ok(())
        } else {
            Err(MoveError::RoomNotFound(name.to_string()))
        }
    }

    fn room_mut_or_err(&mut self, name: &str) -> Result<&mut Room, MoveError> {
        self.rooms
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| MoveError::RoomNotFound(name.to_string()))
    }
}

fn not_present(name: &str, room: &str) -> MoveError {
    MoveError::NotPresent {
        name: name.to_string(),
        room: room.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Actor, Exit, Item};
    use session::SessionId;

    fn setup_world() -> World {
        let mut world = World::new("Test");
        let mut garden = Room::new("Garden", "A garden.");
        garden.add_exit(Exit::new("Gate", "A gate.", "Hallway"));
        garden.add_exit(Exit::new("Loop", "Round and round.", "Garden"));
        garden.add_exit(Exit::broken("Crack", "Leads nowhere."));
        garden.add_exit(Exit::new("Stale", "Points at nothing.", "Nowhere"));
        garden.add_item(Item::new("Fountain", "Wet."));
        garden.add_actor(Actor::new("Snake", "Slithery."));

        let mut hallway = Room::new("Hallway", "A hallway.");
        hallway.add_exit(Exit::new("Door", "A door.", "Garden"));

        world.add_room(hallway).unwrap();
        world.set_starting_room(garden);
        world
    }

    fn presence(name: &str, id: u64) -> CharacterPresence {
        CharacterPresence::new(name, format!("{name} is here."), SessionId(id))
    }

    #[test]
    fn rooms_keyed_case_insensitively() {
        let world = setup_world();
        assert!(world.room_exists("GARDEN"));
        assert_eq!(world.get_room("hallway").unwrap().name, "Hallway");
        assert_eq!(world.starting_room().unwrap().name, "Garden");
        assert_eq!(world.room_count(), 2);
    }

    #[test]
    fn add_duplicate_room_fails() {
        let mut world = setup_world();
        let err = world.add_room(Room::new("garden", "another")).unwrap_err();
        assert_eq!(err, WorldError::RoomExists("garden".into()));
        assert_eq!(world.get_room("Garden").unwrap().description, "A garden.");
    }

    #[test]
    fn remove_room_clears_start_and_placements() {
        let mut world = setup_world();
        world.enter(presence("Aria", 1), "Garden").unwrap();
        assert!(world.remove_room("garden").is_some());
        assert!(world.starting_room().is_none());
        assert!(world.character_room("Aria").is_none());
        assert!(world.remove_room("garden").is_none());
    }

    #[test]
    fn enter_places_character() {
        let mut world = setup_world();
        world.enter(presence("Aria", 1), "garden").unwrap();
        assert_eq!(world.character_room("aria"), Some("garden"));
        assert!(world.get_room("Garden").unwrap().has_character("Aria"));
    }

    #[test]
    fn enter_twice_keeps_single_membership() {
        let mut world = setup_world();
        world.enter(presence("Aria", 1), "Garden").unwrap();
        world.enter(presence("Aria", 1), "Hallway").unwrap();
        assert!(!world.get_room("Garden").unwrap().has_character("Aria"));
        assert!(world.get_room("Hallway").unwrap().has_character("Aria"));
    }

    #[test]
    fn enter_unknown_room_fails() {
        let mut world = setup_world();
        assert_eq!(
            world.enter(presence("Aria", 1), "Nowhere"),
            Err(MoveError::RoomNotFound("Nowhere".into()))
        );
        assert!(world.character_room("Aria").is_none());
    }

    #[test]
    fn traverse_moves_between_rooms() {
        let mut world = setup_world();
        world.enter(presence("Aria", 1), "Garden").unwrap();

        let outcome = world.traverse("Aria", "GATE").unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: "garden".into(),
                to: "hallway".into()
            }
        );
        let in_rooms = world
            .rooms()
            .filter(|r| r.has_character("Aria"))
            .count();
        assert_eq!(in_rooms, 1);
        assert!(world.get_room("Hallway").unwrap().has_character("Aria"));
        assert_eq!(world.character_room("Aria"), Some("hallway"));
    }

    #[test]
    fn traverse_loop_leaves_membership() {
        let mut world = setup_world();
        world.enter(presence("Aria", 1), "Garden").unwrap();
        let outcome = world.traverse("Aria", "loop").unwrap();
        assert_eq!(outcome, MoveOutcome::Stayed { room: "garden".into() });
        assert!(world.get_room("Garden").unwrap().has_character("Aria"));
    }

    #[test]
    fn traverse_errors_do_not_mutate() {
        let mut world = setup_world();
        world.enter(presence("Aria", 1), "Garden").unwrap();

        assert_eq!(world.traverse("Aria", "window"), Err(MoveError::ExitNotFound));
        assert_eq!(world.traverse("Aria", "crack"), Err(MoveError::ExitBroken));
        assert_eq!(world.traverse("Aria", "stale"), Err(MoveError::ExitBroken));
        assert_eq!(world.character_room("Aria"), Some("garden"));
        assert!(matches!(
            world.traverse("Nobody", "gate"),
            Err(MoveError::CharacterNotInRoom(_))
        ));
    }

    #[test]
    fn remove_character_reports_room() {
        let mut world = setup_world();
        world.enter(presence("Aria", 1), "Hallway").unwrap();
        let (room, removed) = world.remove_character("ARIA").unwrap();
        assert_eq!(room, "hallway");
        assert_eq!(removed.session_id, SessionId(1));
        assert!(world.remove_character("Aria").is_none());
    }

    #[test]
    fn move_item_actor_exit() {
        let mut world = setup_world();
        world.move_item("fountain", "Garden", "Hallway").unwrap();
        assert!(world.get_room("Hallway").unwrap().item("Fountain").is_some());
        assert!(world.get_room("Garden").unwrap().item("Fountain").is_none());

        world.move_actor("Snake", "garden", "hallway").unwrap();
        assert!(world.get_room("Hallway").unwrap().actor("snake").is_some());

        world.move_exit("Door", "Hallway", "Garden").unwrap();
        assert!(world.get_room("Garden").unwrap().exit("door").is_some());

        assert!(matches!(
            world.move_item("Fountain", "Garden", "Hallway"),
            Err(MoveError::NotPresent { .. })
        ));
        assert!(matches!(
            world.move_actor("Snake", "Hallway", "Nowhere"),
            Err(MoveError::RoomNotFound(_))
        ));
        // A failed move leaves the entity where it was.
        assert!(world.get_room("Hallway").unwrap().actor("snake").is_some());
    }

    #[test]
    fn serde_roundtrip_drops_characters() {
        let mut world = setup_world();
        world.enter(presence("Aria", 1), "Garden").unwrap();
        let bytes = bincode::serialize(&world).unwrap();
        let restored: World = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.room_count(), 2);
        assert_eq!(restored.starting_room().unwrap().name, "Garden");
        assert!(restored.character_room("Aria").is_none());
        assert!(!restored.get_room("Garden").unwrap().has_character("Aria"));
    }
}
