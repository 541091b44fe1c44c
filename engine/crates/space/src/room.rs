use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use session::SessionId;

use crate::model::{Actor, CharacterPresence, Exit, Item, Visible};

pub const LOOK_FAILED: &str = "You don't see anything like that.";

/// A node of the world graph. Every membership map is keyed by the
/// lower-cased entry name.
///
/// Player characters are session state, not content: they are never
/// serialized with the room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub description: String,
    items: BTreeMap<String, Item>,
    actors: BTreeMap<String, Actor>,
    exits: BTreeMap<String, Exit>,
    #[serde(skip)]
    characters: BTreeMap<String, CharacterPresence>,
}

impl Room {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Graph key of this room.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.name.to_lowercase(), item);
    }

    pub fn add_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.name.to_lowercase(), actor);
    }

    pub fn add_exit(&mut self, exit: Exit) {
        self.exits.insert(exit.name.to_lowercase(), exit);
    }

    pub fn add_character(&mut self, character: CharacterPresence) {
        self.characters
            .insert(character.name.to_lowercase(), character);
    }

    pub fn remove_item(&mut self, name: &str) -> Option<Item> {
        self.items.remove(&name.to_lowercase())
    }

    pub fn remove_actor(&mut self, name: &str) -> Option<Actor> {
        self.actors.remove(&name.to_lowercase())
    }

    pub fn remove_exit(&mut self, name: &str) -> Option<Exit> {
        self.exits.remove(&name.to_lowercase())
    }

    pub fn remove_character(&mut self, name: &str) -> Option<CharacterPresence> {
        self.characters.remove(&name.to_lowercase())
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.get(&name.to_lowercase())
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.get(&name.to_lowercase())
    }

    pub fn exit(&self, name: &str) -> Option<&Exit> {
        self.exits.get(&name.to_lowercase())
    }

    pub fn character(&self, name: &str) -> Option<&CharacterPresence> {
        self.characters.get(&name.to_lowercase())
    }

    pub fn has_character(&self, name: &str) -> bool {
        self.characters.contains_key(&name.to_lowercase())
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn exits(&self) -> impl Iterator<Item = &Exit> {
        self.exits.values()
    }

    pub fn characters(&self) -> impl Iterator<Item = &CharacterPresence> {
        self.characters.values()
    }

    /// Sessions whose characters are currently here.
    pub fn occupant_sessions(&self) -> Vec<SessionId> {
        self.characters.values().map(|c| c.session_id).collect()
    }

    /// Full description as seen by `viewer`, who is left out of the list
    /// of other characters.
    pub fn describe(&self, viewer: &str) -> String {
        let mut out = self.description.clone();
        push_clause(&mut out, " It contains ", self.items.values());
        push_clause(&mut out, " Also here is ", self.actors.values());
        push_clause(
            &mut out,
            " You also see ",
            self.characters
                .values()
                .filter(|c| !c.name.eq_ignore_ascii_case(viewer)),
        );
        push_clause(&mut out, " Obvious exits are ", self.exits.values());
        out
    }

    /// Description of a named thing in the room, searched in the order
    /// items, characters, exits, actors.
    pub fn describe_object(&self, target: &str) -> Option<String> {
        let key = target.to_lowercase();
        if let Some(item) = self.items.get(&key) {
            return Some(item.description.clone());
        }
        if let Some(character) = self.characters.get(&key) {
            return Some(character.summary.clone());
        }
        if let Some(exit) = self.exits.get(&key) {
            return Some(exit.description.clone());
        }
        self.actors.get(&key).map(|a| a.description.clone())
    }
}

fn push_clause<'a, T, I>(out: &mut String, prefix: &str, entries: I)
where
    T: Visible + 'a,
    I: Iterator<Item = &'a T>,
{
    let names: Vec<&str> = entries
        .filter(|e| e.is_visible())
        .map(|e| e.name())
        .collect();
    if names.is_empty() {
        return;
    }
    out.push_str(prefix);
    out.push_str(&names.join(", "));
    out.push('.');
}
