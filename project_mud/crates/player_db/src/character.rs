use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use space::Actor;

use crate::error::PlayerDbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Case-insensitive `male` / `female`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("male") {
            Some(Self::Male)
        } else if s.eq_ignore_ascii_case("female") {
            Some(Self::Female)
        } else {
            None
        }
    }

    pub fn pronoun(self) -> &'static str {
        match self {
            Self::Male => "He",
            Self::Female => "She",
        }
    }
}

/// A player's persistent character. The shared actor capabilities
/// (name, description, visibility, conversation, inventory) live in the
/// embedded `Actor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub actor: Actor,
    pub race: String,
    pub sex: Sex,
    pub profession: String,
    pub level: u32,
    /// Room name the character was last in; used on the next `play`.
    pub last_room: Option<String>,
}

impl PlayerCharacter {
    pub fn new(
        name: impl Into<String>,
        race: impl Into<String>,
        sex: Sex,
        profession: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            actor: Actor::new(name, description),
            race: race.into(),
            sex,
            profession: profession.into(),
            level: 1,
            last_room: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.actor.name
    }

    /// How other players see this character.
    pub fn describe(&self) -> String {
        format!(
            "{} is a level {} {} {}. {} looks {}.",
            self.actor.name,
            self.level,
            self.race,
            self.profession,
            self.sex.pronoun(),
            self.actor.description
        )
    }

    /// How the character sees itself.
    pub fn describe_self(&self) -> String {
        format!(
            "You are a level {} {} {}. You look {}.",
            self.level,
            self.race,
            self.profession,
            second_person(&self.actor.description)
        )
    }
}

/// Rewrite third-person pronouns to second person, word by word.
fn second_person(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let end = word
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(word.len());
            let (head, tail) = word.split_at(end);
            let swapped = match head {
                "he" | "she" => "you",
                "He" | "She" => "You",
                "him" | "her" => "your",
                "Him" | "Her" => "Your",
                "his" | "hers" => "yours",
                "His" | "Hers" => "Yours",
                other => other,
            };
            format!("{swapped}{tail}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Repository for character rows. Each row stores the whole character as
/// JSON next to its indexed name.
pub struct CharacterRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CharacterRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or update a character owned by `account_id`. A name owned by
    /// another account is rejected.
    pub fn upsert(
        &self,
        account_id: i64,
        character: &PlayerCharacter,
    ) -> Result<(), PlayerDbError> {
        let data = serde_json::to_string(character)?;
        let name = character.name();

        match self.owner_of(name)? {
            Some(owner) if owner != account_id => {
                Err(PlayerDbError::CharacterNameTaken(name.to_string()))
            }
            Some(_) => {
                self.conn.execute(
                    "UPDATE characters SET data = ?1, last_saved = datetime('now') WHERE name = ?2",
                    rusqlite::params![data, name],
                )?;
                Ok(())
            }
            None => {
                self.conn.execute(
                    "INSERT INTO characters (account_id, name, data) VALUES (?1, ?2, ?3)",
                    rusqlite::params![account_id, name, data],
                )?;
                Ok(())
            }
        }
    }

    /// All characters of an account, ordered by name.
    pub fn list_for_account(&self, account_id: i64) -> Result<Vec<PlayerCharacter>, PlayerDbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM characters WHERE account_id = ?1 ORDER BY name")?;

        let rows = stmt
            .query_map(rusqlite::params![account_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(PlayerDbError::from))
            .collect()
    }

    /// Whether any account owns a character with this name (case-insensitive).
    pub fn name_taken(&self, name: &str) -> Result<bool, PlayerDbError> {
        Ok(self.owner_of(name)?.is_some())
    }

    fn owner_of(&self, name: &str) -> Result<Option<i64>, PlayerDbError> {
        let result = self.conn.query_row(
            "SELECT account_id FROM characters WHERE name = ?1",
            rusqlite::params![name],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
