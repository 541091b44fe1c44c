use std::collections::BTreeMap;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::rand_core::OsRng;
use password_hash::SaltString;
use rusqlite::Connection;

use crate::character::PlayerCharacter;
use crate::error::PlayerDbError;

/// A loaded account and its characters, keyed by lower-cased name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    characters: BTreeMap<String, PlayerCharacter>,
}

impl Account {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            characters: BTreeMap::new(),
        }
    }

    pub fn add_character(&mut self, character: PlayerCharacter) {
        self.characters
            .insert(character.name().to_lowercase(), character);
    }

    pub fn character(&self, name: &str) -> Option<&PlayerCharacter> {
        self.characters.get(&name.to_lowercase())
    }

    pub fn character_mut(&mut self, name: &str) -> Option<&mut PlayerCharacter> {
        self.characters.get_mut(&name.to_lowercase())
    }

    pub fn remove_character(&mut self, name: &str) -> Option<PlayerCharacter> {
        self.characters.remove(&name.to_lowercase())
    }

    pub fn characters(&self) -> impl Iterator<Item = &PlayerCharacter> {
        self.characters.values()
    }

    pub fn has_characters(&self) -> bool {
        !self.characters.is_empty()
    }
}

/// Stored account row.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: i64,
    pub username: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

/// Repository for account operations.
pub struct AccountRepo<'a> {
    conn: &'a Connection,
}

impl<'a> AccountRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new account with the given username and password.
    pub fn create(&self, username: &str, password: &str) -> Result<AccountRecord, PlayerDbError> {
        if self.get_by_username(username)?.is_some() {
            return Err(PlayerDbError::AccountExists(username.to_string()));
        }

        let password_hash = hash_password(password)?;

        self.conn.execute(
            "INSERT INTO accounts (username, password_hash) VALUES (?1, ?2)",
            rusqlite::params![username, password_hash],
        )?;

        Ok(AccountRecord {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            created_at: String::new(), // Filled by DB default
            last_login: None,
        })
    }

    /// Authenticate with username and password. Returns the account on success.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountRecord, PlayerDbError> {
        let result = self.conn.query_row(
            "SELECT id, username, password_hash, created_at, last_login FROM accounts WHERE username = ?1",
            rusqlite::params![username],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        );

        let (id, username, password_hash, created_at, last_login) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(PlayerDbError::AccountNotFound(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        verify_password(password, &password_hash)?;

        self.conn.execute(
            "UPDATE accounts SET last_login = datetime('now') WHERE id = ?1",
            rusqlite::params![id],
        )?;

        Ok(AccountRecord {
            id,
            username,
            created_at,
            last_login,
        })
    }

    /// Get an account by username (case-insensitive).
    pub fn get_by_username(&self, username: &str) -> Result<Option<AccountRecord>, PlayerDbError> {
        let result = self.conn.query_row(
            "SELECT id, username, created_at, last_login FROM accounts WHERE username = ?1",
            rusqlite::params![username],
            |row| {
                Ok(AccountRecord {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                    last_login: row.get(3)?,
                })
            },
        );

        match result {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn hash_password(password: &str) -> Result<String, PlayerDbError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PlayerDbError::HashError(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<(), PlayerDbError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PlayerDbError::HashError(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PlayerDbError::InvalidPassword)
}
