use rusqlite::Connection;

use crate::account::{Account, AccountRepo};
use crate::character::CharacterRepo;
use crate::error::PlayerDbError;
use crate::schema;

/// Main database handle wrapping a SQLite connection.
pub struct PlayerDb {
    conn: Connection,
}

impl PlayerDb {
    /// Open (or create) a database at the given file path.
    pub fn open(path: &str) -> Result<Self, PlayerDbError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PlayerDbError::Database(rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(1),
                        Some(format!("failed to create dir: {}", e)),
                    ))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self, PlayerDbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Get account repository.
    pub fn account(&self) -> AccountRepo<'_> {
        AccountRepo::new(&self.conn)
    }

    /// Get character repository.
    pub fn character(&self) -> CharacterRepo<'_> {
        CharacterRepo::new(&self.conn)
    }

    /// Load an account with all of its characters.
    pub fn load_account(&self, name: &str) -> Result<Account, PlayerDbError> {
        let record = self
            .account()
            .get_by_username(name)?
            .ok_or_else(|| PlayerDbError::AccountNotFound(name.to_string()))?;
        self.hydrate(record.id, record.username)
    }

    /// Verify credentials and load the account.
    pub fn authenticate_account(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Account, PlayerDbError> {
        let record = self.account().authenticate(name, password)?;
        self.hydrate(record.id, record.username)
    }

    /// Write every character of the account in one transaction.
    pub fn save_account(&self, account: &Account) -> Result<(), PlayerDbError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let repo = CharacterRepo::new(&tx);
            for character in account.characters() {
                repo.upsert(account.id, character)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn hydrate(&self, id: i64, username: String) -> Result<Account, PlayerDbError> {
        let mut account = Account::new(id, username);
        for character in self.character().list_for_account(id)? {
            account.add_character(character);
        }
        Ok(account)
    }
}
