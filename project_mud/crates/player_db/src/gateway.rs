use std::sync::Mutex;

use crate::account::Account;
use crate::db::PlayerDb;
use crate::error::PlayerDbError;

/// Narrow, synchronous account storage interface used by session workers.
/// Passwords are passed in clear; hashing belongs to the implementation.
pub trait AccountGateway: Send + Sync {
    fn load(&self, name: &str) -> Result<Account, PlayerDbError>;
    fn create(&self, name: &str, password: &str) -> Result<Account, PlayerDbError>;
    fn save(&self, account: &Account) -> Result<(), PlayerDbError>;
    fn log_in(&self, name: &str, password: &str) -> Result<Account, PlayerDbError>;
    /// Whether any account already has a character with this name.
    fn character_name_taken(&self, name: &str) -> Result<bool, PlayerDbError>;
}

/// `AccountGateway` over a SQLite `PlayerDb`. The connection is not
/// shareable between threads, so every call takes the mutex.
pub struct SqliteGateway {
    db: Mutex<PlayerDb>,
}

impl SqliteGateway {
    pub fn new(db: PlayerDb) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open(path: &str) -> Result<Self, PlayerDbError> {
        Ok(Self::new(PlayerDb::open(path)?))
    }

    pub fn open_memory() -> Result<Self, PlayerDbError> {
        Ok(Self::new(PlayerDb::open_memory()?))
    }

    fn with_db<T>(
        &self,
        f: impl FnOnce(&PlayerDb) -> Result<T, PlayerDbError>,
    ) -> Result<T, PlayerDbError> {
        let db = self.db.lock().map_err(|_| PlayerDbError::LockPoisoned)?;
        f(&db)
    }
}

impl AccountGateway for SqliteGateway {
    fn load(&self, name: &str) -> Result<Account, PlayerDbError> {
        self.with_db(|db| db.load_account(name))
    }

    fn create(&self, name: &str, password: &str) -> Result<Account, PlayerDbError> {
        self.with_db(|db| {
            let record = db.account().create(name, password)?;
            tracing::info!(account = %record.username, "Account created");
            Ok(Account::new(record.id, record.username))
        })
    }

    fn save(&self, account: &Account) -> Result<(), PlayerDbError> {
        self.with_db(|db| db.save_account(account))
    }

    fn log_in(&self, name: &str, password: &str) -> Result<Account, PlayerDbError> {
        self.with_db(|db| db.authenticate_account(name, password))
    }

    fn character_name_taken(&self, name: &str) -> Result<bool, PlayerDbError> {
        self.with_db(|db| db.character().name_taken(name))
    }
}
