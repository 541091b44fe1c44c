use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerDbError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("invalid password")]
    InvalidPassword,

    #[error("character name already taken: {0}")]
    CharacterNameTaken(String),

    #[error("character data error: {0}")]
    CharacterData(#[from] serde_json::Error),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("database lock poisoned")]
    LockPoisoned,
}
