pub mod error;
pub mod manager;
pub mod snapshot;

pub use error::PersistenceError;
pub use manager::{world_file_name, WorldStore, WORLD_EXTENSION};
pub use snapshot::{WorldSnapshot, SNAPSHOT_VERSION};
