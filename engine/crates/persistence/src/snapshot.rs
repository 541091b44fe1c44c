use serde::{Deserialize, Serialize};
use space::World;

use crate::error::PersistenceError;

pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk envelope of a saved world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub world: World,
}

impl WorldSnapshot {
    pub fn capture(world: &World) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            world: world.clone(),
        }
    }

    /// Unwrap the world, rejecting files written by another format version.
    pub fn restore(self) -> Result<World, PersistenceError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                got: self.version,
            });
        }
        Ok(self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_rejects_other_version() {
        let mut snap = WorldSnapshot::capture(&World::new("Old"));
        snap.version = SNAPSHOT_VERSION + 1;
        assert!(matches!(
            snap.restore(),
            Err(PersistenceError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn capture_then_restore() {
        let world = World::new("Fresh");
        let restored = WorldSnapshot::capture(&world).restore().unwrap();
        assert_eq!(restored.name, "Fresh");
    }
}
