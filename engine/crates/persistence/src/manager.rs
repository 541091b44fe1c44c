use std::path::{Path, PathBuf};

use space::World;

use crate::error::PersistenceError;
use crate::snapshot::WorldSnapshot;

pub const WORLD_EXTENSION: &str = "world";

/// File name for a world: spaces become underscores.
pub fn world_file_name(world_name: &str) -> String {
    format!("{}.{}", world_name.replace(' ', "_"), WORLD_EXTENSION)
}

/// Saves and loads worlds under one directory.
pub struct WorldStore {
    dir: PathBuf,
}

impl WorldStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, world_name: &str) -> PathBuf {
        self.dir.join(world_file_name(world_name))
    }

    /// Save a world to `<dir>/<name>.world`.
    pub fn save(&self, world: &World) -> Result<PathBuf, PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path_for(&world.name);
        let bytes = bincode::serialize(&WorldSnapshot::capture(world))?;

        // Write to temp file first, then rename for atomicity
        let tmp_path = path.with_extension(format!("{}.tmp", WORLD_EXTENSION));
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &path)?;

        tracing::info!(
            world = %world.name,
            rooms = world.room_count(),
            bytes = bytes.len(),
            path = %path.display(),
            "World saved"
        );

        Ok(path)
    }

    /// Load a world by file name. A bare name is looked up in the store's
    /// directory and gets the `.world` extension if it has none.
    pub fn load(&self, file: &str) -> Result<World, PersistenceError> {
        let mut path = PathBuf::from(file);
        if path.extension().is_none() {
            path = PathBuf::from(world_file_name(file));
        }
        if path.is_relative() && !path.exists() {
            path = self.dir.join(path);
        }
        if !path.exists() {
            return Err(PersistenceError::NotFound(path.display().to_string()));
        }
        self.load_from_path(&path)
    }

    pub fn load_from_path(&self, path: &Path) -> Result<World, PersistenceError> {
        let bytes = std::fs::read(path)?;
        let snapshot: WorldSnapshot = bincode::deserialize(&bytes)?;
        let world = snapshot.restore()?;
        tracing::info!(
            world = %world.name,
            rooms = world.room_count(),
            path = %path.display(),
            "World loaded"
        );
        Ok(world)
    }

    /// File names of every saved world, sorted.
    pub fn list(&self) -> Result<Vec<String>, PersistenceError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext == WORLD_EXTENSION)
                    .unwrap_or(false)
            })
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, world_name: &str) -> bool {
        self.path_for(world_name).exists()
    }
}
