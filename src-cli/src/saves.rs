//! Save file management.
//!
//! Each save is one JSON file in the save directory, named after its id,
//! holding a small metadata header and the world snapshot.

use crate::state::CliError;
use hexfront_core::{Simulation, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Metadata shown when listing saves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub id: String,
    pub name: String,
    pub saved_at: String,
    pub day: u32,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
}

/// Full save file contents.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveData {
    pub metadata: SavedGame,
    pub snapshot: WorldSnapshot,
}

/// Path of the save file for `save_id`.
pub fn save_path(dir: &Path, save_id: &str) -> PathBuf {
    dir.join(format!("{}.json", save_id))
}

/// Write the simulation's current state as a new save.
pub fn write_save(dir: &Path, name: &str, sim: &Simulation) -> Result<SavedGame, CliError> {
    fs::create_dir_all(dir)?;

    let snapshot = sim.snapshot();
    let metadata = SavedGame {
        id: format!("save-{}", uuid::Uuid::new_v4()),
        name: name.to_string(),
        saved_at: chrono::Utc::now().to_rfc3339(),
        day: snapshot.day,
        width: snapshot.settings.width,
        height: snapshot.settings.height,
        seed: snapshot.settings.seed,
    };
    let data = SaveData {
        metadata: metadata.clone(),
        snapshot,
    };

    let path = save_path(dir, &metadata.id);
    fs::write(&path, serde_json::to_string_pretty(&data)?)?;
    info!(id = %metadata.id, name, day = metadata.day, path = %path.display(), "game saved");
    Ok(metadata)
}

/// Read a save file.
pub fn read_save(path: &Path) -> Result<SaveData, CliError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load the save with `save_id` from `dir`.
pub fn load_save(dir: &Path, save_id: &str) -> Result<SaveData, CliError> {
    let path = save_path(dir, save_id);
    if !path.exists() {
        return Err(CliError::SaveNotFound(save_id.to_string()));
    }
    read_save(&path)
}

/// All readable saves in `dir`, newest first. Unreadable files are skipped.
pub fn list_saves(dir: &Path) -> Vec<SavedGame> {
    let mut saves = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                match read_save(&path) {
                    Ok(data) => saves.push(data.metadata),
                    Err(err) => debug!(path = %path.display(), error = %err, "skipping unreadable save"),
                }
            }
        }
    }

    saves.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
    saves
}

/// Remove the save with `save_id`.
pub fn delete_save(dir: &Path, save_id: &str) -> Result<(), CliError> {
    let path = save_path(dir, save_id);
    if !path.exists() {
        return Err(CliError::SaveNotFound(save_id.to_string()));
    }
    fs::remove_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfront_core::WorldSettings;

    fn simulation() -> Simulation {
        Simulation::new(WorldSettings::dry(8, 8, 4)).unwrap()
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = simulation();
        sim.run_days(3);

        let saved = write_save(dir.path(), "first", &sim).unwrap();
        assert!(saved.id.starts_with("save-"));
        assert_eq!(saved.day, 3);

        let data = load_save(dir.path(), &saved.id).unwrap();
        assert_eq!(data.metadata, saved);
        assert_eq!(data.snapshot, sim.snapshot());
    }

    #[test]
    fn test_list_newest_first_and_skip_junk() {
        let dir = tempfile::tempdir().unwrap();
        let sim = simulation();
        let first = write_save(dir.path(), "first", &sim).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = write_save(dir.path(), "second", &sim).unwrap();
        fs::write(dir.path().join("junk.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let ids: Vec<String> = list_saves(dir.path()).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_missing_save() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_save(dir.path(), "save-nope"),
            Err(CliError::SaveNotFound(_))
        ));
        assert!(matches!(
            delete_save(dir.path(), "save-nope"),
            Err(CliError::SaveNotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let saved = write_save(dir.path(), "gone", &simulation()).unwrap();
        delete_save(dir.path(), &saved.id).unwrap();
        assert!(list_saves(dir.path()).is_empty());
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_saves(&dir.path().join("nothing-here")).is_empty());
    }
}
