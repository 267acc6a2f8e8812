//! Best-effort on-device cache of the group table.

use crate::GroupTable;
use crate::normalize::normalize_groups;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

/// Key holding the serialized table.
pub const GROUPS_KEY: &str = "groups";

pub trait LocalStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$XDG_CONFIG_HOME/groupstage`, else `~/.config/groupstage`.
    pub fn default_dir() -> Option<PathBuf> {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
            && !xdg.trim().is_empty()
        {
            return Some(PathBuf::from(xdg).join("groupstage"));
        }
        std::env::var("HOME")
            .ok()
            .filter(|home| !home.trim().is_empty())
            .map(|home| PathBuf::from(home).join(".config").join("groupstage"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes to a temporary file first so a crash never leaves half a table.
    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Reads the cached table, falling back to the seed table when the cache is
/// missing, unreadable or not JSON.
pub fn load_groups(storage: &dyn LocalStorage) -> GroupTable {
    let raw = match storage.get(GROUPS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no cached table; starting from defaults");
            return GroupTable::with_defaults();
        }
        Err(e) => {
            warn!("could not read cached table: {e}");
            return GroupTable::with_defaults();
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) if value.is_object() || value.is_array() => normalize_groups(&value),
        Ok(_) => {
            warn!("cached table has an unexpected shape; starting from defaults");
            GroupTable::with_defaults()
        }
        Err(e) => {
            warn!("cached table is not valid JSON ({e}); starting from defaults");
            GroupTable::with_defaults()
        }
    }
}

pub fn save_groups(storage: &mut dyn LocalStorage, table: &GroupTable) -> io::Result<()> {
    let body = serde_json::to_string(table).map_err(io::Error::other)?;
    storage.set(GROUPS_KEY, &body)
}

pub fn clear_groups(storage: &mut dyn LocalStorage) -> io::Result<()> {
    storage.remove(GROUPS_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Group, TeamId};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("groupstage-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_or_broken_cache_gives_the_seed_table() {
        let mut storage = MemoryStorage::new();
        assert_eq!(load_groups(&storage), GroupTable::with_defaults());

        storage.set(GROUPS_KEY, "{not json").unwrap();
        assert_eq!(load_groups(&storage), GroupTable::with_defaults());

        storage.set(GROUPS_KEY, "17").unwrap();
        assert_eq!(load_groups(&storage), GroupTable::with_defaults());
    }

    #[test]
    fn cached_sparse_tables_are_normalized() {
        let mut storage = MemoryStorage::new();
        storage
            .set(GROUPS_KEY, r#"{"A":{"0":{"name":"Lions"},"2":{"name":"Tigers"}}}"#)
            .unwrap();
        let table = load_groups(&storage);
        assert_eq!(table.teams(Group::A).len(), 2);
        assert!(table.teams(Group::D).is_empty());
    }

    #[test]
    fn file_storage_round_trips_and_clears() {
        let dir = scratch_dir("files");
        let mut storage = FileStorage::new(&dir);
        let mut table = GroupTable::with_defaults();
        table.add_team(Group::B, TeamId::from("owls"), "Owls").unwrap();

        save_groups(&mut storage, &table).unwrap();
        assert_eq!(load_groups(&storage), table);

        clear_groups(&mut storage).unwrap();
        clear_groups(&mut storage).unwrap();
        assert_eq!(storage.get(GROUPS_KEY).unwrap(), None);
        let _ = fs::remove_dir_all(&dir);
    }
}
