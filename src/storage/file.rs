use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{anyhow, Context};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

/// Binary version, written into every store file header
const STORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bytes reserved at the start of the file for metadata
const HEADER_SIZE: usize = 1024;

/// Metadata of the store file. Contains the version of the binary that last wrote the file so that
/// later versions can upgrade older files.
#[derive(Serialize, Deserialize, Debug)]
struct Metadata {
    version: String,
}

/// Key-value store persisted to a single file. The whole map is rewritten on every mutation.
pub(crate) struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,

    /// Modification time of the file when we last loaded or saved it
    last_modified: Option<SystemTime>,
}

impl FileStore {
    /// Open the store at `path`. A missing file gives an empty store; the file is created on first write.
    pub(crate) fn open(path: &Path) -> anyhow::Result<FileStore> {
        let mut store = FileStore {
            path: path.to_path_buf(),
            entries: BTreeMap::new(),
            last_modified: None,
        };
        if path.exists() {
            store.reload()?;
        } else {
            info!("Store file {} does not exist yet, starting empty", path.display());
        }
        Ok(store)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file again, replacing everything held in memory
    pub(crate) fn reload(&mut self) -> anyhow::Result<()> {
        let mut file = fs::File::open(&self.path)
            .with_context(|| format!("Unable to open store file {}", self.path.display()))?;
        let metadata_len = file.read_u16::<LittleEndian>()?;
        if metadata_len as usize > HEADER_SIZE - 2 {
            return Err(anyhow!("Store file {} has a corrupt header", self.path.display()));
        }
        let mut buffer = vec![0; metadata_len as usize];
        file.read_exact(&mut buffer)?;
        let metadata: Metadata = bincode::deserialize(&buffer)?;
        info!("Store file written by version {}", metadata.version);

        file.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        let mut buffer: Vec<u8> = vec![];
        file.read_to_end(&mut buffer)?;

        self.entries = bincode::deserialize(&buffer)?;
        self.last_modified = modified_time(&self.path);
        Ok(())
    }

    /// Save store content to disk
    fn save(&mut self) -> anyhow::Result<()> {
        // Create metadata using current binary version
        let metadata = Metadata { version: STORE_VERSION.to_string() };
        let metadata_encoded: Vec<u8> = bincode::serialize(&metadata)?;
        let metadata_length = metadata_encoded.len();
        if metadata_length > HEADER_SIZE - 2 {
            return Err(anyhow!("Metadata of {metadata_length} bytes does not fit in the header"));
        }

        let encoded: Vec<u8> = bincode::serialize(&self.entries)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write next to the real file and swap it in, so a failed write leaves the old content intact
        let tmp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        // First 2 bytes hold metadata length
        file.write_u16::<LittleEndian>(metadata_length as u16)?;
        file.write_all(&metadata_encoded)?;
        // Zero fill the rest of the header
        file.write_all(&vec![0; HEADER_SIZE - 2 - metadata_length])?;
        file.write_all(&encoded)?;
        file.flush()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Unable to write store file {}", self.path.display()))?;
        self.last_modified = modified_time(&self.path);
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn sync(&mut self) -> anyhow::Result<bool> {
        let current = modified_time(&self.path);
        if current.is_none() || current == self.last_modified {
            return Ok(false);
        }

        warn!("Store file {} was changed by another process, reloading", self.path.display());
        self.reload()?;
        Ok(true)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::touch_later;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("store.db")).unwrap();
        assert!(store.keys().is_empty());
        assert!(!dir.path().join("store.db").exists());
    }

    #[test]
    fn test_persist_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");

        let mut store = FileStore::open(&path).unwrap();
        store.set_item("a", "[1,2]").unwrap();
        store.set_item("b", "{}").unwrap();
        store.remove_item("b").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("a"), Some("[1,2]".to_string()));
        assert_eq!(reopened.get_item("b"), None);
        assert_eq!(reopened.path(), path.as_path());

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.len() > HEADER_SIZE);
    }

    #[test]
    fn test_reload_picks_up_other_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let mut first = FileStore::open(&path).unwrap();
        first.set_item("k", "old").unwrap();

        let mut second = FileStore::open(&path).unwrap();
        second.set_item("k", "new").unwrap();

        first.reload().unwrap();
        assert_eq!(first.get_item("k"), Some("new".to_string()));
        assert!(!first.sync().unwrap());
    }

    #[test]
    fn test_sync_after_other_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let mut first = FileStore::open(&path).unwrap();
        first.set_item("k", "old").unwrap();
        assert!(!first.sync().unwrap());

        let mut second = FileStore::open(&path).unwrap();
        second.set_item("k", "new").unwrap();
        second.set_item("other", "1").unwrap();
        touch_later(&path);

        assert!(first.sync().unwrap());
        assert_eq!(first.get_item("k"), Some("new".to_string()));
        assert_eq!(first.keys(), vec!["k".to_string(), "other".to_string()]);
        assert!(!first.sync().unwrap());
    }

    #[test]
    fn test_corrupt_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        fs::write(&path, [0xff, 0xff, 1, 2, 3]).unwrap();
        assert!(FileStore::open(&path).is_err());
    }
}
