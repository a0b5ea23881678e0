//! The per-profile key/value store, which persists opaque text values.
//!
//! `ProfileData::put` and `ProfileData::get` are the `ProfileDataPut` and `ProfileDataGet` calls.
//! A `get` of a key that was never written returns `Ok(None)`, which is the `ok: false` response.
use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::{fs, sync::Mutex};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProfileId(pub i64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A logged-in user profile
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub username: String,
}

impl Profile {
    pub fn new<T: Into<String>>(id: i64, username: T) -> Self {
        Self {
            id: ProfileId(id),
            username: username.into(),
        }
    }
}

#[async_trait]
pub trait ProfileData: Send + Sync + 'static {
    async fn put(&self, profile: ProfileId, key: &str, value: String) -> anyhow::Result<()>;

    async fn get(&self, profile: ProfileId, key: &str) -> anyhow::Result<Option<String>>;
}

/// Profile data held in memory.  Clones share the same values.
#[derive(Clone, Default)]
pub struct MemoryProfileData {
    values: Arc<Mutex<HashMap<(ProfileId, String), String>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryProfileData {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of `put` calls since creation
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileData for MemoryProfileData {
    async fn put(&self, profile: ProfileId, key: &str, value: String) -> anyhow::Result<()> {
        let mut values = self.values.lock().await;
        values.insert((profile, key.to_string()), value);
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    async fn get(&self, profile: ProfileId, key: &str) -> anyhow::Result<Option<String>> {
        let values = self.values.lock().await;
        Ok(values.get(&(profile, key.to_string())).cloned())
    }
}

/// Profile data stored on disk, as one yaml map per profile.
pub struct FileProfileData {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileProfileData {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            lock: Mutex::new(()),
        }
    }

    pub fn profile_path(&self, profile: ProfileId) -> PathBuf {
        let mut path = self.dir.clone();
        path.push(format!("{}.yml", profile.0));
        path
    }

    async fn read_values(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
        if !path.is_file() {
            debug!("profile data {:?} does not exist", path);
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;

        let values = serde_yaml::from_str(contents.as_str())
            .with_context(|| format!("parse {}", path.display()))?;

        Ok(values)
    }
}

#[async_trait]
impl ProfileData for FileProfileData {
    async fn put(&self, profile: ProfileId, key: &str, value: String) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;

        let path = self.profile_path(profile);
        let mut values = Self::read_values(path.as_path()).await?;
        values.insert(key.to_string(), value);

        fs::create_dir_all(self.dir.as_path()).await?;

        // write to a sibling file, then rename, so a crash never leaves a truncated map
        let temp = path.with_extension("yml.tmp");
        let contents = serde_yaml::to_string(&values)?;
        fs::write(temp.as_path(), contents).await?;
        fs::rename(temp.as_path(), path.as_path()).await?;

        debug!("wrote profile data {} to {}", key, path.display());
        Ok(())
    }

    async fn get(&self, profile: ProfileId, key: &str) -> anyhow::Result<Option<String>> {
        let _guard = self.lock.lock().await;

        let path = self.profile_path(profile);
        let mut values = Self::read_values(path.as_path()).await?;

        Ok(values.remove(key))
    }
}
