use crate::state::navigation::NavigationState;
use lifeline::impl_storage_clone;
use log::debug;
use std::{fmt, sync::Arc};
use tabnav_api::{
    profile::{ProfileData, ProfileId},
    snapshot::{Snapshot, TABS_KEY},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("no tabs snapshot saved for profile {0}")]
    NotFound(ProfileId),
    #[error("corrupt tabs snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("profile data unavailable: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Reads and writes the open tabs snapshot, in the profile data store.
#[derive(Clone)]
pub struct SnapshotStore {
    data: Arc<dyn ProfileData>,
}

impl_storage_clone!(SnapshotStore);

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStore").finish()
    }
}

impl SnapshotStore {
    pub fn new<D: ProfileData>(data: D) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    /// Saves the open tabs.  Returns false if no profile is active.
    pub async fn save(
        &self,
        profile: Option<ProfileId>,
        state: &NavigationState,
    ) -> anyhow::Result<bool> {
        let profile = match profile {
            Some(profile) => profile,
            None => {
                debug!("no active profile, skipping tabs save");
                return Ok(false);
            }
        };

        let snapshot = state.capture();
        let value = snapshot.encode()?;
        self.data.put(profile, TABS_KEY, value).await?;

        debug!(
            "saved {} tabs for profile {}",
            snapshot.items.len(),
            profile
        );
        Ok(true)
    }

    pub async fn load(&self, profile: ProfileId) -> Result<Snapshot, SnapshotError> {
        let value = self
            .data
            .get(profile, TABS_KEY)
            .await?
            .ok_or(SnapshotError::NotFound(profile))?;

        let snapshot = Snapshot::decode(value.as_str())?;
        Ok(snapshot)
    }
}
